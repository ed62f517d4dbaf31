//! Service address watcher
//!
//! Observes a Service until the orchestrator fills in the fields its address
//! policy needs, then settles the one-shot handle and stops. Convergence is
//! driven entirely by the cluster; nothing here retries an operation.

use futures::StreamExt;
use k8s_openapi::api::core::v1::Service;
use kube::{
    api::Api,
    runtime::{
        watcher::{self, Event as WatchEvent},
        WatchStreamExt,
    },
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::address::{AddressHandle, AddressPolicy, AddressState};

/// Watch `name` until `policy` resolves, then settle `handle`
///
/// Returns immediately for `AddressPolicy::Unset`.
pub async fn watch_address(
    services: Api<Service>,
    name: String,
    policy: AddressPolicy,
    handle: Arc<AddressHandle>,
) {
    if policy == AddressPolicy::Unset {
        return;
    }

    info!(service = %name, %policy, "Starting address watcher");

    let watcher_config = watcher::Config::default().fields(&format!("metadata.name={}", name));
    // Failed polls are retried with exponential backoff
    let mut stream = watcher::watcher(services, watcher_config)
        .default_backoff()
        .boxed();

    while let Some(event) = stream.next().await {
        let resolved = match event {
            Ok(event) => settle(&handle, &name, policy, event),
            Err(e) => {
                error!(service = %name, "Address watcher error: {}", e);
                false
            }
        };

        if resolved || handle.get().is_some() {
            info!(service = %name, address = %handle.current(), "Address resolved");
            return;
        }
    }

    warn!(service = %name, "Address watcher stream ended");
}

/// Offer the services carried by one watch event; true once resolved
fn settle(
    handle: &AddressHandle,
    name: &str,
    policy: AddressPolicy,
    event: WatchEvent<Service>,
) -> bool {
    match event {
        WatchEvent::Applied(service) => offer(handle, name, policy, &service),
        WatchEvent::Restarted(services) => services
            .iter()
            .any(|service| offer(handle, name, policy, service)),
        WatchEvent::Deleted(_) => {
            warn!(service = %name, "Service deleted before an address was assigned");
            false
        }
    }
}

fn offer(handle: &AddressHandle, name: &str, policy: AddressPolicy, service: &Service) -> bool {
    let state = policy.resolve(service);
    if state == AddressState::Pending {
        debug!(service = %name, "Address not yet available");
    }
    handle.offer(&state)
}
