//! Address resolution for exposed services
//!
//! A service's externally meaningful address is derived from its live state:
//! - `ClusterIp` reads `spec.clusterIP` as soon as the service is admitted
//! - `LoadBalancer` waits for the first `status.loadBalancer.ingress` record
//!
//! Both the frontend and the monitoring dashboard go through
//! [`resolve_load_balancer`], so the ingress tie-break rule lives in one place.

use std::fmt;

use k8s_openapi::api::core::v1::{Service, ServiceStatus};
use serde::Serialize;
use tokio::sync::{Notify, OnceCell};

/// Sentinel reported while an address has not been assigned yet
pub const ADDRESS_PENDING: &str = "pending";

/// How an address is derived for a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "camelCase")]
pub enum AddressPolicy {
    /// No external address was requested
    #[strum(serialize = "unset")]
    Unset,
    /// Local cluster: the cluster-internal virtual IP is the address
    #[strum(serialize = "clusterIP")]
    ClusterIp,
    /// Wait for load-balancer provisioning
    #[strum(serialize = "loadBalancer")]
    LoadBalancer,
}

/// Outcome of resolving an address against a live object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "address", rename_all = "camelCase")]
pub enum AddressState {
    Unset,
    Pending,
    Resolved(String),
}

impl AddressState {
    /// Render with a caller-chosen pending sentinel
    pub fn or_pending(&self, sentinel: &str) -> String {
        match self {
            AddressState::Unset => String::new(),
            AddressState::Pending => sentinel.to_string(),
            AddressState::Resolved(address) => address.clone(),
        }
    }
}

impl fmt::Display for AddressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.or_pending(ADDRESS_PENDING))
    }
}

impl AddressPolicy {
    /// Select the policy from the workload flags
    pub fn select(allocate_external_address: bool, is_local_cluster: bool) -> Self {
        match (allocate_external_address, is_local_cluster) {
            (false, _) => AddressPolicy::Unset,
            (true, true) => AddressPolicy::ClusterIp,
            (true, false) => AddressPolicy::LoadBalancer,
        }
    }

    /// Service type the policy requires, `None` leaves the orchestrator default
    pub fn service_type(&self) -> Option<&'static str> {
        match self {
            AddressPolicy::Unset => None,
            AddressPolicy::ClusterIp => Some("ClusterIP"),
            AddressPolicy::LoadBalancer => Some("LoadBalancer"),
        }
    }

    /// Resolve against the live service
    pub fn resolve(&self, service: &Service) -> AddressState {
        match self {
            AddressPolicy::Unset => AddressState::Unset,
            AddressPolicy::ClusterIp => resolve_cluster_ip(service),
            AddressPolicy::LoadBalancer => resolve_load_balancer(service.status.as_ref()),
        }
    }
}

/// Read the assigned cluster IP, headless services count as unassigned
pub fn resolve_cluster_ip(service: &Service) -> AddressState {
    match service
        .spec
        .as_ref()
        .and_then(|s| s.cluster_ip.as_deref())
        .filter(|ip| !ip.is_empty() && *ip != "None")
    {
        Some(ip) => AddressState::Resolved(ip.to_string()),
        None => AddressState::Pending,
    }
}

/// Resolve from load-balancer ingress
///
/// Takes the first ingress record, preferring its IP over its hostname. A
/// missing status, an empty ingress list, or a first record carrying neither
/// field all stay `Pending`.
pub fn resolve_load_balancer(status: Option<&ServiceStatus>) -> AddressState {
    let first = status
        .and_then(|s| s.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref())
        .and_then(|ingress| ingress.first());

    let host = first.and_then(|ingress| {
        ingress
            .ip
            .as_deref()
            .filter(|ip| !ip.is_empty())
            .or_else(|| ingress.hostname.as_deref().filter(|h| !h.is_empty()))
    });

    match host {
        Some(host) => AddressState::Resolved(format!("http://{}", host)),
        None => AddressState::Pending,
    }
}

/// One-shot address handle
///
/// Holds the first resolved address it is offered. Later offers are ignored,
/// so readers never observe the value change.
#[derive(Debug, Default)]
pub struct AddressHandle {
    cell: OnceCell<String>,
    notify: Notify,
}

impl AddressHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolution; returns true if this call set the address
    pub fn offer(&self, state: &AddressState) -> bool {
        let AddressState::Resolved(address) = state else {
            return false;
        };
        let set = self.cell.set(address.clone()).is_ok();
        if set {
            self.notify.notify_waiters();
        }
        set
    }

    pub fn get(&self) -> Option<&str> {
        self.cell.get().map(String::as_str)
    }

    /// Resolved address or the pending sentinel
    pub fn current(&self) -> String {
        self.get().unwrap_or(ADDRESS_PENDING).to_string()
    }

    /// Wait until an address has been set
    pub async fn resolved(&self) -> String {
        loop {
            let notified = self.notify.notified();
            if let Some(address) = self.get() {
                return address.to_string();
            }
            notified.await;
        }
    }
}
