//! Orchestrator seam
//!
//! Everything the topology needs from a control plane. `K8sClient` is the real
//! implementation; tests use an in-memory one.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service};

use crate::error::AppResult;

/// Declarative create-or-update of the resource kinds the guestbook uses
///
/// `apply_*` calls are idempotent upserts returning the object as admitted.
/// Deleting a resource that does not exist succeeds.
#[allow(async_fn_in_trait)]
pub trait Orchestrator {
    async fn apply_deployment(&self, deployment: &Deployment) -> AppResult<Deployment>;

    async fn apply_service(&self, service: &Service) -> AppResult<Service>;

    async fn apply_config_map(&self, config_map: &ConfigMap) -> AppResult<ConfigMap>;

    /// Live service, `None` if it has not been created
    async fn get_service(&self, name: &str) -> AppResult<Option<Service>>;

    async fn delete_deployment(&self, name: &str) -> AppResult<()>;

    async fn delete_service(&self, name: &str) -> AppResult<()>;

    async fn delete_config_map(&self, name: &str) -> AppResult<()>;
}
