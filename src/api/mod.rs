pub mod health;
pub mod metrics;
pub mod openapi;
pub mod outputs;
pub mod response;

use crate::config::Config;
use crate::helm::HelmClient;
use crate::k8s::{AddressHandle, K8sClient};
use crate::topology::GuestbookTopology;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub topology: Arc<GuestbookTopology>,
    pub k8s: Arc<RwLock<Option<K8sClient>>>,
    pub helm: Option<HelmClient>,
    /// Frontend address, settled once by the service watcher
    pub frontend_address: Arc<AddressHandle>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Config, topology: GuestbookTopology) -> Self {
        Self {
            config,
            topology: Arc::new(topology),
            k8s: Arc::new(RwLock::new(None)),
            helm: None,
            frontend_address: Arc::new(AddressHandle::new()),
            metrics: None,
        }
    }

    pub async fn set_k8s(&self, k8s: K8sClient) {
        let mut guard = self.k8s.write().await;
        *guard = Some(k8s);
    }

    pub fn with_helm(mut self, helm: HelmClient) -> Self {
        self.helm = Some(helm);
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
