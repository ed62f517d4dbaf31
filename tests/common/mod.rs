//! In-memory orchestrator shared by the integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use guestbook_topology::error::{AppError, AppResult};
use guestbook_topology::helm::{ChartInstaller, ChartRelease};
use guestbook_topology::k8s::Orchestrator;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    ConfigMap, LoadBalancerIngress, LoadBalancerStatus, Service, ServiceStatus,
};

/// Stores applied objects by name and admits services with a cluster IP
#[derive(Default)]
pub struct FakeCluster {
    pub deployments: Mutex<BTreeMap<String, Deployment>>,
    pub services: Mutex<BTreeMap<String, Service>>,
    pub config_maps: Mutex<BTreeMap<String, ConfigMap>>,
    pub apply_count: Mutex<usize>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate load-balancer provisioning completing for `name`
    pub fn provision(&self, name: &str, ingress: Vec<LoadBalancerIngress>) {
        let mut services = self.services.lock().unwrap();
        let service = services.entry(name.to_string()).or_insert_with(|| Service {
            metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        });
        service.status = Some(ServiceStatus {
            load_balancer: Some(LoadBalancerStatus {
                ingress: Some(ingress),
                ..Default::default()
            }),
            ..Default::default()
        });
    }

    pub fn deployment_names(&self) -> Vec<String> {
        self.deployments.lock().unwrap().keys().cloned().collect()
    }

    pub fn service_names(&self) -> Vec<String> {
        self.services.lock().unwrap().keys().cloned().collect()
    }

    fn bump(&self) {
        *self.apply_count.lock().unwrap() += 1;
    }
}

pub fn ip(addr: &str) -> LoadBalancerIngress {
    LoadBalancerIngress {
        ip: Some(addr.to_string()),
        ..Default::default()
    }
}

pub fn hostname(host: &str) -> LoadBalancerIngress {
    LoadBalancerIngress {
        hostname: Some(host.to_string()),
        ..Default::default()
    }
}

fn name_of(meta: &k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta) -> String {
    meta.name.clone().unwrap_or_default()
}

impl Orchestrator for FakeCluster {
    async fn apply_deployment(&self, deployment: &Deployment) -> AppResult<Deployment> {
        self.bump();
        self.deployments
            .lock()
            .unwrap()
            .insert(name_of(&deployment.metadata), deployment.clone());
        Ok(deployment.clone())
    }

    async fn apply_service(&self, service: &Service) -> AppResult<Service> {
        self.bump();
        let mut services = self.services.lock().unwrap();
        let name = name_of(&service.metadata);
        let existing = services.get(&name);

        // Re-applying keeps the assigned IP and any reported status
        let cluster_ip = existing
            .and_then(|s| s.spec.as_ref())
            .and_then(|s| s.cluster_ip.clone())
            .unwrap_or_else(|| format!("10.96.0.{}", services.len() + 1));
        let status = existing.and_then(|s| s.status.clone());

        let mut admitted = service.clone();
        if let Some(spec) = admitted.spec.as_mut() {
            spec.cluster_ip = Some(cluster_ip);
        }
        admitted.status = status;
        services.insert(name, admitted.clone());
        Ok(admitted)
    }

    async fn apply_config_map(&self, config_map: &ConfigMap) -> AppResult<ConfigMap> {
        self.bump();
        self.config_maps
            .lock()
            .unwrap()
            .insert(name_of(&config_map.metadata), config_map.clone());
        Ok(config_map.clone())
    }

    async fn get_service(&self, name: &str) -> AppResult<Option<Service>> {
        Ok(self.services.lock().unwrap().get(name).cloned())
    }

    async fn delete_deployment(&self, name: &str) -> AppResult<()> {
        self.deployments.lock().unwrap().remove(name);
        Ok(())
    }

    async fn delete_service(&self, name: &str) -> AppResult<()> {
        self.services.lock().unwrap().remove(name);
        Ok(())
    }

    async fn delete_config_map(&self, name: &str) -> AppResult<()> {
        self.config_maps.lock().unwrap().remove(name);
        Ok(())
    }
}

/// Records chart operations together with how many cluster applies preceded them
pub struct RecordingHelm<'a> {
    cluster: &'a FakeCluster,
    pub installs: Mutex<Vec<(String, usize)>>,
    pub uninstalls: Mutex<Vec<String>>,
    pub fail_install: bool,
}

impl<'a> RecordingHelm<'a> {
    pub fn new(cluster: &'a FakeCluster) -> Self {
        Self {
            cluster,
            installs: Mutex::new(Vec::new()),
            uninstalls: Mutex::new(Vec::new()),
            fail_install: false,
        }
    }

    pub fn failing(cluster: &'a FakeCluster) -> Self {
        Self {
            fail_install: true,
            ..Self::new(cluster)
        }
    }
}

impl ChartInstaller for RecordingHelm<'_> {
    async fn upgrade_install(&self, release: &ChartRelease) -> AppResult<String> {
        if self.fail_install {
            return Err(AppError::Helm("Error: chart not found".to_string()));
        }
        let applied = *self.cluster.apply_count.lock().unwrap();
        self.installs
            .lock()
            .unwrap()
            .push((release.release_name.clone(), applied));
        Ok(String::new())
    }

    async fn uninstall_release(&self, release_name: &str) -> AppResult<String> {
        // Resources must be gone before the charts are removed
        assert!(self.cluster.deployment_names().is_empty());
        self.uninstalls.lock().unwrap().push(release_name.to_string());
        Ok(String::new())
    }
}
