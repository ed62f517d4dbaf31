//! The guestbook topology
//!
//! A Redis leader/replica pair, the PHP frontend, a Prometheus exporter per
//! Redis tier, the Grafana dashboard ConfigMap and the monitoring charts.

pub mod monitoring;

use chrono::Utc;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use serde::Serialize;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::AppResult;
use crate::helm::{ChartInstaller, ChartRelease};
use crate::k8s::resources::{create_dashboard_config_map, create_redis_exporter, REDIS_PORT};
use crate::k8s::{AddressPolicy, AddressState, Orchestrator, ServiceDeployment, ADDRESS_PENDING};
use crate::models::{TopologyOutputs, WorkloadSpec};

pub const REDIS_LEADER: &str = "redis-leader";
pub const REDIS_REPLICA: &str = "redis-replica";
pub const FRONTEND: &str = "frontend";
pub const DASHBOARD_CONFIG_MAP: &str = "grafana-dashboard";

/// Exporter deployment and service for one Redis tier
#[derive(Debug, Clone)]
pub struct RedisExporter {
    pub name: String,
    pub deployment: Deployment,
    pub service: Service,
}

impl RedisExporter {
    fn new(target: &str, namespace: &str) -> Self {
        let name = format!("redis-exporter-{}", target.trim_start_matches("redis-"));
        let (deployment, service) = create_redis_exporter(&name, namespace, target);
        Self {
            name,
            deployment,
            service,
        }
    }
}

/// Every declared object of the guestbook, built once from configuration
#[derive(Debug, Clone)]
pub struct GuestbookTopology {
    namespace: String,
    is_minikube: bool,
    admin_user: String,
    admin_password: String,
    redis_leader: ServiceDeployment,
    redis_replica: ServiceDeployment,
    frontend: ServiceDeployment,
    exporters: Vec<RedisExporter>,
    dashboard: ConfigMap,
    charts: Vec<ChartRelease>,
}

impl GuestbookTopology {
    /// Build the topology; nothing is sent to the cluster
    pub fn build(config: &Config, dashboard_json: &str) -> AppResult<Self> {
        let namespace = config.namespace.as_str();

        let redis_leader = ServiceDeployment::new(
            &WorkloadSpec::new(REDIS_LEADER, "redis").with_ports([REDIS_PORT]),
            namespace,
        )?;
        let redis_replica = ServiceDeployment::new(
            &WorkloadSpec::new(REDIS_REPLICA, "pulumi/guestbook-redis-replica")
                .with_ports([REDIS_PORT]),
            namespace,
        )?;
        let frontend = ServiceDeployment::new(
            &WorkloadSpec::new(FRONTEND, "pulumi/guestbook-php-redis")
                .with_replicas(3)
                .with_ports([80])
                .expose(config.is_minikube),
            namespace,
        )?;

        let exporters = vec![
            RedisExporter::new(REDIS_LEADER, namespace),
            RedisExporter::new(REDIS_REPLICA, namespace),
        ];

        Ok(Self {
            namespace: namespace.to_string(),
            is_minikube: config.is_minikube,
            admin_user: config.grafana_admin_user.clone(),
            admin_password: config.grafana_admin_password.clone(),
            redis_leader,
            redis_replica,
            frontend,
            exporters,
            dashboard: create_dashboard_config_map(DASHBOARD_CONFIG_MAP, namespace, dashboard_json),
            charts: vec![
                monitoring::prometheus_release(),
                monitoring::grafana_release(config),
            ],
        })
    }

    pub fn frontend(&self) -> &ServiceDeployment {
        &self.frontend
    }

    pub fn composites(&self) -> [&ServiceDeployment; 3] {
        [&self.redis_leader, &self.redis_replica, &self.frontend]
    }

    pub fn exporters(&self) -> &[RedisExporter] {
        &self.exporters
    }

    /// All declared Kubernetes objects as a multi-document YAML stream
    pub fn render(&self) -> AppResult<String> {
        let mut documents = Vec::new();

        for composite in self.composites() {
            documents.push(to_document(composite.deployment())?);
            documents.push(to_document(composite.service())?);
        }
        for exporter in &self.exporters {
            documents.push(to_document(&exporter.deployment)?);
            documents.push(to_document(&exporter.service)?);
        }
        documents.push(to_document(&self.dashboard)?);

        Ok(documents.join("---\n"))
    }

    /// Apply every Kubernetes object, redis tiers first
    ///
    /// Returns the frontend address as resolved against the admitted service;
    /// on a local cluster this is already the cluster IP.
    #[instrument(skip_all, fields(namespace = %self.namespace))]
    pub async fn apply_resources<O: Orchestrator>(&self, orchestrator: &O) -> AppResult<AddressState> {
        self.redis_leader.apply(orchestrator).await?;
        self.redis_replica.apply(orchestrator).await?;

        for exporter in &self.exporters {
            orchestrator.apply_deployment(&exporter.deployment).await?;
            orchestrator.apply_service(&exporter.service).await?;
        }

        let frontend_service = self.frontend.apply(orchestrator).await?;
        orchestrator.apply_config_map(&self.dashboard).await?;

        let address = self.frontend.resolve_address(&frontend_service);
        info!(frontend = %address, "Applied guestbook resources");
        Ok(address)
    }

    /// Install or upgrade the monitoring charts
    pub async fn install_charts<H: ChartInstaller>(&self, helm: &H) -> AppResult<()> {
        for chart in &self.charts {
            helm.upgrade_install(chart).await?;
        }
        Ok(())
    }

    /// Apply resources, then install the charts
    pub async fn deploy<O: Orchestrator, H: ChartInstaller>(
        &self,
        orchestrator: &O,
        helm: &H,
    ) -> AppResult<AddressState> {
        let address = self.apply_resources(orchestrator).await?;
        self.install_charts(helm).await?;
        Ok(address)
    }

    /// Delete every Kubernetes object this topology declares
    #[instrument(skip_all, fields(namespace = %self.namespace))]
    pub async fn delete_resources<O: Orchestrator>(&self, orchestrator: &O) -> AppResult<()> {
        orchestrator.delete_config_map(DASHBOARD_CONFIG_MAP).await?;
        for exporter in &self.exporters {
            orchestrator.delete_service(&exporter.name).await?;
            orchestrator.delete_deployment(&exporter.name).await?;
        }
        for composite in self.composites() {
            composite.delete(orchestrator).await?;
        }
        info!("Deleted guestbook resources");
        Ok(())
    }

    /// Tear down resources and uninstall the charts
    pub async fn destroy<O: Orchestrator, H: ChartInstaller>(
        &self,
        orchestrator: &O,
        helm: &H,
    ) -> AppResult<()> {
        self.delete_resources(orchestrator).await?;
        for chart in self.charts.iter().rev() {
            helm.uninstall_release(&chart.release_name).await?;
        }
        Ok(())
    }

    /// Read the live services and derive the exported values
    ///
    /// Services that do not exist yet report their pending sentinel.
    pub async fn outputs<O: Orchestrator>(&self, orchestrator: &O) -> AppResult<TopologyOutputs> {
        let frontend_address = match self.frontend.address_policy() {
            AddressPolicy::Unset => AddressState::Unset,
            _ => match orchestrator.get_service(FRONTEND).await? {
                Some(service) => self.frontend.resolve_address(&service),
                None => AddressState::Pending,
            },
        };

        let grafana = if self.is_minikube {
            None
        } else {
            orchestrator.get_service(monitoring::GRAFANA_SERVICE).await?
        };

        Ok(TopologyOutputs {
            resolved_frontend_address: frontend_address.or_pending(ADDRESS_PENDING),
            monitoring_admin_user: self.admin_user.clone(),
            monitoring_admin_password: self.admin_password.clone(),
            monitoring_url: monitoring::monitoring_url(self.is_minikube, grafana.as_ref()),
            generated_at: Utc::now(),
        })
    }
}

fn to_document<T: Serialize>(object: &T) -> AppResult<String> {
    Ok(serde_yaml::to_string(object)?)
}
