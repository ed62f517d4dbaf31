//! Prometheus and Grafana chart releases

use k8s_openapi::api::core::v1::Service;
use serde_json::json;

use crate::config::Config;
use crate::helm::ChartRelease;
use crate::k8s::resolve_load_balancer;

pub const PROMETHEUS_CHART: &str = "prometheus";
pub const PROMETHEUS_VERSION: &str = "27.3.1";
pub const PROMETHEUS_REPO: &str = "https://prometheus-community.github.io/helm-charts";

pub const GRAFANA_CHART: &str = "grafana";
pub const GRAFANA_VERSION: &str = "8.10.1";
pub const GRAFANA_REPO: &str = "https://grafana.github.io/helm-charts";

/// Name of the Service the grafana chart creates (`fullnameOverride`)
pub const GRAFANA_SERVICE: &str = "grafana";

/// In-cluster URL of the Prometheus server created by the chart
pub const PROMETHEUS_DATASOURCE_URL: &str = "http://prometheus-server:80";

/// Grafana datasource name; dashboard panels refer to it
pub const PROMETHEUS_DATASOURCE_NAME: &str = "prometheus";

pub const GRAFANA_MINIKUBE_INSTRUCTIONS: &str =
    "Please run: `minikube service grafana` to access Grafana.";

pub const GRAFANA_URL_PENDING: &str =
    "Grafana URL not yet available. Please check the service status.";

pub fn prometheus_release() -> ChartRelease {
    ChartRelease::new(
        PROMETHEUS_CHART,
        PROMETHEUS_CHART,
        PROMETHEUS_VERSION,
        PROMETHEUS_REPO,
    )
}

/// Grafana release; the service is a NodePort on minikube, a LoadBalancer elsewhere
pub fn grafana_release(config: &Config) -> ChartRelease {
    let service_type = if config.is_minikube {
        "NodePort"
    } else {
        "LoadBalancer"
    };

    let values = json!({
        "fullnameOverride": GRAFANA_SERVICE,
        "service": {
            "type": service_type,
            "port": 80,
        },
        "adminUser": config.grafana_admin_user,
        "adminPassword": config.grafana_admin_password,
        // PodSecurityPolicy is removed from current clusters
        "podSecurityPolicy": {
            "enabled": false,
        },
        "sidecar": {
            "dashboards": {
                "enabled": true,
            },
        },
        "datasources": {
            "datasources.yaml": {
                "apiVersion": 1,
                "datasources": [
                    {
                        "name": PROMETHEUS_DATASOURCE_NAME,
                        "type": "prometheus",
                        "access": "proxy",
                        "url": PROMETHEUS_DATASOURCE_URL,
                        "isDefault": true,
                    }
                ],
            },
        },
    });

    ChartRelease::new(GRAFANA_CHART, GRAFANA_CHART, GRAFANA_VERSION, GRAFANA_REPO)
        .with_values(values)
}

/// Grafana URL for the outputs
///
/// Local clusters have no load-balancer ingress, so they get instructions
/// instead and the live service is never consulted.
pub fn monitoring_url(is_minikube: bool, live: Option<&Service>) -> String {
    if is_minikube {
        return GRAFANA_MINIKUBE_INSTRUCTIONS.to_string();
    }

    resolve_load_balancer(live.and_then(|s| s.status.as_ref())).or_pending(GRAFANA_URL_PENDING)
}
