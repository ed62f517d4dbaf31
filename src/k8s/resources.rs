//! Kubernetes resource builders for the guestbook
//!
//! Functions to create Deployment, Service and ConfigMap objects. Selectors and
//! pod template labels are always built from the same map.

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, Container, ContainerPort, EnvVar, PodSpec, PodTemplateSpec, ResourceRequirements,
    Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

use crate::models::ResourceRequests;

/// Label key binding a service to its workload's pods
pub const APP_LABEL: &str = "app";

/// Value of `app.kubernetes.io/managed-by` on every object we create
pub const MANAGED_BY: &str = "guestbook";

/// Selector labels for a workload: `{app: name}`
pub fn app_labels(name: &str) -> BTreeMap<String, String> {
    [(APP_LABEL.to_string(), name.to_string())]
        .into_iter()
        .collect()
}

/// Object metadata labels: the selector labels plus ownership markers
pub fn object_labels(name: &str) -> BTreeMap<String, String> {
    let mut labels = app_labels(name);
    labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        MANAGED_BY.to_string(),
    );
    labels.insert(
        "app.kubernetes.io/part-of".to_string(),
        "guestbook".to_string(),
    );
    labels
}

fn object_meta(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(object_labels(name)),
        ..Default::default()
    }
}

/// Build resource requests from the workload config
pub fn build_resource_requirements(requests: &ResourceRequests) -> ResourceRequirements {
    let mut map = BTreeMap::new();
    map.insert("cpu".to_string(), Quantity(requests.cpu.clone()));
    map.insert("memory".to_string(), Quantity(requests.memory.clone()));

    ResourceRequirements {
        requests: Some(map),
        ..Default::default()
    }
}

pub fn env_var(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        ..Default::default()
    }
}

/// One container port per entry, in order
pub fn container_ports(ports: &[i32]) -> Vec<ContainerPort> {
    ports
        .iter()
        .map(|&port| ContainerPort {
            container_port: port,
            ..Default::default()
        })
        .collect()
}

/// One service port per entry, target equal to the exposed port
pub fn service_ports(ports: &[i32]) -> Vec<ServicePort> {
    ports
        .iter()
        .map(|&port| ServicePort {
            port,
            target_port: Some(IntOrString::Int(port)),
            ..Default::default()
        })
        .collect()
}

// Empty port lists are omitted rather than serialized as `[]`
fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Create a Deployment running a single container
pub fn create_deployment(
    name: &str,
    namespace: &str,
    replicas: i32,
    container: Container,
    pod_annotations: Option<BTreeMap<String, String>>,
) -> Deployment {
    let labels = app_labels(name);

    Deployment {
        metadata: object_meta(name, namespace),
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    annotations: pod_annotations,
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![container],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Create a Service selecting the pods of workload `name`
pub fn create_service(
    name: &str,
    namespace: &str,
    ports: &[i32],
    service_type: Option<&str>,
) -> Service {
    Service {
        metadata: object_meta(name, namespace),
        spec: Some(ServiceSpec {
            selector: Some(app_labels(name)),
            ports: non_empty(service_ports(ports)),
            type_: service_type.map(str::to_string),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Create a Deployment + Service pair for a Prometheus Redis exporter
///
/// The exporter scrapes `redis_target:6379` and is annotated for Prometheus
/// pod discovery.
pub fn create_redis_exporter(
    name: &str,
    namespace: &str,
    redis_target: &str,
) -> (Deployment, Service) {
    let container = Container {
        name: "redis-exporter".to_string(),
        image: Some(REDIS_EXPORTER_IMAGE.to_string()),
        env: Some(vec![env_var(
            "REDIS_ADDR",
            &format!("{}:{}", redis_target, REDIS_PORT),
        )]),
        ports: Some(container_ports(&[REDIS_EXPORTER_PORT])),
        ..Default::default()
    };

    let annotations = prometheus_annotations(REDIS_EXPORTER_PORT);
    let deployment = create_deployment(name, namespace, 1, container, Some(annotations));
    let service = create_service(name, namespace, &[REDIS_EXPORTER_PORT], None);

    (deployment, service)
}

pub const REDIS_PORT: i32 = 6379;
pub const REDIS_EXPORTER_PORT: i32 = 9121;
pub const REDIS_EXPORTER_IMAGE: &str = "oliver006/redis_exporter:v1.67.0";

/// Annotations enabling Prometheus scraping on `port`
pub fn prometheus_annotations(port: i32) -> BTreeMap<String, String> {
    [
        ("prometheus.io/scrape".to_string(), "true".to_string()),
        ("prometheus.io/port".to_string(), port.to_string()),
    ]
    .into_iter()
    .collect()
}

/// Create the ConfigMap picked up by the Grafana dashboard sidecar
pub fn create_dashboard_config_map(name: &str, namespace: &str, dashboard_json: &str) -> ConfigMap {
    let mut metadata = object_meta(name, namespace);
    if let Some(labels) = metadata.labels.as_mut() {
        labels.insert("grafana_dashboard".to_string(), "1".to_string());
    }

    ConfigMap {
        metadata,
        data: Some(
            [("my-dashboard.json".to_string(), dashboard_json.to_string())]
                .into_iter()
                .collect(),
        ),
        ..Default::default()
    }
}
