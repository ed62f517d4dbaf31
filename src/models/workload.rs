use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// CPU request applied when a workload does not declare one
pub const DEFAULT_CPU_REQUEST: &str = "100m";

/// Memory request applied when a workload does not declare one
pub const DEFAULT_MEMORY_REQUEST: &str = "100Mi";

/// Declarative input for a service-deployment pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSpec {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub replicas: Option<i32>,
    /// Forwarded as-is, without range validation
    #[serde(default)]
    pub ports: Vec<i32>,
    #[serde(default)]
    pub resource_requests: Option<ResourceRequests>,
    #[serde(default)]
    pub pod_annotations: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub allocate_external_address: bool,
    #[serde(default)]
    pub is_local_cluster: bool,
}

/// CPU and memory requests for the workload's container
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ResourceRequests {
    pub cpu: String,
    pub memory: String,
}

impl Default for ResourceRequests {
    fn default() -> Self {
        Self {
            cpu: DEFAULT_CPU_REQUEST.to_string(),
            memory: DEFAULT_MEMORY_REQUEST.to_string(),
        }
    }
}

impl WorkloadSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            replicas: None,
            ports: Vec::new(),
            resource_requests: None,
            pod_annotations: None,
            allocate_external_address: false,
            is_local_cluster: false,
        }
    }

    pub fn with_replicas(mut self, replicas: i32) -> Self {
        self.replicas = Some(replicas);
        self
    }

    pub fn with_ports(mut self, ports: impl IntoIterator<Item = i32>) -> Self {
        self.ports = ports.into_iter().collect();
        self
    }

    pub fn with_resource_requests(mut self, requests: ResourceRequests) -> Self {
        self.resource_requests = Some(requests);
        self
    }

    pub fn with_pod_annotations(mut self, annotations: BTreeMap<String, String>) -> Self {
        self.pod_annotations = Some(annotations);
        self
    }

    /// Request an address for the service: the cluster IP when `local`,
    /// otherwise a provisioned load balancer
    pub fn expose(mut self, local: bool) -> Self {
        self.allocate_external_address = true;
        self.is_local_cluster = local;
        self
    }

    /// Replica count, defaulting to 1; zero or negative counts as unset
    pub fn effective_replicas(&self) -> i32 {
        self.replicas.filter(|r| *r > 0).unwrap_or(1)
    }

    pub fn effective_resource_requests(&self) -> ResourceRequests {
        self.resource_requests.clone().unwrap_or_default()
    }

    /// Validate the required fields
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::invalid_spec("name must not be empty"));
        }
        if self.image.trim().is_empty() {
            return Err(AppError::InvalidSpec(format!(
                "image must not be empty for workload '{}'",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let spec = WorkloadSpec::new("redis-leader", "redis");
        assert_eq!(spec.effective_replicas(), 1);
        assert!(spec.ports.is_empty());
        assert_eq!(
            spec.effective_resource_requests(),
            ResourceRequests {
                cpu: "100m".to_string(),
                memory: "100Mi".to_string(),
            }
        );
        assert!(!spec.allocate_external_address);
        assert!(!spec.is_local_cluster);
    }

    #[test]
    fn test_non_positive_replicas_fall_back() {
        assert_eq!(WorkloadSpec::new("w", "img").with_replicas(0).effective_replicas(), 1);
        assert_eq!(WorkloadSpec::new("w", "img").with_replicas(-2).effective_replicas(), 1);
        assert_eq!(WorkloadSpec::new("w", "img").with_replicas(3).effective_replicas(), 3);
    }

    #[test]
    fn test_expose_sets_both_flags() {
        let local = WorkloadSpec::new("w", "img").expose(true);
        assert!(local.allocate_external_address && local.is_local_cluster);

        let external = WorkloadSpec::new("w", "img").expose(false);
        assert!(external.allocate_external_address && !external.is_local_cluster);
    }

    #[test]
    fn test_validate_required_fields() {
        assert!(WorkloadSpec::new("frontend", "php").validate().is_ok());
        assert!(matches!(
            WorkloadSpec::new("", "php").validate(),
            Err(AppError::InvalidSpec(_))
        ));
        assert!(matches!(
            WorkloadSpec::new("frontend", "  ").validate(),
            Err(AppError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let spec: WorkloadSpec = serde_json::from_value(serde_json::json!({
            "name": "frontend",
            "image": "pulumi/guestbook-php-redis",
            "replicas": 3,
            "ports": [80],
            "allocateExternalAddress": true,
            "isLocalCluster": true
        }))
        .unwrap();

        assert_eq!(spec.effective_replicas(), 3);
        assert_eq!(spec.ports, vec![80]);
        assert!(spec.allocate_external_address);
        assert!(spec.is_local_cluster);
        assert!(spec.pod_annotations.is_none());
    }
}
