//! Composite service-deployment
//!
//! Folds together the common pattern of a Deployment and the Service that
//! exposes it. Both objects are derived from one [`WorkloadSpec`]; the service
//! selector and the pod template labels come from the same label map.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Container, Service};
use tracing::{info, instrument};

use super::address::{AddressPolicy, AddressState};
use super::orchestrator::Orchestrator;
use super::resources::{
    build_resource_requirements, container_ports, create_deployment, create_service, env_var,
};
use crate::error::AppResult;
use crate::models::WorkloadSpec;

/// A Deployment and its Service, built and owned as one unit
#[derive(Debug, Clone)]
pub struct ServiceDeployment {
    name: String,
    deployment: Deployment,
    service: Service,
    address_policy: AddressPolicy,
}

impl ServiceDeployment {
    /// Build the pair from a workload spec
    ///
    /// Fails with `InvalidSpec` if the name or image is empty. Pure: nothing is
    /// sent to the cluster until [`apply`](Self::apply).
    pub fn new(spec: &WorkloadSpec, namespace: &str) -> AppResult<Self> {
        spec.validate()?;

        let requests = spec.effective_resource_requests();
        let container = Container {
            name: spec.name.clone(),
            image: Some(spec.image.clone()),
            resources: Some(build_resource_requirements(&requests)),
            env: Some(vec![env_var("GET_HOSTS_FROM", "dns")]),
            ports: if spec.ports.is_empty() {
                None
            } else {
                Some(container_ports(&spec.ports))
            },
            ..Default::default()
        };

        let deployment = create_deployment(
            &spec.name,
            namespace,
            spec.effective_replicas(),
            container,
            spec.pod_annotations.clone(),
        );

        let address_policy =
            AddressPolicy::select(spec.allocate_external_address, spec.is_local_cluster);
        let service = create_service(
            &spec.name,
            namespace,
            &spec.ports,
            address_policy.service_type(),
        );

        Ok(Self {
            name: spec.name.clone(),
            deployment,
            service,
            address_policy,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn service(&self) -> &Service {
        &self.service
    }

    pub fn address_policy(&self) -> AddressPolicy {
        self.address_policy
    }

    /// Whether an externally meaningful address is derived at all
    pub fn exposes_address(&self) -> bool {
        self.address_policy != AddressPolicy::Unset
    }

    /// Resolve the address from the live service
    ///
    /// `Unset` when no address was requested; the live object is not read.
    pub fn resolve_address(&self, live: &Service) -> AddressState {
        self.address_policy.resolve(live)
    }

    /// Register both children with the orchestrator
    ///
    /// Returns the admitted service so the caller can resolve the address
    /// against the object the orchestrator actually accepted.
    #[instrument(skip(self, orchestrator), fields(name = %self.name))]
    pub async fn apply<O: Orchestrator>(&self, orchestrator: &O) -> AppResult<Service> {
        orchestrator.apply_deployment(&self.deployment).await?;
        let service = orchestrator.apply_service(&self.service).await?;
        info!(policy = %self.address_policy, "Applied service deployment");
        Ok(service)
    }

    /// Delete both children
    #[instrument(skip(self, orchestrator), fields(name = %self.name))]
    pub async fn delete<O: Orchestrator>(&self, orchestrator: &O) -> AppResult<()> {
        orchestrator.delete_service(&self.name).await?;
        orchestrator.delete_deployment(&self.name).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::ResourceRequests;
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
    use std::collections::BTreeMap;

    fn frontend(local: bool) -> WorkloadSpec {
        WorkloadSpec::new("frontend", "pulumi/guestbook-php-redis")
            .with_replicas(3)
            .with_ports([80])
            .expose(local)
    }

    #[test]
    fn test_container_descriptor() {
        let composite =
            ServiceDeployment::new(&WorkloadSpec::new("redis-leader", "redis").with_ports([6379]), "default")
                .unwrap();

        let spec = composite.deployment().spec.clone().unwrap();
        assert_eq!(spec.replicas, Some(1));

        let container = &spec.template.spec.unwrap().containers[0];
        assert_eq!(container.name, "redis-leader");
        assert_eq!(container.image.as_deref(), Some("redis"));

        let env = container.env.as_ref().unwrap();
        assert_eq!(env.len(), 1);
        assert_eq!(env[0].name, "GET_HOSTS_FROM");
        assert_eq!(env[0].value.as_deref(), Some("dns"));

        let requests = container
            .resources
            .as_ref()
            .and_then(|r| r.requests.as_ref())
            .unwrap();
        assert_eq!(requests.get("cpu"), Some(&Quantity("100m".to_string())));
        assert_eq!(requests.get("memory"), Some(&Quantity("100Mi".to_string())));

        let ports = container.ports.as_ref().unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].container_port, 6379);
    }

    #[test]
    fn test_custom_requests_and_annotations() {
        let annotations: BTreeMap<String, String> =
            [("prometheus.io/scrape".to_string(), "true".to_string())]
                .into_iter()
                .collect();
        let spec = WorkloadSpec::new("worker", "busybox")
            .with_resource_requests(ResourceRequests {
                cpu: "250m".to_string(),
                memory: "64Mi".to_string(),
            })
            .with_pod_annotations(annotations.clone());

        let composite = ServiceDeployment::new(&spec, "default").unwrap();
        let template = composite.deployment().spec.clone().unwrap().template;

        assert_eq!(template.metadata.unwrap().annotations, Some(annotations));
        let requests = template.spec.unwrap().containers[0]
            .resources
            .clone()
            .and_then(|r| r.requests)
            .unwrap();
        assert_eq!(requests.get("cpu"), Some(&Quantity("250m".to_string())));
    }

    #[test]
    fn test_no_annotations_omitted() {
        let composite = ServiceDeployment::new(&WorkloadSpec::new("a", "b"), "default").unwrap();
        let meta = composite.deployment().spec.clone().unwrap().template.metadata.unwrap();
        assert!(meta.annotations.is_none());
    }

    #[test]
    fn test_service_ports_mirror_spec() {
        let spec = WorkloadSpec::new("multi", "img").with_ports([8080, 80, 443]);
        let composite = ServiceDeployment::new(&spec, "default").unwrap();

        let ports = composite.service().spec.clone().unwrap().ports.unwrap();
        let mapped: Vec<(i32, Option<IntOrString>)> =
            ports.into_iter().map(|p| (p.port, p.target_port)).collect();
        assert_eq!(
            mapped,
            vec![
                (8080, Some(IntOrString::Int(8080))),
                (80, Some(IntOrString::Int(80))),
                (443, Some(IntOrString::Int(443))),
            ]
        );
    }

    #[test]
    fn test_empty_ports_declare_no_mappings() {
        let composite = ServiceDeployment::new(&WorkloadSpec::new("worker", "img"), "default").unwrap();

        assert!(composite.service().spec.clone().unwrap().ports.is_none());
        let container = &composite
            .deployment()
            .spec
            .clone()
            .unwrap()
            .template
            .spec
            .unwrap()
            .containers[0];
        assert!(container.ports.is_none());
    }

    #[test]
    fn test_selector_matches_template_labels() {
        for name in ["frontend", "redis-leader", "x"] {
            let composite = ServiceDeployment::new(&WorkloadSpec::new(name, "img"), "default").unwrap();
            let deployment_spec = composite.deployment().spec.clone().unwrap();
            let template_labels = deployment_spec.template.metadata.unwrap().labels;
            let selector = composite.service().spec.clone().unwrap().selector;

            assert_eq!(selector, template_labels);
            assert_eq!(deployment_spec.selector.match_labels, template_labels);
            assert_eq!(
                template_labels.unwrap().get("app"),
                Some(&name.to_string())
            );
        }
    }

    #[test]
    fn test_service_type_selection() {
        let internal = ServiceDeployment::new(&WorkloadSpec::new("a", "b"), "default").unwrap();
        assert!(internal.service().spec.clone().unwrap().type_.is_none());
        assert!(!internal.exposes_address());

        let local = ServiceDeployment::new(&frontend(true), "default").unwrap();
        assert_eq!(
            local.service().spec.clone().unwrap().type_.as_deref(),
            Some("ClusterIP")
        );
        assert_eq!(local.address_policy(), AddressPolicy::ClusterIp);

        let external = ServiceDeployment::new(&frontend(false), "default").unwrap();
        assert_eq!(
            external.service().spec.clone().unwrap().type_.as_deref(),
            Some("LoadBalancer")
        );
        assert_eq!(external.address_policy(), AddressPolicy::LoadBalancer);
    }

    #[test]
    fn test_invalid_spec() {
        let empty_name = frontend(false);
        let empty_name = WorkloadSpec {
            name: String::new(),
            ..empty_name
        };
        assert!(matches!(
            ServiceDeployment::new(&empty_name, "default"),
            Err(AppError::InvalidSpec(_))
        ));

        let empty_image = WorkloadSpec {
            image: String::new(),
            ..frontend(true)
        };
        assert!(matches!(
            ServiceDeployment::new(&empty_image, "default"),
            Err(AppError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_construction_is_deterministic() {
        let spec = frontend(false);
        let a = ServiceDeployment::new(&spec, "default").unwrap();
        let b = ServiceDeployment::new(&spec, "default").unwrap();

        assert_eq!(a.deployment(), b.deployment());
        assert_eq!(a.service(), b.service());
        assert_eq!(a.address_policy(), b.address_policy());
    }
}
