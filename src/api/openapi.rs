//! OpenAPI documentation for the guestbook API

use utoipa::OpenApi;

/// API Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Guestbook Topology API",
        version = "1.0.0",
        description = "Outputs of the guestbook topology: frontend address, Grafana URL and credentials.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "topology", description = "Topology outputs and rendered manifests"),
        (name = "cluster", description = "Kubernetes cluster status")
    ),
    paths(
        crate::api::health::health_check,
        crate::api::health::cluster_status,
        crate::api::outputs::get_outputs,
        crate::api::outputs::get_manifests,
    ),
    components(
        schemas(
            crate::models::TopologyOutputs,
            crate::models::WorkloadSpec,
            crate::models::ResourceRequests,
            crate::api::health::ClusterStatusResponse,
            crate::api::health::HealthResponse,
        )
    )
)]
pub struct ApiDoc;
