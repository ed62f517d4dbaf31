//! Topology outputs and rendered manifests

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::warn;

use super::response::{ApiResponse, IntoApiResponse};
use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::models::TopologyOutputs;

/// Current outputs of the deployed topology
#[utoipa::path(
    get,
    path = "/api/outputs",
    tag = "topology",
    responses(
        (status = 200, description = "Topology outputs", body = TopologyOutputs),
        (status = 503, description = "Kubernetes cluster not available"),
    )
)]
pub async fn get_outputs(State(state): State<AppState>) -> ApiResponse<TopologyOutputs> {
    compute_outputs(&state).await.into_api_response()
}

async fn compute_outputs(state: &AppState) -> AppResult<TopologyOutputs> {
    let k8s = state
        .k8s
        .read()
        .await
        .clone()
        .ok_or(AppError::ClusterUnavailable)?;

    let mut outputs = state.topology.outputs(&k8s).await.map_err(|e| {
        warn!(error = %e, "Failed to read topology outputs");
        e
    })?;

    // Once the watcher has settled the frontend address it is reported as-is
    if let Some(address) = state.frontend_address.get() {
        outputs.resolved_frontend_address = address.to_string();
    }

    Ok(outputs)
}

/// Rendered Kubernetes manifests as multi-document YAML
#[utoipa::path(
    get,
    path = "/api/manifests",
    tag = "topology",
    responses(
        (status = 200, description = "Rendered manifests", body = String, content_type = "application/yaml"),
    )
)]
pub async fn get_manifests(State(state): State<AppState>) -> impl IntoResponse {
    match state.topology.render() {
        Ok(yaml) => (
            StatusCode::OK,
            [("content-type", "application/yaml")],
            yaml,
        )
            .into_response(),
        Err(e) => ApiResponse::<()>::error("INTERNAL_ERROR", e.to_string()).into_response(),
    }
}
