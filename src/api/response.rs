//! Standardized API response types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

/// Error details in API response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful response with data
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// Create an error response
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = if self.success {
            StatusCode::OK
        } else {
            // Determine status from error code
            match self.error.as_ref().map(|e| e.code.as_str()) {
                Some("VALIDATION_ERROR") => StatusCode::BAD_REQUEST,
                Some("CLUSTER_UNAVAILABLE") => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        };
        (status, Json(self)).into_response()
    }
}

/// Helper trait for converting results to API responses
pub trait IntoApiResponse<T> {
    fn into_api_response(self) -> ApiResponse<T>;
}

impl<T: Serialize> IntoApiResponse<T> for Result<T, AppError> {
    fn into_api_response(self) -> ApiResponse<T> {
        match self {
            Ok(data) => ApiResponse::success(data),
            Err(e) => {
                let code = match &e {
                    AppError::InvalidSpec(_) => "VALIDATION_ERROR",
                    AppError::ClusterUnavailable => "CLUSTER_UNAVAILABLE",
                    AppError::Helm(_) => "HELM_ERROR",
                    AppError::Dashboard { .. } => "DASHBOARD_ERROR",
                    AppError::Kubernetes(_) => "KUBERNETES_ERROR",
                    AppError::Serialization(_) | AppError::Yaml(_) => "SERIALIZATION_ERROR",
                    AppError::Internal(_) => "INTERNAL_ERROR",
                };
                ApiResponse {
                    success: false,
                    data: None,
                    error: Some(ApiError {
                        code: code.to_string(),
                        message: e.to_string(),
                    }),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_unavailable_maps_to_503() {
        let result: Result<(), AppError> = Err(AppError::ClusterUnavailable);
        let response = result.into_api_response();
        assert_eq!(response.error.as_ref().unwrap().code, "CLUSTER_UNAVAILABLE");
        assert_eq!(
            response.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_invalid_spec_maps_to_400() {
        let result: Result<(), AppError> = Err(AppError::invalid_spec("name must not be empty"));
        assert_eq!(
            result.into_api_response().into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
