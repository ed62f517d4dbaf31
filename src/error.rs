//! Error types for the guestbook topology

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// A workload was declared without a required field
    #[error("invalid workload spec: {0}")]
    InvalidSpec(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("Kubernetes cluster not available")]
    ClusterUnavailable,

    #[error("helm command failed: {0}")]
    Helm(String),

    /// The dashboard asset could not be loaded; fatal at startup
    #[error("failed to load dashboard from {path}: {source}")]
    Dashboard {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Kubernetes(#[from] kube::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl AppError {
    pub fn invalid_spec(msg: &str) -> Self {
        AppError::InvalidSpec(msg.to_string())
    }

    pub fn internal(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }

    /// Whether this error is a Kubernetes 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::Kubernetes(kube::Error::Api(e)) if e.code == 404)
    }
}
