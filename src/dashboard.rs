//! Grafana dashboard asset loader

use std::path::Path;

use tracing::info;

use crate::error::{AppError, AppResult};

/// Read the dashboard JSON file as an opaque payload
///
/// The text is returned verbatim; it is only parsed to reject files that are
/// not JSON. Any failure is fatal at startup.
pub fn load(path: impl AsRef<Path>) -> AppResult<String> {
    let path = path.as_ref();

    let text = std::fs::read_to_string(path).map_err(|e| AppError::Dashboard {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    serde_json::from_str::<serde_json::Value>(&text).map_err(|e| AppError::Dashboard {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    info!(path = %path.display(), bytes = text.len(), "Loaded dashboard");
    Ok(text)
}
