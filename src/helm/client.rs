use std::io::Write;
use std::process::Stdio;

use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{error, info, instrument, warn};

use super::installer::ChartInstaller;
use super::types::ChartRelease;
use crate::error::{AppError, AppResult};

/// Client driving the Helm CLI
#[derive(Clone)]
pub struct HelmClient {
    namespace: String,
}

impl HelmClient {
    pub fn new(namespace: String) -> Self {
        Self { namespace }
    }
}

/// Write the release's values to a private temporary file
///
/// The file is removed when the returned handle is dropped, so it must outlive
/// the helm invocation.
fn write_values_file(release: &ChartRelease) -> AppResult<Option<NamedTempFile>> {
    if !release.has_values() {
        return Ok(None);
    }

    let values_yaml = serde_yaml::to_string(&release.values)?;
    let mut file = tempfile::Builder::new()
        .prefix("helm-values-")
        .suffix(".yaml")
        .tempfile()
        .map_err(|e| AppError::Helm(format!("failed to create values file: {}", e)))?;
    file.write_all(values_yaml.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| AppError::Helm(format!("failed to write values file: {}", e)))?;

    Ok(Some(file))
}

/// Whether `helm uninstall` failed only because the release does not exist
fn release_missing(stderr: &str) -> bool {
    stderr.contains("not found")
}

impl ChartInstaller for HelmClient {
    #[instrument(skip(self, release), fields(release = %release.release_name, chart = %release.chart))]
    async fn upgrade_install(&self, release: &ChartRelease) -> AppResult<String> {
        info!(version = %release.version, "Installing Helm chart");

        let mut cmd = Command::new("helm");
        cmd.args(release.upgrade_args(&self.namespace));

        let values_file = write_values_file(release)?;
        if let Some(file) = &values_file {
            cmd.arg("--values").arg(file.path());
        }

        let output = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| AppError::Helm(format!("failed to execute helm: {}", e)))?;
        drop(values_file);

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        info!("Helm upgrade stdout: {}", stdout);
        if !stderr.is_empty() {
            warn!("Helm upgrade stderr: {}", stderr);
        }

        if output.status.success() {
            metrics::increment_counter!("guestbook_helm_releases_applied_total");
            info!("Helm chart installed successfully");
            Ok(stdout.to_string())
        } else {
            error!("Helm upgrade failed: {}", stderr);
            Err(AppError::Helm(stderr.to_string()))
        }
    }

    #[instrument(skip(self))]
    async fn uninstall_release(&self, release_name: &str) -> AppResult<String> {
        info!("Uninstalling Helm release");

        let output = Command::new("helm")
            .arg("uninstall")
            .arg(release_name)
            .arg("--namespace")
            .arg(&self.namespace)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| AppError::Helm(format!("failed to execute helm: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            info!("Helm release uninstalled successfully: {}", stdout);
            Ok(stdout.to_string())
        } else if release_missing(&stderr) {
            info!("Helm release already absent");
            Ok(String::new())
        } else {
            error!("Helm uninstall failed: {}", stderr);
            Err(AppError::Helm(stderr.to_string()))
        }
    }
}
