//! Chart installer seam
//!
//! `HelmClient` drives the Helm CLI; tests substitute a recording installer.

use super::types::ChartRelease;
use crate::error::AppResult;

/// Install and remove chart releases
#[allow(async_fn_in_trait)]
pub trait ChartInstaller {
    /// Install the release, or upgrade it if it already exists
    async fn upgrade_install(&self, release: &ChartRelease) -> AppResult<String>;

    /// Uninstall a release; a missing release is not an error
    async fn uninstall_release(&self, release_name: &str) -> AppResult<String>;
}
