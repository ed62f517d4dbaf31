//! Helm chart releases

mod client;
mod installer;
mod types;

pub use client::HelmClient;
pub use installer::ChartInstaller;
pub use types::ChartRelease;
