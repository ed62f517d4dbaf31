use serde::{Deserialize, Serialize};

/// A chart release to install or upgrade
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartRelease {
    pub release_name: String,
    pub chart: String,
    /// Pinned chart version
    pub version: String,
    /// Chart repository URL passed as `--repo`
    pub repo: String,
    #[serde(default)]
    pub values: serde_json::Value,
}

impl ChartRelease {
    pub fn new(release_name: &str, chart: &str, version: &str, repo: &str) -> Self {
        Self {
            release_name: release_name.to_string(),
            chart: chart.to_string(),
            version: version.to_string(),
            repo: repo.to_string(),
            values: serde_json::json!({}),
        }
    }

    pub fn with_values(mut self, values: serde_json::Value) -> Self {
        self.values = values;
        self
    }

    /// Whether any values override the chart defaults
    pub fn has_values(&self) -> bool {
        self.values.as_object().map(|o| !o.is_empty()).unwrap_or(false)
    }

    /// Arguments for `helm upgrade --install`, excluding the values file
    pub fn upgrade_args(&self, namespace: &str) -> Vec<String> {
        vec![
            "upgrade".to_string(),
            "--install".to_string(),
            self.release_name.clone(),
            self.chart.clone(),
            "--repo".to_string(),
            self.repo.clone(),
            "--version".to_string(),
            self.version.clone(),
            "--namespace".to_string(),
            namespace.to_string(),
        ]
    }
}
