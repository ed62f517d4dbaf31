use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Single-node development cluster without load-balancer provisioning
    #[serde(default)]
    pub is_minikube: bool,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_kubeconfig")]
    pub kubeconfig: Option<String>,

    #[serde(default = "default_dashboard_path")]
    pub dashboard_path: String,

    #[serde(default = "default_grafana_admin_user")]
    pub grafana_admin_user: String,

    // Weak demo default; real deployments override GRAFANA_ADMIN_PASSWORD
    #[serde(default = "default_grafana_admin_password")]
    pub grafana_admin_password: String,

    /// Print the rendered manifests and exit without touching the cluster
    #[serde(default)]
    pub render_only: bool,

    /// Delete every resource and uninstall the charts, then exit
    #[serde(default)]
    pub teardown: bool,
}

fn default_port() -> u16 {
    8080
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_kubeconfig() -> Option<String> {
    None
}

fn default_dashboard_path() -> String {
    "763_rev6.json".to_string()
}

fn default_grafana_admin_user() -> String {
    "admin".to_string()
}

fn default_grafana_admin_password() -> String {
    "admin123".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_environment(config::Environment::default())
    }

    /// Absent keys take their defaults; a malformed value is an error
    fn from_environment(environment: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?;

        let settings: Config = config
            .try_deserialize()
            .context("invalid configuration in environment")?;

        Ok(settings)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            is_minikube: false,
            namespace: default_namespace(),
            kubeconfig: default_kubeconfig(),
            dashboard_path: default_dashboard_path(),
            grafana_admin_user: default_grafana_admin_user(),
            grafana_admin_password: default_grafana_admin_password(),
            render_only: false,
            teardown: false,
        }
    }
}
