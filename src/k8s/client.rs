//! Kubernetes client wrapper for the guestbook

use anyhow::Result;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use kube::{
    api::{Api, DeleteParams, Patch, PatchParams},
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config, Resource,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use tracing::{info, instrument};

use super::orchestrator::Orchestrator;
use crate::error::{AppError, AppResult};

/// Field manager recorded on server-side applied objects
pub const FIELD_MANAGER: &str = "guestbook";

/// Wrapper around kube::Client scoped to one namespace
#[derive(Clone)]
pub struct K8sClient {
    client: Client,
    namespace: String,
}

impl K8sClient {
    /// Create a new K8sClient using the default kubeconfig or in-cluster config
    #[instrument(skip_all)]
    pub async fn new(namespace: &str) -> Result<Self> {
        let config = Config::infer().await?;
        Self::from_config(config, namespace)
    }

    /// Create a K8sClient from an explicit kubeconfig file
    #[instrument(skip_all, fields(path = %path))]
    pub async fn from_kubeconfig(path: &str, namespace: &str) -> Result<Self> {
        let kubeconfig = Kubeconfig::read_from(path)?;
        let config =
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?;
        Self::from_config(config, namespace)
    }

    /// Connect using the configured kubeconfig path if any, otherwise infer
    pub async fn connect(kubeconfig: Option<&str>, namespace: &str) -> Result<Self> {
        match kubeconfig {
            Some(path) => Self::from_kubeconfig(path, namespace).await,
            None => Self::new(namespace).await,
        }
    }

    fn from_config(config: Config, namespace: &str) -> Result<Self> {
        let client = Client::try_from(config)?;

        info!(namespace, "Connected to Kubernetes cluster");

        Ok(Self {
            client,
            namespace: namespace.to_string(),
        })
    }

    /// Get the namespace this client operates in
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Get a typed API for services in the configured namespace
    pub fn services(&self) -> Api<Service> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    /// Check if cluster is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let version = self.client.apiserver_version().await?;
        info!(version = %version.git_version, "Kubernetes cluster is healthy");
        Ok(true)
    }

    async fn apply<K>(&self, object: &K) -> AppResult<K>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope>
            + Clone
            + Debug
            + DeserializeOwned
            + Serialize,
        K::DynamicType: Default,
    {
        let name = object
            .meta()
            .name
            .clone()
            .ok_or_else(|| AppError::internal("cannot apply an object without a name"))?;

        let api: Api<K> = Api::namespaced(self.client.clone(), &self.namespace);
        let params = PatchParams::apply(FIELD_MANAGER).force();
        let applied = api.patch(&name, &params, &Patch::Apply(object)).await?;

        metrics::increment_counter!(
            "guestbook_resources_applied_total",
            "kind" => K::kind(&K::DynamicType::default()).to_string()
        );
        info!(name = %name, kind = %K::kind(&K::DynamicType::default()), "Applied resource");
        Ok(applied)
    }

    async fn delete<K>(&self, name: &str) -> AppResult<()>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope>
            + Clone
            + Debug
            + DeserializeOwned,
        K::DynamicType: Default,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), &self.namespace);
        let kind = K::kind(&K::DynamicType::default()).to_string();
        match api.delete(name, &DeleteParams::default()).await.map_err(AppError::from) {
            Ok(_) => {
                info!(name, kind = %kind, "Deleted resource");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                // Already gone, that's fine
                info!(name, kind = %kind, "Resource already absent");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl Orchestrator for K8sClient {
    #[instrument(skip(self, deployment), fields(name = %deployment.metadata.name.as_deref().unwrap_or("unknown")))]
    async fn apply_deployment(&self, deployment: &Deployment) -> AppResult<Deployment> {
        self.apply(deployment).await
    }

    #[instrument(skip(self, service), fields(name = %service.metadata.name.as_deref().unwrap_or("unknown")))]
    async fn apply_service(&self, service: &Service) -> AppResult<Service> {
        self.apply(service).await
    }

    #[instrument(skip(self, config_map), fields(name = %config_map.metadata.name.as_deref().unwrap_or("unknown")))]
    async fn apply_config_map(&self, config_map: &ConfigMap) -> AppResult<ConfigMap> {
        self.apply(config_map).await
    }

    async fn get_service(&self, name: &str) -> AppResult<Option<Service>> {
        Ok(self.services().get_opt(name).await?)
    }

    #[instrument(skip(self))]
    async fn delete_deployment(&self, name: &str) -> AppResult<()> {
        self.delete::<Deployment>(name).await
    }

    #[instrument(skip(self))]
    async fn delete_service(&self, name: &str) -> AppResult<()> {
        self.delete::<Service>(name).await
    }

    #[instrument(skip(self))]
    async fn delete_config_map(&self, name: &str) -> AppResult<()> {
        self.delete::<ConfigMap>(name).await
    }
}
