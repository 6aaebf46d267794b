//! Kubernetes-backed cluster client

use crate::cluster_trait::ClusterClientTrait;
use crate::error::ClusterError;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{ListParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config, Resource};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::path::Path;
use tracing::debug;

/// Cluster client backed by a `kube::Client`
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    /// Wrap an existing kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Infer configuration from the environment (in-cluster, KUBECONFIG or ~/.kube/config)
    pub async fn try_default() -> Result<Self, ClusterError> {
        let client = Client::try_default().await?;
        Ok(Self::new(client))
    }

    /// Build a client from an explicit kubeconfig file and/or context.
    ///
    /// With neither set this is the same as [`KubeClusterClient::try_default`].
    pub async fn from_kubeconfig(path: Option<&Path>, context: Option<&str>) -> Result<Self, ClusterError> {
        if path.is_none() && context.is_none() {
            return Self::try_default().await;
        }

        let options = KubeConfigOptions {
            context: context.map(str::to_string),
            ..Default::default()
        };
        let config = match path {
            Some(path) => {
                debug!("Loading kubeconfig from {}", path.display());
                let kubeconfig = Kubeconfig::read_from(path)?;
                Config::from_custom_kubeconfig(kubeconfig, &options).await?
            }
            None => Config::from_kubeconfig(&options).await?,
        };
        let client = Client::try_from(config)?;
        Ok(Self::new(client))
    }

    async fn get_namespaced<K>(&self, namespace: &str, name: &str, what: &str) -> Result<K, ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        debug!("Fetching {} {}/{}", what, namespace, name);
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| ClusterError::from_kube(e, &format!("{what} {namespace}/{name}")))
    }

    async fn replace_namespaced<K>(&self, namespace: &str, object: &K, what: &str) -> Result<K, ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let name = object
            .meta()
            .name
            .clone()
            .ok_or_else(|| ClusterError::InvalidRequest(format!("{what} in {namespace} has no name")))?;

        debug!(
            "Replacing {} {}/{} at resourceVersion {:?}",
            what,
            namespace,
            name,
            object.meta().resource_version
        );
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.replace(&name, &PostParams::default(), object)
            .await
            .map_err(|e| ClusterError::from_kube(e, &format!("{what} {namespace}/{name}")))
    }
}

#[async_trait::async_trait]
impl ClusterClientTrait for KubeClusterClient {
    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ClusterError> {
        self.get_namespaced(namespace, name, "Deployment").await
    }

    async fn replace_deployment(&self, namespace: &str, deployment: &Deployment) -> Result<Deployment, ClusterError> {
        self.replace_namespaced(namespace, deployment, "Deployment").await
    }

    async fn get_stateful_set(&self, namespace: &str, name: &str) -> Result<StatefulSet, ClusterError> {
        self.get_namespaced(namespace, name, "StatefulSet").await
    }

    async fn replace_stateful_set(&self, namespace: &str, stateful_set: &StatefulSet) -> Result<StatefulSet, ClusterError> {
        self.replace_namespaced(namespace, stateful_set, "StatefulSet").await
    }

    async fn list_pods(&self, namespace: &str, label_selector: Option<&str>) -> Result<Vec<Pod>, ClusterError> {
        debug!("Listing pods in {} with selector {:?}", namespace, label_selector);
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = match label_selector {
            Some(selector) => ListParams::default().labels(selector),
            None => ListParams::default(),
        };
        let pods = api
            .list(&params)
            .await
            .map_err(|e| ClusterError::from_kube(e, &format!("pods in {namespace}")))?;
        Ok(pods.items)
    }

    async fn replace_pod(&self, namespace: &str, pod: &Pod) -> Result<Pod, ClusterError> {
        self.replace_namespaced(namespace, pod, "Pod").await
    }
}
