//! ClusterClient trait for mocking
//!
//! This trait abstracts the Kubernetes API calls made by the tuner so that
//! the reconciliation engine can run against `MockClusterClient` in unit tests.

use crate::error::ClusterError;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::Pod;

/// Trait for cluster API operations
///
/// All calls are single round trips; objects are replaced whole, carrying
/// the resource version they were read with.
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ClusterClientTrait: Send + Sync {
    // Deployments
    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ClusterError>;
    async fn replace_deployment(&self, namespace: &str, deployment: &Deployment) -> Result<Deployment, ClusterError>;

    // StatefulSets
    async fn get_stateful_set(&self, namespace: &str, name: &str) -> Result<StatefulSet, ClusterError>;
    async fn replace_stateful_set(&self, namespace: &str, stateful_set: &StatefulSet) -> Result<StatefulSet, ClusterError>;

    // Pods
    async fn list_pods(&self, namespace: &str, label_selector: Option<&str>) -> Result<Vec<Pod>, ClusterError>;
    async fn replace_pod(&self, namespace: &str, pod: &Pod) -> Result<Pod, ClusterError>;
}
