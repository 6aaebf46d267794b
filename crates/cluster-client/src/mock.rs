//! Mock ClusterClient for unit testing
//!
//! This module provides a mock implementation of ClusterClientTrait that can be used
//! in unit tests without requiring a running cluster. It mimics the parts of
//! API server behaviour the tuner depends on: resource versions with conflict
//! detection, label selectors, and canonicalization of quantity strings.

use crate::cluster_trait::ClusterClientTrait;
use crate::error::ClusterError;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{Container, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Key = (String, String);

/// API calls recorded and failable on the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetDeployment,
    ReplaceDeployment,
    GetStatefulSet,
    ReplaceStatefulSet,
    ListPods,
    ReplacePod,
}

/// Mock ClusterClient for testing
///
/// Objects live in memory keyed by `(namespace, name)`. Every stored object
/// carries a resource version; a replace whose version does not match the
/// stored one fails with `ClusterError::Conflict`.
#[derive(Clone, Default)]
pub struct MockClusterClient {
    deployments: Arc<Mutex<BTreeMap<Key, Deployment>>>,
    stateful_sets: Arc<Mutex<BTreeMap<Key, StatefulSet>>>,
    pods: Arc<Mutex<BTreeMap<Key, Pod>>>,
    // Counter for generating resource versions
    next_version: Arc<Mutex<u64>>,
    // Quantity strings the "server" rewrites on write (e.g. "1000m" -> "1")
    canonical_quantities: Arc<Mutex<HashMap<String, String>>>,
    failures: Arc<Mutex<HashMap<Operation, String>>>,
    failing_pods: Arc<Mutex<HashSet<Key>>>,
    // Objects whose version is bumped behind the caller's back after each get
    concurrent_writers: Arc<Mutex<HashSet<Key>>>,
    calls: Arc<Mutex<HashMap<Operation, usize>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

impl MockClusterClient {
    /// Create a new, empty mock client
    pub fn new() -> Self {
        Self::default()
    }

    fn next_version(&self) -> String {
        let mut next = lock(&self.next_version);
        *next += 1;
        next.to_string()
    }

    fn stamp(&self, meta: &mut ObjectMeta) -> Key {
        meta.resource_version = Some(self.next_version());
        key(
            meta.namespace.as_deref().unwrap_or("default"),
            meta.name.as_deref().unwrap_or_default(),
        )
    }

    /// Add a Deployment to the mock store (for test setup)
    pub fn add_deployment(&self, mut deployment: Deployment) {
        let key = self.stamp(&mut deployment.metadata);
        lock(&self.deployments).insert(key, deployment);
    }

    /// Add a StatefulSet to the mock store (for test setup)
    pub fn add_stateful_set(&self, mut stateful_set: StatefulSet) {
        let key = self.stamp(&mut stateful_set.metadata);
        lock(&self.stateful_sets).insert(key, stateful_set);
    }

    /// Add a Pod to the mock store (for test setup)
    pub fn add_pod(&self, mut pod: Pod) {
        let key = self.stamp(&mut pod.metadata);
        lock(&self.pods).insert(key, pod);
    }

    /// Stored Deployment, if any
    pub fn deployment(&self, namespace: &str, name: &str) -> Option<Deployment> {
        lock(&self.deployments).get(&key(namespace, name)).cloned()
    }

    /// Stored StatefulSet, if any
    pub fn stateful_set(&self, namespace: &str, name: &str) -> Option<StatefulSet> {
        lock(&self.stateful_sets).get(&key(namespace, name)).cloned()
    }

    /// Stored Pod, if any
    pub fn pod(&self, namespace: &str, name: &str) -> Option<Pod> {
        lock(&self.pods).get(&key(namespace, name)).cloned()
    }

    /// Make every write store `canonical` wherever a container quantity equals `written`
    pub fn canonicalize_quantity(&self, written: impl Into<String>, canonical: impl Into<String>) {
        lock(&self.canonical_quantities).insert(written.into(), canonical.into());
    }

    /// Make every call of `operation` fail with an API error
    pub fn fail(&self, operation: Operation, message: impl Into<String>) {
        lock(&self.failures).insert(operation, message.into());
    }

    /// Make replacing one specific pod fail
    pub fn fail_pod_replace(&self, namespace: &str, name: &str) {
        lock(&self.failing_pods).insert(key(namespace, name));
    }

    /// Simulate another writer touching a workload right after each read
    pub fn simulate_concurrent_writer(&self, namespace: &str, name: &str) {
        lock(&self.concurrent_writers).insert(key(namespace, name));
    }

    /// How many times `operation` has been called
    pub fn calls(&self, operation: Operation) -> usize {
        lock(&self.calls).get(&operation).copied().unwrap_or(0)
    }

    fn record(&self, operation: Operation) -> Result<(), ClusterError> {
        *lock(&self.calls).entry(operation).or_insert(0) += 1;
        match lock(&self.failures).get(&operation) {
            Some(message) => Err(ClusterError::Api(message.clone())),
            None => Ok(()),
        }
    }

    fn canonicalize_containers(&self, containers: &mut [Container]) {
        let rewrites = lock(&self.canonical_quantities);
        if rewrites.is_empty() {
            return;
        }
        for container in containers {
            let Some(resources) = container.resources.as_mut() else {
                continue;
            };
            for map in [resources.limits.as_mut(), resources.requests.as_mut()].into_iter().flatten() {
                for value in map.values_mut() {
                    if let Some(canonical) = rewrites.get(&value.0) {
                        *value = Quantity(canonical.clone());
                    }
                }
            }
        }
    }

    fn after_read(&self, key: &Key, meta: &mut ObjectMeta) {
        if lock(&self.concurrent_writers).contains(key) {
            meta.resource_version = Some(self.next_version());
        }
    }

    /// Shared replace semantics: existence, version check, version bump
    fn check_and_bump(stored: Option<&ObjectMeta>, incoming: &ObjectMeta, what: &str, next: String) -> Result<ObjectMeta, ClusterError> {
        let Some(stored) = stored else {
            return Err(ClusterError::NotFound(what.to_string()));
        };
        if let Some(version) = &incoming.resource_version {
            if stored.resource_version.as_ref() != Some(version) {
                return Err(ClusterError::Conflict(format!(
                    "{what}: the object has been modified; please apply your changes to the latest version and try again"
                )));
            }
        }
        let mut meta = incoming.clone();
        meta.resource_version = Some(next);
        Ok(meta)
    }
}

fn name_of(meta: &ObjectMeta, what: &str, namespace: &str) -> Result<String, ClusterError> {
    meta.name
        .clone()
        .ok_or_else(|| ClusterError::InvalidRequest(format!("{what} in {namespace} has no name")))
}

/// Matches `key=value`, `key==value`, `key!=value` and bare `key` terms joined by commas
fn selector_matches(selector: &str, labels: Option<&BTreeMap<String, String>>) -> bool {
    let empty = BTreeMap::new();
    let labels = labels.unwrap_or(&empty);
    selector
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .all(|term| {
            if let Some((k, v)) = term.split_once("!=") {
                labels.get(k.trim()).map(String::as_str) != Some(v.trim())
            } else if let Some((k, v)) = term.split_once("==").or_else(|| term.split_once('=')) {
                labels.get(k.trim()).map(String::as_str) == Some(v.trim())
            } else {
                labels.contains_key(term)
            }
        })
}

#[async_trait::async_trait]
impl ClusterClientTrait for MockClusterClient {
    async fn get_deployment(&self, namespace: &str, name: &str) -> Result<Deployment, ClusterError> {
        self.record(Operation::GetDeployment)?;
        let key = key(namespace, name);
        let mut store = lock(&self.deployments);
        let deployment = store
            .get_mut(&key)
            .ok_or_else(|| ClusterError::NotFound(format!("Deployment {namespace}/{name}")))?;
        let read = deployment.clone();
        self.after_read(&key, &mut deployment.metadata);
        Ok(read)
    }

    async fn replace_deployment(&self, namespace: &str, deployment: &Deployment) -> Result<Deployment, ClusterError> {
        self.record(Operation::ReplaceDeployment)?;
        let name = name_of(&deployment.metadata, "Deployment", namespace)?;
        let key = key(namespace, &name);
        let mut store = lock(&self.deployments);
        let meta = Self::check_and_bump(
            store.get(&key).map(|d| &d.metadata),
            &deployment.metadata,
            &format!("Deployment {namespace}/{name}"),
            self.next_version(),
        )?;

        let mut updated = deployment.clone();
        updated.metadata = meta;
        if let Some(pod_spec) = updated.spec.as_mut().and_then(|s| s.template.spec.as_mut()) {
            self.canonicalize_containers(&mut pod_spec.containers);
        }
        // Rollout status is owned by the controller, not by the writer
        updated.status = store.get(&key).and_then(|d| d.status.clone());
        store.insert(key, updated.clone());
        Ok(updated)
    }

    async fn get_stateful_set(&self, namespace: &str, name: &str) -> Result<StatefulSet, ClusterError> {
        self.record(Operation::GetStatefulSet)?;
        let key = key(namespace, name);
        let mut store = lock(&self.stateful_sets);
        let stateful_set = store
            .get_mut(&key)
            .ok_or_else(|| ClusterError::NotFound(format!("StatefulSet {namespace}/{name}")))?;
        let read = stateful_set.clone();
        self.after_read(&key, &mut stateful_set.metadata);
        Ok(read)
    }

    async fn replace_stateful_set(&self, namespace: &str, stateful_set: &StatefulSet) -> Result<StatefulSet, ClusterError> {
        self.record(Operation::ReplaceStatefulSet)?;
        let name = name_of(&stateful_set.metadata, "StatefulSet", namespace)?;
        let key = key(namespace, &name);
        let mut store = lock(&self.stateful_sets);
        let meta = Self::check_and_bump(
            store.get(&key).map(|s| &s.metadata),
            &stateful_set.metadata,
            &format!("StatefulSet {namespace}/{name}"),
            self.next_version(),
        )?;

        let mut updated = stateful_set.clone();
        updated.metadata = meta;
        if let Some(pod_spec) = updated.spec.as_mut().and_then(|s| s.template.spec.as_mut()) {
            self.canonicalize_containers(&mut pod_spec.containers);
        }
        updated.status = store.get(&key).and_then(|s| s.status.clone());
        store.insert(key, updated.clone());
        Ok(updated)
    }

    async fn list_pods(&self, namespace: &str, label_selector: Option<&str>) -> Result<Vec<Pod>, ClusterError> {
        self.record(Operation::ListPods)?;
        let store = lock(&self.pods);
        Ok(store
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .filter(|(_, pod)| match label_selector {
                Some(selector) => selector_matches(selector, pod.metadata.labels.as_ref()),
                None => true,
            })
            .map(|(_, pod)| pod.clone())
            .collect())
    }

    async fn replace_pod(&self, namespace: &str, pod: &Pod) -> Result<Pod, ClusterError> {
        self.record(Operation::ReplacePod)?;
        let name = name_of(&pod.metadata, "Pod", namespace)?;
        let key = key(namespace, &name);
        if lock(&self.failing_pods).contains(&key) {
            return Err(ClusterError::Api(format!("pods \"{name}\" is forbidden")));
        }
        let mut store = lock(&self.pods);
        let meta = Self::check_and_bump(
            store.get(&key).map(|p| &p.metadata),
            &pod.metadata,
            &format!("Pod {namespace}/{name}"),
            self.next_version(),
        )?;

        let mut updated = pod.clone();
        updated.metadata = meta;
        store.insert(key, updated.clone());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployment(name: &str) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn pod(name: &str, labels: &[(&str, &str)]) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("default".to_string()),
                labels: Some(labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_replace_with_stale_version_conflicts() {
        let mock = MockClusterClient::new();
        mock.add_deployment(deployment("web"));

        let read = mock.get_deployment("default", "web").await.unwrap();
        let first = mock.replace_deployment("default", &read).await.unwrap();
        assert_ne!(first.metadata.resource_version, read.metadata.resource_version);

        let err = mock.replace_deployment("default", &read).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_concurrent_writer_invalidates_read() {
        let mock = MockClusterClient::new();
        mock.add_deployment(deployment("web"));
        mock.simulate_concurrent_writer("default", "web");

        let read = mock.get_deployment("default", "web").await.unwrap();
        let err = mock.replace_deployment("default", &read).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_missing_objects_are_not_found() {
        let mock = MockClusterClient::new();
        assert!(mock.get_deployment("default", "nope").await.unwrap_err().is_not_found());
        assert!(mock.get_stateful_set("default", "nope").await.unwrap_err().is_not_found());
        assert_eq!(mock.calls(Operation::GetDeployment), 1);
    }

    #[tokio::test]
    async fn test_list_pods_filters_by_namespace_and_selector() {
        let mock = MockClusterClient::new();
        mock.add_pod(pod("web-1", &[("app", "web")]));
        mock.add_pod(pod("web-2", &[("app", "other")]));
        mock.add_pod(pod("db-1", &[]));

        let all = mock.list_pods("default", None).await.unwrap();
        assert_eq!(all.len(), 3);

        let web = mock.list_pods("default", Some("app=web")).await.unwrap();
        assert_eq!(web.len(), 1);
        assert_eq!(web[0].metadata.name.as_deref(), Some("web-1"));

        let labelled = mock.list_pods("default", Some("app")).await.unwrap();
        assert_eq!(labelled.len(), 2);

        assert!(mock.list_pods("kube-system", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let mock = MockClusterClient::new();
        mock.fail(Operation::ListPods, "etcdserver: request timed out");

        let err = mock.list_pods("default", None).await.unwrap_err();
        assert!(matches!(err, ClusterError::Api(msg) if msg.contains("timed out")));
    }
}
