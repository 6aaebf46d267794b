//! Pod discovery.
//!
//! Pods are matched to a workload through their owner references: a pod
//! belongs to workload `web` when one of its owners is named `web-…` (the
//! ReplicaSet of a Deployment) or is the StatefulSet `web` itself.
//!
//! The namespace is listed once and every pod is scanned on its own task.
//! A semaphore caps how many scans run at a time; matches are funnelled into
//! one channel whose receiver ends once every task has dropped its sender.

use crate::error::ReconcileError;
use cluster_client::ClusterClientTrait;
use k8s_openapi::api::core::v1::Pod;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// True when one of the pod's owner references points at `workload`
fn is_owned_by(pod: &Pod, workload: &str, prefix: &str) -> bool {
    pod.metadata
        .owner_references
        .iter()
        .flatten()
        .any(|owner| owner.name.starts_with(prefix) || (owner.kind == "StatefulSet" && owner.name == workload))
}

/// Pods of `workload` in `namespace`, sorted by name.
///
/// Returns an empty list (and logs a warning) when no Deployment or
/// StatefulSet of that name exists.
pub async fn discover_owned_pods(
    cluster: &dyn ClusterClientTrait,
    namespace: &str,
    workload: &str,
    concurrency: usize,
) -> Result<Vec<Pod>, ReconcileError> {
    if !workload_exists(cluster, namespace, workload).await? {
        warn!(workload, namespace, "No Deployment or StatefulSet with this name, skipping pod discovery");
        return Ok(Vec::new());
    }

    let pods = cluster.list_pods(namespace, None).await?;
    debug!(workload, namespace, pods = pods.len(), "Scanning pods for owner references");
    Ok(scan_owned_pods(pods, workload, concurrency).await)
}

async fn workload_exists(cluster: &dyn ClusterClientTrait, namespace: &str, name: &str) -> Result<bool, ReconcileError> {
    match cluster.get_deployment(namespace, name).await {
        Ok(_) => return Ok(true),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e.into()),
    }
    match cluster.get_stateful_set(namespace, name).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Concurrent owner-reference scan over an already listed set of pods.
///
/// At most `concurrency` scans (minimum 1) are in flight at once. The result
/// holds each matching pod once, sorted by name.
pub async fn scan_owned_pods(pods: Vec<Pod>, workload: &str, concurrency: usize) -> Vec<Pod> {
    let prefix: Arc<str> = Arc::from(format!("{workload}-"));
    let workload: Arc<str> = Arc::from(workload);
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let (tx, mut rx) = mpsc::unbounded_channel::<Pod>();
    let mut tasks = JoinSet::new();

    for pod in pods {
        // The semaphore is never closed, so acquiring only fails if that changes
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };
        let tx = tx.clone();
        let prefix = Arc::clone(&prefix);
        let workload = Arc::clone(&workload);
        tasks.spawn(async move {
            let _permit = permit;
            if is_owned_by(&pod, &workload, &prefix) {
                // Receiver outlives every task
                let _ = tx.send(pod);
            }
        });
    }
    drop(tx);

    let mut owned = BTreeMap::new();
    while let Some(pod) = rx.recv().await {
        let name = pod.metadata.name.clone().unwrap_or_default();
        owned.entry(name).or_insert(pod);
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(workload = %workload, error = %e, "Pod scan task failed");
        }
    }

    owned.into_values().collect()
}
