//! Tracking label reconciliation.
//!
//! Every pod of a workload should carry `<label key>=<workload name>`.
//! Pass one adds the label where it is missing or empty, pass two overwrites
//! it where it holds another value. Both passes work on the same discovery
//! snapshot and each write is an independent replace.

use cluster_client::ClusterClientTrait;
use k8s_openapi::api::core::v1::Pod;
use tracing::{info, warn};

/// What happened to each discovered pod
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelReport {
    /// Pods that had no label and got one
    pub labelled: Vec<String>,
    /// Pods whose label held a different value
    pub relabelled: Vec<String>,
    /// Pods already carrying the right value
    pub unchanged: Vec<String>,
    /// Pods whose write failed, with the error
    pub failed: Vec<(String, String)>,
}

impl LabelReport {
    pub fn is_converged(&self) -> bool {
        self.failed.is_empty()
    }
}

enum LabelState {
    Missing,
    Wrong,
    Correct,
}

fn label_state(pod: &Pod, key: &str, value: &str) -> LabelState {
    match pod.metadata.labels.as_ref().and_then(|labels| labels.get(key)) {
        None => LabelState::Missing,
        Some(current) if current.is_empty() => LabelState::Missing,
        Some(current) if current == value => LabelState::Correct,
        Some(_) => LabelState::Wrong,
    }
}

async fn write_label(cluster: &dyn ClusterClientTrait, namespace: &str, pod: &Pod, key: &str, value: &str) -> Result<(), String> {
    let mut updated = pod.clone();
    updated
        .metadata
        .labels
        .get_or_insert_with(Default::default)
        .insert(key.to_string(), value.to_string());
    cluster
        .replace_pod(namespace, &updated)
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Converges the tracking label on `pods`.
///
/// Failed writes are logged and recorded; they never stop the pass.
pub async fn reconcile_labels(
    cluster: &dyn ClusterClientTrait,
    namespace: &str,
    label_key: &str,
    workload: &str,
    pods: &[Pod],
) -> LabelReport {
    let mut report = LabelReport::default();
    let name_of = |pod: &Pod| pod.metadata.name.clone().unwrap_or_default();

    // Pass one: missing label
    for pod in pods.iter().filter(|p| matches!(label_state(p, label_key, workload), LabelState::Missing)) {
        let name = name_of(pod);
        match write_label(cluster, namespace, pod, label_key, workload).await {
            Ok(()) => {
                info!(pod = %name, namespace, label = label_key, value = workload, "Added tracking label");
                report.labelled.push(name);
            }
            Err(e) => {
                warn!(pod = %name, namespace, error = %e, "Failed to add tracking label");
                report.failed.push((name, e));
            }
        }
    }

    // Pass two: wrong value
    for pod in pods.iter().filter(|p| matches!(label_state(p, label_key, workload), LabelState::Wrong)) {
        let name = name_of(pod);
        match write_label(cluster, namespace, pod, label_key, workload).await {
            Ok(()) => {
                info!(pod = %name, namespace, label = label_key, value = workload, "Corrected tracking label");
                report.relabelled.push(name);
            }
            Err(e) => {
                warn!(pod = %name, namespace, error = %e, "Failed to correct tracking label");
                report.failed.push((name, e));
            }
        }
    }

    report.unchanged = pods
        .iter()
        .filter(|p| matches!(label_state(p, label_key, workload), LabelState::Correct))
        .map(name_of)
        .collect();

    report
}
