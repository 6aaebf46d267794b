//! Tuner-specific error types.
//!
//! Cluster access errors come from `cluster_client`; this module adds the
//! conditions that only make sense while reconciling a workload.

use cluster_client::ClusterError;
use thiserror::Error;
use tuning_model::WorkloadKind;

/// Errors that can occur while reconciling one workload.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Cluster API error
    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),

    /// Neither a Deployment nor a StatefulSet has this name
    #[error("No Deployment or StatefulSet named {name} in namespace {namespace}")]
    WorkloadNotFound { name: String, namespace: String },

    /// The workload changed between fetch and write-back
    #[error("{kind} {namespace}/{name} was modified concurrently; change not applied")]
    ConcurrentModification {
        kind: WorkloadKind,
        name: String,
        namespace: String,
    },

    /// No pod carries the tracking label
    #[error("No pod in {namespace} matches {selector}; label may be missing, handle manually")]
    LabelMissing { namespace: String, selector: String },

    /// The representative pod has no QoS class in its status
    #[error("Pod {0} does not report a QoS class")]
    QosNotReported(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
