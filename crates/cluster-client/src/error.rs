//! Cluster client errors

use thiserror::Error;

/// Errors that can occur when talking to the Kubernetes API
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Transport, decoding or unclassified API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// kubeconfig could not be loaded
    #[error("kubeconfig error: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    /// The API server rejected the request
    #[error("Kubernetes API error: {0}")]
    Api(String),

    /// Object does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Object changed since it was read (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request cannot be sent (e.g. object without a name)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClusterError {
    /// Classifies a kube error for the object described by `what`
    pub fn from_kube(err: kube::Error, what: &str) -> Self {
        match err {
            kube::Error::Api(response) if response.code == 404 => {
                ClusterError::NotFound(format!("{what}: {}", response.message))
            }
            kube::Error::Api(response) if response.code == 409 => {
                ClusterError::Conflict(format!("{what}: {}", response.message))
            }
            other => ClusterError::Kube(other),
        }
    }

    /// True for HTTP 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound(_))
    }

    /// True for HTTP 409
    pub fn is_conflict(&self) -> bool {
        matches!(self, ClusterError::Conflict(_))
    }
}
