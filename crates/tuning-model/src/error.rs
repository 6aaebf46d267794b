//! Batch row validation errors

use thiserror::Error;

/// Reasons a batch row is rejected before any cluster call is made
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Row does not have exactly the expected number of columns
    #[error("expected {expected} fields per line, found {found}")]
    FieldCount {
        /// Required column count
        expected: usize,
        /// Column count actually present
        found: usize,
    },

    /// A column is empty
    #[error("empty value in field {index} ({name})")]
    EmptyField {
        /// Zero-based column index
        index: usize,
        /// Column name
        name: &'static str,
    },

    /// Replica column is not a non-negative integer
    #[error("replicas must be a non-negative integer, got '{0}'")]
    InvalidReplicas(String),

    /// Kind column names neither a Deployment nor a StatefulSet
    #[error("unsupported workload kind '{0}' (expected deployment or statefulset)")]
    UnknownKind(String),

    /// CPU limit/request is not expressed in milli-units
    #[error("{field} should be in milli-units (suffix 'm'), got '{value}'")]
    InvalidCpu {
        /// Column name
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// Memory limit/request is not expressed in mebibytes
    #[error("{field} should be in mebibytes (suffix 'Mi'), got '{value}'")]
    InvalidMemory {
        /// Column name
        field: &'static str,
        /// Offending value
        value: String,
    },
}
