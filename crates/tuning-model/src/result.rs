//! Per-row reconciliation results

use crate::kind::WorkloadKind;
use crate::request::WorkloadMutationRequest;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Limits and requests of one container
///
/// Missing entries are represented by empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceQuantities {
    /// CPU limit
    pub limits_cpu: String,
    /// Memory limit
    pub limits_memory: String,
    /// CPU request
    pub requests_cpu: String,
    /// Memory request
    pub requests_memory: String,
}

/// Rollout availability of a workload at fetch time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Availability {
    /// Every replica is available/ready
    Available,
    /// Some, but not all, replicas are available/ready
    PartiallyAvailable,
    /// No replica is available/ready
    NotAvailable,
}

impl Availability {
    /// Classifies `up` (available or ready) replicas out of `total`
    pub fn from_counts(up: i32, total: i32) -> Self {
        if up == total {
            Availability::Available
        } else if up > 0 {
            Availability::PartiallyAvailable
        } else {
            Availability::NotAvailable
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => f.write_str("Available"),
            Availability::PartiallyAvailable => f.write_str("Partial Available"),
            Availability::NotAvailable => f.write_str("Not Available"),
        }
    }
}

/// Whether the requested change is confirmed on the live object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Outcome {
    /// Every requested field was read back with the requested value
    Success,
    /// An API call failed or a field did not match
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => f.write_str("Success"),
            Outcome::Failed => f.write_str("Failed"),
        }
    }
}

/// One row of output, created once at the end of a reconciliation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    /// When the pass finished
    pub timestamp: DateTime<Local>,
    /// Workload name
    pub workload: String,
    /// Container name
    pub container: String,
    /// Resolved kind (the declared kind when resolution never happened)
    pub kind: WorkloadKind,
    /// Namespace
    pub namespace: String,
    /// Replica count before the change, when the object was fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_replicas: Option<i32>,
    /// Requested replica count
    pub desired_replicas: i32,
    /// Container resources before the change, when the object was fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<ResourceQuantities>,
    /// Requested container resources
    pub desired: ResourceQuantities,
    /// QoS class of a labelled pod
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qos_class: Option<String>,
    /// Availability at fetch time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
    /// Verification outcome
    pub outcome: Outcome,
    /// Why the row failed, if it failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReconciliationResult {
    /// Minimal failed record for a row aborted by an API error.
    ///
    /// Carries the request's identity and desired values only; callers fill
    /// in whatever current state they already know.
    pub fn failed(request: &WorkloadMutationRequest, kind: WorkloadKind, error: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            workload: request.workload.clone(),
            container: request.container.clone(),
            kind,
            namespace: request.namespace.clone(),
            current_replicas: None,
            desired_replicas: request.replicas,
            current: None,
            desired: request.resources.clone(),
            qos_class: None,
            availability: None,
            outcome: Outcome::Failed,
            error: Some(error.into()),
        }
    }

    /// True when the row's change was confirmed
    pub fn succeeded(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_from_counts() {
        assert_eq!(Availability::from_counts(3, 3), Availability::Available);
        assert_eq!(Availability::from_counts(0, 0), Availability::Available);
        assert_eq!(Availability::from_counts(1, 3), Availability::PartiallyAvailable);
        assert_eq!(Availability::from_counts(0, 3), Availability::NotAvailable);
    }

    #[test]
    fn test_failed_record_serializes_without_current_state() {
        let request = WorkloadMutationRequest::from_fields(
            2,
            &["web", "app", "deployment", "default", "3", "500m", "256Mi", "250m", "128Mi"],
        )
        .unwrap();
        let result = ReconciliationResult::failed(&request, WorkloadKind::Deployment, "boom");

        assert!(!result.succeeded());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"], "Failed");
        assert_eq!(json["desiredReplicas"], 3);
        assert_eq!(json["desired"]["limitsCpu"], "500m");
        assert_eq!(json["error"], "boom");
        assert!(json.get("currentReplicas").is_none());
        assert!(json.get("qosClass").is_none());
    }
}
