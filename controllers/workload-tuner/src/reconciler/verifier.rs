//! Post-mutation verifier.
//!
//! Checks that an object read back from the cluster carries the requested
//! replica count and container quantities. Every mismatching field is
//! reported so the reconciler can log exactly what did not stick.

use super::workload::LiveWorkload;
use clap::ValueEnum;
use std::fmt;
use tuning_model::WorkloadMutationRequest;
use tuning_model::quantity::same_amount;

/// How quantities are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum VerificationMode {
    /// Strings must match exactly ("1000m" differs from "1")
    #[default]
    Literal,
    /// Quantities must denote the same amount ("1000m" equals "1")
    Semantic,
}

/// One field whose observed value differs from the requested one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMismatch {
    pub field: &'static str,
    pub expected: String,
    pub actual: String,
}

/// Outcome of comparing one observed object with a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub mismatches: Vec<FieldMismatch>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    fn mismatch(&mut self, field: &'static str, expected: impl Into<String>, actual: impl Into<String>) {
        self.mismatches.push(FieldMismatch {
            field,
            expected: expected.into(),
            actual: actual.into(),
        });
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, m) in self.mismatches.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: expected {:?}, got {:?}", m.field, m.expected, m.actual)?;
        }
        Ok(())
    }
}

/// Compares `observed` with `request`.
///
/// An absent object or an absent container is itself a mismatch.
pub fn verify(observed: Option<&LiveWorkload>, request: &WorkloadMutationRequest, mode: VerificationMode) -> VerificationReport {
    let mut report = VerificationReport::default();

    let Some(workload) = observed else {
        report.mismatch("object", "present", "absent");
        return report;
    };

    let replicas = workload.replicas();
    if replicas != request.replicas {
        report.mismatch("replicas", request.replicas.to_string(), replicas.to_string());
    }

    let Some(actual) = workload.container_resources(&request.container) else {
        report.mismatch("container", request.container.clone(), "absent");
        return report;
    };

    let desired = &request.resources;
    let fields = [
        ("limits.cpu", &desired.limits_cpu, &actual.limits_cpu),
        ("limits.memory", &desired.limits_memory, &actual.limits_memory),
        ("requests.cpu", &desired.requests_cpu, &actual.requests_cpu),
        ("requests.memory", &desired.requests_memory, &actual.requests_memory),
    ];
    for (field, expected, actual) in fields {
        let matches = match mode {
            VerificationMode::Literal => expected == actual,
            VerificationMode::Semantic => same_amount(expected, actual),
        };
        if !matches {
            report.mismatch(field, expected.as_str(), actual.as_str());
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn observed(replicas: i32, limits_cpu: &str) -> LiveWorkload {
        LiveWorkload::from(create_test_deployment(
            "web",
            "default",
            replicas,
            &[("app", limits_cpu, "256Mi", "250m", "128Mi")],
        ))
    }

    fn request() -> WorkloadMutationRequest {
        create_test_request("web", "app", "deployment", "3", "1000m", "256Mi", "250m", "128Mi")
    }

    #[test]
    fn test_exact_match_passes() {
        let report = verify(Some(&observed(3, "1000m")), &request(), VerificationMode::Literal);
        assert!(report.passed(), "{report}");
    }

    #[test]
    fn test_literal_mode_rejects_canonicalized_quantity() {
        let report = verify(Some(&observed(3, "1")), &request(), VerificationMode::Literal);

        assert!(!report.passed());
        assert_eq!(
            report.mismatches,
            vec![FieldMismatch {
                field: "limits.cpu",
                expected: "1000m".to_string(),
                actual: "1".to_string(),
            }]
        );
    }

    #[test]
    fn test_semantic_mode_accepts_canonicalized_quantity() {
        let report = verify(Some(&observed(3, "1")), &request(), VerificationMode::Semantic);
        assert!(report.passed(), "{report}");
    }

    #[test]
    fn test_semantic_mode_rejects_amounts_it_cannot_compare() {
        let report = verify(Some(&observed(3, "1e400")), &request(), VerificationMode::Semantic);
        assert!(!report.passed());
        assert_eq!(report.mismatches[0].field, "limits.cpu");

        let report = verify(Some(&observed(3, "0e400")), &request(), VerificationMode::Semantic);
        assert!(!report.passed());
    }

    #[test]
    fn test_replica_mismatch_is_reported() {
        let report = verify(Some(&observed(2, "1000m")), &request(), VerificationMode::Literal);

        assert_eq!(report.mismatches.len(), 1);
        assert_eq!(report.mismatches[0].field, "replicas");
        assert_eq!(report.to_string(), "replicas: expected \"3\", got \"2\"");
    }

    #[test]
    fn test_absent_object_fails() {
        let report = verify(None, &request(), VerificationMode::Semantic);
        assert!(!report.passed());
        assert_eq!(report.mismatches[0].field, "object");
    }

    #[test]
    fn test_absent_container_fails() {
        let request = create_test_request("web", "worker", "deployment", "3", "1000m", "256Mi", "250m", "128Mi");
        let report = verify(Some(&observed(3, "1000m")), &request, VerificationMode::Literal);

        assert!(!report.passed());
        assert_eq!(report.mismatches[0].field, "container");
    }
}
