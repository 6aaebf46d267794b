//! Validated batch rows

use crate::error::ValidationError;
use crate::kind::WorkloadKind;
use crate::result::ResourceQuantities;
use crate::units::{is_mebibyte_memory, is_milli_cpu};
use serde::{Deserialize, Serialize};

/// Number of columns in a batch row
pub const FIELD_COUNT: usize = 9;

const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "workload",
    "container",
    "kind",
    "namespace",
    "replicas",
    "limits cpu",
    "limits memory",
    "requests cpu",
    "requests memory",
];

/// One validated batch row: the desired replica count and container
/// resources of a single workload.
///
/// Only constructed through [`WorkloadMutationRequest::from_fields`], so every
/// instance satisfies the unit contract (CPU in `m`, memory in `Mi`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadMutationRequest {
    /// 1-based line in the batch input
    pub line: u64,
    /// Workload name
    pub workload: String,
    /// Container to resize
    pub container: String,
    /// Kind declared by the batch
    pub kind: WorkloadKind,
    /// Namespace of the workload
    pub namespace: String,
    /// Desired replica count
    pub replicas: i32,
    /// Desired container limits and requests
    pub resources: ResourceQuantities,
}

impl WorkloadMutationRequest {
    /// Validates the nine raw columns of a batch row.
    ///
    /// Checks run in column order: field count, empty fields, kind, replicas,
    /// then the CPU and memory unit contracts.
    pub fn from_fields<S: AsRef<str>>(line: u64, fields: &[S]) -> Result<Self, ValidationError> {
        if fields.len() != FIELD_COUNT {
            return Err(ValidationError::FieldCount {
                expected: FIELD_COUNT,
                found: fields.len(),
            });
        }

        let fields: Vec<&str> = fields.iter().map(AsRef::as_ref).collect();
        if let Some(index) = fields.iter().position(|f| f.is_empty()) {
            return Err(ValidationError::EmptyField {
                index,
                name: FIELD_NAMES[index],
            });
        }

        let kind: WorkloadKind = fields[2].parse()?;
        let replicas = parse_replicas(fields[4])?;

        for (index, value) in [(5, fields[5]), (7, fields[7])] {
            if !is_milli_cpu(value) {
                return Err(ValidationError::InvalidCpu {
                    field: FIELD_NAMES[index],
                    value: value.to_string(),
                });
            }
        }
        for (index, value) in [(6, fields[6]), (8, fields[8])] {
            if !is_mebibyte_memory(value) {
                return Err(ValidationError::InvalidMemory {
                    field: FIELD_NAMES[index],
                    value: value.to_string(),
                });
            }
        }

        Ok(Self {
            line,
            workload: fields[0].to_string(),
            container: fields[1].to_string(),
            kind,
            namespace: fields[3].to_string(),
            replicas,
            resources: ResourceQuantities {
                limits_cpu: fields[5].to_string(),
                limits_memory: fields[6].to_string(),
                requests_cpu: fields[7].to_string(),
                requests_memory: fields[8].to_string(),
            },
        })
    }
}

fn parse_replicas(value: &str) -> Result<i32, ValidationError> {
    value
        .parse::<u32>()
        .ok()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| ValidationError::InvalidReplicas(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(overrides: &[(usize, &str)]) -> Vec<String> {
        let mut fields: Vec<String> = ["web", "app", "deployment", "default", "3", "500m", "256Mi", "250m", "128Mi"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        for (index, value) in overrides {
            fields[*index] = value.to_string();
        }
        fields
    }

    #[test]
    fn test_valid_row() {
        let request = WorkloadMutationRequest::from_fields(2, &row(&[])).unwrap();
        assert_eq!(request.line, 2);
        assert_eq!(request.workload, "web");
        assert_eq!(request.container, "app");
        assert_eq!(request.kind, WorkloadKind::Deployment);
        assert_eq!(request.namespace, "default");
        assert_eq!(request.replicas, 3);
        assert_eq!(request.resources.limits_cpu, "500m");
        assert_eq!(request.resources.limits_memory, "256Mi");
        assert_eq!(request.resources.requests_cpu, "250m");
        assert_eq!(request.resources.requests_memory, "128Mi");
    }

    #[test]
    fn test_zero_replicas_and_zero_quantities_accepted() {
        let request =
            WorkloadMutationRequest::from_fields(2, &row(&[(4, "0"), (5, "0m"), (6, "0Mi")])).unwrap();
        assert_eq!(request.replicas, 0);
    }

    #[test]
    fn test_field_count() {
        let mut fields = row(&[]);
        fields.pop();
        assert_eq!(
            WorkloadMutationRequest::from_fields(2, &fields),
            Err(ValidationError::FieldCount { expected: 9, found: 8 })
        );
        fields.push("128Mi".to_string());
        fields.push("extra".to_string());
        assert!(matches!(
            WorkloadMutationRequest::from_fields(2, &fields),
            Err(ValidationError::FieldCount { found: 10, .. })
        ));
    }

    #[test]
    fn test_empty_field() {
        assert_eq!(
            WorkloadMutationRequest::from_fields(2, &row(&[(1, "")])),
            Err(ValidationError::EmptyField { index: 1, name: "container" })
        );
    }

    #[test]
    fn test_invalid_replicas() {
        for value in ["three", "-1", "2.5", "99999999999"] {
            assert_eq!(
                WorkloadMutationRequest::from_fields(2, &row(&[(4, value)])),
                Err(ValidationError::InvalidReplicas(value.to_string()))
            );
        }
    }

    #[test]
    fn test_unit_contract() {
        assert!(matches!(
            WorkloadMutationRequest::from_fields(2, &row(&[(7, "1")])),
            Err(ValidationError::InvalidCpu { field: "requests cpu", .. })
        ));
        assert!(matches!(
            WorkloadMutationRequest::from_fields(2, &row(&[(6, "1Gi")])),
            Err(ValidationError::InvalidMemory { field: "limits memory", .. })
        ));
    }

    #[test]
    fn test_unknown_kind() {
        assert_eq!(
            WorkloadMutationRequest::from_fields(2, &row(&[(2, "daemonset")])),
            Err(ValidationError::UnknownKind("daemonset".to_string()))
        );
    }
}
