//! Batch file reading.
//!
//! A batch is a CSV file: one header line, then one row of nine fields per
//! workload. Invalid rows are kept as rejections so they can be reported
//! with their line number; they never stop the batch.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::warn;
use tuning_model::{ValidationError, WorkloadMutationRequest};

/// A row that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub line: u64,
    pub error: ValidationError,
}

/// One data row of a batch file
pub type BatchRow = std::result::Result<WorkloadMutationRequest, RejectedRow>;

/// Parses batch rows from any reader.
///
/// Fails only when the input itself cannot be read (I/O or encoding errors).
pub fn parse_batch<R: Read>(reader: R) -> Result<Vec<BatchRow>> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record.context("failed to read batch row")?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let fields: Vec<&str> = record.iter().collect();

        match WorkloadMutationRequest::from_fields(line, &fields) {
            Ok(request) => rows.push(Ok(request)),
            Err(error) => {
                warn!(line, error = %error, "Rejected batch row");
                rows.push(Err(RejectedRow { line, error }));
            }
        }
    }
    Ok(rows)
}

/// Reads and parses a batch file
pub fn read_batch(path: &Path) -> Result<Vec<BatchRow>> {
    let file = File::open(path).with_context(|| format!("failed to open batch file {}", path.display()))?;
    parse_batch(file).with_context(|| format!("failed to parse batch file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "workload,container,kind,namespace,replicas,limits_cpu,limits_memory,requests_cpu,requests_memory\n";

    fn parse(body: &str) -> Vec<BatchRow> {
        parse_batch(format!("{HEADER}{body}").as_bytes()).unwrap()
    }

    #[test]
    fn test_valid_row() {
        let rows = parse("web,app,deployment,default,3,500m,256Mi,250m,128Mi\n");

        assert_eq!(rows.len(), 1);
        let request = rows[0].as_ref().unwrap();
        assert_eq!(request.line, 2);
        assert_eq!(request.workload, "web");
        assert_eq!(request.replicas, 3);
        assert_eq!(request.resources.requests_cpu, "250m");
    }

    #[test]
    fn test_fields_are_trimmed() {
        let rows = parse(" web , app , STS , prod , 1 , 100m , 64Mi , 50m , 32Mi \n");
        let request = rows[0].as_ref().unwrap();

        assert_eq!(request.workload, "web");
        assert_eq!(request.namespace, "prod");
        assert_eq!(request.kind, tuning_model::WorkloadKind::StatefulSet);
    }

    #[test]
    fn test_invalid_rows_are_rejected_with_line_numbers() {
        let rows = parse(
            "web,app,deployment,default,3,500m,256Mi,250m,128Mi\n\
             short,row\n\
             api,app,deployment,default,2,0.5,256Mi,250m,128Mi\n\
             db,pg,statefulset,default,1,1000m,1Gi,500m,512Mi\n\
             job,app,cronjob,default,1,100m,64Mi,50m,32Mi\n\
             neg,app,deployment,default,-1,100m,64Mi,50m,32Mi\n",
        );

        assert_eq!(rows.len(), 6);
        assert!(rows[0].is_ok());
        let rejected: Vec<(u64, &ValidationError)> =
            rows.iter().filter_map(|r| r.as_ref().err()).map(|r| (r.line, &r.error)).collect();
        assert_eq!(rejected.len(), 5);
        assert_eq!(rejected[0].0, 3);
        assert!(matches!(rejected[0].1, ValidationError::FieldCount { found: 2, .. }));
        assert!(matches!(rejected[1].1, ValidationError::InvalidCpu { .. }));
        assert!(matches!(rejected[2].1, ValidationError::InvalidMemory { .. }));
        assert!(matches!(rejected[3].1, ValidationError::UnknownKind(_)));
        assert!(matches!(rejected[4].1, ValidationError::InvalidReplicas(_)));
        assert_eq!(rejected[4].0, 7);
    }

    #[test]
    fn test_header_only_is_empty() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = read_batch(Path::new("/nonexistent/cops/batch.csv")).unwrap_err();
        assert!(err.to_string().contains("failed to open batch file"));
    }
}
