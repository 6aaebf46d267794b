//! Batch controller.
//!
//! Drives validated rows through the reconciler one at a time and collects
//! the results into a `BatchSummary`.

use crate::config::TunerConfig;
use crate::error::ReconcileError;
use crate::input::BatchRow;
use crate::reconciler::Reconciler;
use cluster_client::ClusterClientTrait;
use serde::Serialize;
use tracing::{Instrument, error, info, info_span, warn};
use tuning_model::ReconciliationResult;
use uuid::Uuid;

/// Exit status when every row succeeded
pub const EXIT_OK: u8 = 0;
/// Exit status when a row was rejected, unresolved or failed
pub const EXIT_ROW_FAILURES: u8 = 2;

/// Results of one batch run
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// One record per reconciled row, in input order
    pub results: Vec<ReconciliationResult>,
    /// Rows dropped by validation
    pub rejected: usize,
    /// Rows whose workload does not exist
    pub unresolved: usize,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn has_failures(&self) -> bool {
        self.rejected > 0 || self.unresolved > 0 || self.failed() > 0
    }

    /// Process exit status for this batch
    pub fn exit_status(&self, ignore_failures: bool) -> u8 {
        if self.has_failures() && !ignore_failures {
            EXIT_ROW_FAILURES
        } else {
            EXIT_OK
        }
    }
}

/// Runs batches against one cluster.
pub struct Controller {
    reconciler: Reconciler,
}

impl Controller {
    /// Creates a new controller instance.
    pub fn new(cluster: Box<dyn ClusterClientTrait + Send + Sync>, config: TunerConfig) -> Self {
        Self {
            reconciler: Reconciler::new(cluster, config),
        }
    }

    /// Processes `rows` sequentially. Never aborts: every row is isolated.
    pub async fn run(&self, rows: Vec<BatchRow>) -> BatchSummary {
        let run_id = Uuid::new_v4();
        let span = info_span!("batch", %run_id);
        self.run_rows(rows).instrument(span).await
    }

    async fn run_rows(&self, rows: Vec<BatchRow>) -> BatchSummary {
        info!(rows = rows.len(), "Starting batch");
        let mut summary = BatchSummary::default();

        for row in rows {
            let request = match row {
                Ok(request) => request,
                Err(_) => {
                    summary.rejected += 1;
                    continue;
                }
            };

            match self.reconciler.reconcile(&request).await {
                Ok(result) => summary.results.push(result),
                Err(ReconcileError::WorkloadNotFound { .. }) => summary.unresolved += 1,
                Err(e) => {
                    // reconcile folds everything else into a Failed row
                    error!(line = request.line, error = %e, "Unexpected reconcile error");
                    summary
                        .results
                        .push(ReconciliationResult::failed(&request, request.kind, e.to_string()));
                }
            }
        }

        if summary.has_failures() {
            warn!(
                succeeded = summary.succeeded(),
                failed = summary.failed(),
                rejected = summary.rejected,
                unresolved = summary.unresolved,
                "Batch finished with failures"
            );
        } else {
            info!(succeeded = summary.succeeded(), "Batch finished");
        }
        summary
    }
}
