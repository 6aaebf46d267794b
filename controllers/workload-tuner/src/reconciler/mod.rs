//! Workload reconciliation.
//!
//! One pass per batch row:
//! `ResolvingKind → Fetching → Mutating → WritingBack → Verifying →
//! ReconcilingLabels → ResolvingQos → Done`.
//!
//! - `discovery`: owner-reference pod scan
//! - `labels`: tracking label convergence
//! - `mutator`: in-memory replica/resource changes
//! - `qos`: QoS class lookup
//! - `verifier`: comparison of read-back objects with the request
//! - `workload`: Deployment/StatefulSet wrapper

pub mod discovery;
pub mod labels;
pub mod mutator;
pub mod qos;
pub mod verifier;
pub mod workload;


use crate::config::TunerConfig;
use crate::error::ReconcileError;
use chrono::Local;
use cluster_client::{ClusterClientTrait, ClusterError};
use std::fmt;
use tracing::{Instrument, debug, info, info_span, warn};
use tuning_model::{Outcome, ReconciliationResult, WorkloadKind, WorkloadMutationRequest};
use verifier::VerificationReport;
use workload::LiveWorkload;

/// Stage of a reconciliation pass, recorded on log events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ResolvingKind,
    Fetching,
    Mutating,
    WritingBack,
    Verifying,
    ReconcilingLabels,
    ResolvingQos,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::ResolvingKind => "resolving-kind",
            Phase::Fetching => "fetching",
            Phase::Mutating => "mutating",
            Phase::WritingBack => "writing-back",
            Phase::Verifying => "verifying",
            Phase::ReconcilingLabels => "reconciling-labels",
            Phase::ResolvingQos => "resolving-qos",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Reconciles workloads against batch rows.
pub struct Reconciler {
    pub(crate) cluster: Box<dyn ClusterClientTrait + Send + Sync>,
    pub(crate) config: TunerConfig,
}

impl Reconciler {
    pub fn new(cluster: Box<dyn ClusterClientTrait + Send + Sync>, config: TunerConfig) -> Self {
        Self { cluster, config }
    }

    /// Runs one full pass for `request`.
    ///
    /// Returns `Err(ReconcileError::WorkloadNotFound)` when neither kind
    /// exists; the row produces no result. Every other failure is folded into
    /// a `Failed` result.
    pub async fn reconcile(&self, request: &WorkloadMutationRequest) -> Result<ReconciliationResult, ReconcileError> {
        let span = info_span!(
            "reconcile",
            workload = %request.workload,
            namespace = %request.namespace,
            line = request.line,
        );
        self.reconcile_inner(request).instrument(span).await
    }

    async fn reconcile_inner(&self, request: &WorkloadMutationRequest) -> Result<ReconciliationResult, ReconcileError> {
        debug!(phase = %Phase::ResolvingKind, "Resolving workload kind");
        let mut live = match self.resolve(&request.namespace, &request.workload).await {
            Ok(live) => live,
            Err(ReconcileError::WorkloadNotFound { name, namespace }) => {
                warn!("Workload not found as Deployment or StatefulSet, skipping row");
                return Err(ReconcileError::WorkloadNotFound { name, namespace });
            }
            Err(e) => {
                warn!(phase = %Phase::Fetching, error = %e, "Failed to fetch workload");
                return Ok(ReconciliationResult::failed(request, request.kind, e.to_string()));
            }
        };

        let kind = live.kind();
        if kind != request.kind {
            warn!(declared = %request.kind, resolved = %kind, "Declared kind differs from the cluster, using the resolved kind");
        }

        debug!(phase = %Phase::Fetching, resource_version = ?live.resource_version(), "Fetched workload");
        let current_replicas = live.replicas();
        let current = live.container_resources(&request.container);
        let availability = live.availability();
        let failed = |error: String| {
            let mut result = ReconciliationResult::failed(request, kind, error);
            result.current_replicas = Some(current_replicas);
            result.current = current.clone();
            result.availability = Some(availability);
            result
        };

        debug!(phase = %Phase::Mutating, "Applying requested replicas and resources");
        if !mutator::apply_mutation(&mut live, request) {
            warn!(container = %request.container, "Container not found in pod template, only replicas will change");
        }

        debug!(phase = %Phase::WritingBack, "Replacing workload");
        let written = match self.write_back(&request.namespace, &live).await {
            Ok(written) => written,
            Err(e) => {
                warn!(phase = %Phase::WritingBack, error = %e, "Write-back failed");
                return Ok(failed(e.to_string()));
            }
        };

        debug!(phase = %Phase::Verifying, "Verifying written object");
        let report = self.verify(&written, request).await;
        let (outcome, error) = if report.passed() {
            info!(
                replicas = %format!("{} -> {}", current_replicas, request.replicas),
                "Workload updated and verified"
            );
            (Outcome::Success, None)
        } else {
            warn!(mismatches = %report, "Verification failed");
            (Outcome::Failed, Some(format!("verification failed: {report}")))
        };

        debug!(phase = %Phase::ReconcilingLabels, "Reconciling tracking labels");
        self.reconcile_labels(request).await;

        debug!(phase = %Phase::ResolvingQos, "Resolving QoS class");
        let qos_class = match qos::resolve_qos(
            self.cluster.as_ref(),
            &request.namespace,
            &self.config.label_key,
            &request.workload,
        )
        .await
        {
            Ok(class) => Some(class),
            Err(e) => {
                warn!(error = %e, "Could not resolve QoS class");
                None
            }
        };

        debug!(phase = %Phase::Done, outcome = %outcome, "Reconciliation finished");
        Ok(ReconciliationResult {
            timestamp: Local::now(),
            workload: request.workload.clone(),
            container: request.container.clone(),
            kind,
            namespace: request.namespace.clone(),
            current_replicas: Some(current_replicas),
            desired_replicas: request.replicas,
            current,
            desired: request.resources.clone(),
            qos_class,
            availability: Some(availability),
            outcome,
            error,
        })
    }

    /// Deployment first, then StatefulSet
    async fn resolve(&self, namespace: &str, name: &str) -> Result<LiveWorkload, ReconcileError> {
        match self.cluster.get_deployment(namespace, name).await {
            Ok(deployment) => return Ok(deployment.into()),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }
        match self.cluster.get_stateful_set(namespace, name).await {
            Ok(stateful_set) => Ok(stateful_set.into()),
            Err(e) if e.is_not_found() => Err(ReconcileError::WorkloadNotFound {
                name: name.to_string(),
                namespace: namespace.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch(&self, kind: WorkloadKind, namespace: &str, name: &str) -> Result<LiveWorkload, ClusterError> {
        Ok(match kind {
            WorkloadKind::Deployment => self.cluster.get_deployment(namespace, name).await?.into(),
            WorkloadKind::StatefulSet => self.cluster.get_stateful_set(namespace, name).await?.into(),
        })
    }

    /// Whole-object replace carrying the fetched resource version
    async fn write_back(&self, namespace: &str, live: &LiveWorkload) -> Result<LiveWorkload, ReconcileError> {
        let result = match live {
            LiveWorkload::Deployment(d) => self.cluster.replace_deployment(namespace, d).await.map(LiveWorkload::from),
            LiveWorkload::StatefulSet(s) => self.cluster.replace_stateful_set(namespace, s).await.map(LiveWorkload::from),
        };
        result.map_err(|e| {
            if e.is_conflict() {
                ReconcileError::ConcurrentModification {
                    kind: live.kind(),
                    name: live.name().to_string(),
                    namespace: namespace.to_string(),
                }
            } else {
                e.into()
            }
        })
    }

    /// Checks the write-back response and an independent re-read
    async fn verify(&self, written: &LiveWorkload, request: &WorkloadMutationRequest) -> VerificationReport {
        let mode = self.config.verification;
        let mut report = verifier::verify(Some(written), request, mode);
        if !report.passed() {
            return report;
        }

        match self.fetch(written.kind(), &request.namespace, &request.workload).await {
            Ok(reread) => report = verifier::verify(Some(&reread), request, mode),
            Err(e) => {
                warn!(error = %e, "Re-read after write-back failed");
                report = verifier::verify(None, request, mode);
            }
        }
        report
    }

    async fn reconcile_labels(&self, request: &WorkloadMutationRequest) {
        let pods = match discovery::discover_owned_pods(
            self.cluster.as_ref(),
            &request.namespace,
            &request.workload,
            self.config.discovery_concurrency,
        )
        .await
        {
            Ok(pods) => pods,
            Err(e) => {
                warn!(error = %e, "Pod discovery failed, labels not reconciled");
                return;
            }
        };

        let report = labels::reconcile_labels(
            self.cluster.as_ref(),
            &request.namespace,
            &self.config.label_key,
            &request.workload,
            &pods,
        )
        .await;
        debug!(
            pods = pods.len(),
            labelled = report.labelled.len(),
            relabelled = report.relabelled.len(),
            unchanged = report.unchanged.len(),
            failed = report.failed.len(),
            "Tracking labels reconciled"
        );
        if !report.is_converged() {
            warn!(failed = report.failed.len(), "Some pods could not be labelled");
        }
    }
}
