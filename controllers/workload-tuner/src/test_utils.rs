//! Test utilities for unit testing the reconciler
//!
//! This module provides helpers for creating workload, pod and request
//! fixtures and for wiring a `Reconciler` to a `MockClusterClient`.

use crate::config::TunerConfig;
use crate::reconciler::Reconciler;
use cluster_client::MockClusterClient;
use k8s_openapi::api::apps::v1::{
    Deployment, DeploymentSpec, DeploymentStatus, StatefulSet, StatefulSetSpec, StatefulSetStatus,
};
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, PodStatus, PodTemplateSpec, ResourceRequirements};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};
use tuning_model::WorkloadMutationRequest;

/// (name, limits cpu, limits memory, requests cpu, requests memory)
pub type ContainerFixture<'a> = (&'a str, &'a str, &'a str, &'a str, &'a str);

fn quantities(cpu: &str, memory: &str) -> BTreeMap<String, Quantity> {
    BTreeMap::from([
        ("cpu".to_string(), Quantity(cpu.to_string())),
        ("memory".to_string(), Quantity(memory.to_string())),
    ])
}

fn metadata(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        ..Default::default()
    }
}

fn pod_template(containers: &[ContainerFixture<'_>]) -> PodTemplateSpec {
    PodTemplateSpec {
        metadata: None,
        spec: Some(PodSpec {
            containers: containers
                .iter()
                .map(|(name, limits_cpu, limits_memory, requests_cpu, requests_memory)| Container {
                    name: name.to_string(),
                    image: Some("nginx:1.27".to_string()),
                    resources: Some(ResourceRequirements {
                        limits: Some(quantities(limits_cpu, limits_memory)),
                        requests: Some(quantities(requests_cpu, requests_memory)),
                        ..Default::default()
                    }),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }),
    }
}

/// Helper to create a test Deployment whose replicas are all available
pub fn create_test_deployment(
    name: &str,
    namespace: &str,
    replicas: i32,
    containers: &[ContainerFixture<'_>],
) -> Deployment {
    Deployment {
        metadata: metadata(name, namespace),
        spec: Some(DeploymentSpec {
            replicas: Some(replicas),
            template: pod_template(containers),
            ..Default::default()
        }),
        status: Some(DeploymentStatus {
            replicas: Some(replicas),
            available_replicas: Some(replicas),
            ready_replicas: Some(replicas),
            ..Default::default()
        }),
    }
}

/// Helper to create a test StatefulSet whose replicas are all ready
pub fn create_test_stateful_set(
    name: &str,
    namespace: &str,
    replicas: i32,
    containers: &[ContainerFixture<'_>],
) -> StatefulSet {
    StatefulSet {
        metadata: metadata(name, namespace),
        spec: Some(StatefulSetSpec {
            replicas: Some(replicas),
            template: pod_template(containers),
            ..Default::default()
        }),
        status: Some(StatefulSetStatus {
            replicas,
            ready_replicas: Some(replicas),
            ..Default::default()
        }),
    }
}

/// Helper to create a test Pod.
///
/// `owner` becomes a ReplicaSet owner reference, `app_label` the value of
/// the `app` label.
pub fn create_test_pod(
    name: &str,
    namespace: &str,
    owner: Option<&str>,
    app_label: Option<&str>,
    qos_class: Option<&str>,
) -> Pod {
    let mut meta = metadata(name, namespace);
    meta.owner_references = owner.map(|owner| {
        vec![OwnerReference {
            api_version: "apps/v1".to_string(),
            kind: "ReplicaSet".to_string(),
            name: owner.to_string(),
            uid: format!("uid-{owner}"),
            controller: Some(true),
            ..Default::default()
        }]
    });
    meta.labels = app_label.map(|value| BTreeMap::from([("app".to_string(), value.to_string())]));

    Pod {
        metadata: meta,
        spec: Some(PodSpec::default()),
        status: Some(PodStatus {
            qos_class: qos_class.map(str::to_string),
            ..Default::default()
        }),
    }
}

/// Helper to create a validated request in namespace `default`
#[allow(clippy::too_many_arguments)]
pub fn create_test_request(
    workload: &str,
    container: &str,
    kind: &str,
    replicas: &str,
    limits_cpu: &str,
    limits_memory: &str,
    requests_cpu: &str,
    requests_memory: &str,
) -> WorkloadMutationRequest {
    WorkloadMutationRequest::from_fields(
        2,
        &[
            workload,
            container,
            kind,
            "default",
            replicas,
            limits_cpu,
            limits_memory,
            requests_cpu,
            requests_memory,
        ],
    )
    .expect("fixture request must be valid")
}

/// Helper to create a reconciler over a clone of `mock`
pub fn create_test_reconciler(mock: &MockClusterClient, config: TunerConfig) -> Reconciler {
    Reconciler::new(Box::new(mock.clone()), config)
}

/// Log lines captured from code run under [`CapturedLogs::dispatch`]
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Plain-text subscriber writing into this buffer, for `WithSubscriber::with_subscriber`
    pub fn dispatch(&self) -> tracing::Dispatch {
        let sink = self.clone();
        tracing::Dispatch::new(
            tracing_subscriber::fmt()
                .with_writer(move || sink.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::DEBUG)
                .finish(),
        )
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
