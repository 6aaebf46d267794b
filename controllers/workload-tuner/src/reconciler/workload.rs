//! Live workload objects.
//!
//! `LiveWorkload` wraps the Deployment or StatefulSet fetched for one pass so
//! that the mutator and verifier can treat both kinds the same way.

use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{Container, PodSpec};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;
use tuning_model::{Availability, ResourceQuantities, WorkloadKind};

/// Resource key for CPU in limits/requests maps
pub const CPU: &str = "cpu";
/// Resource key for memory in limits/requests maps
pub const MEMORY: &str = "memory";

fn get(map: Option<&BTreeMap<String, Quantity>>, key: &str) -> String {
    map.and_then(|m| m.get(key)).map(|q| q.0.clone()).unwrap_or_default()
}

/// The current state of a workload as read from the cluster
#[derive(Debug, Clone)]
pub enum LiveWorkload {
    Deployment(Deployment),
    StatefulSet(StatefulSet),
}

impl LiveWorkload {
    pub fn kind(&self) -> WorkloadKind {
        match self {
            LiveWorkload::Deployment(_) => WorkloadKind::Deployment,
            LiveWorkload::StatefulSet(_) => WorkloadKind::StatefulSet,
        }
    }

    pub fn name(&self) -> &str {
        let name = match self {
            LiveWorkload::Deployment(d) => d.metadata.name.as_deref(),
            LiveWorkload::StatefulSet(s) => s.metadata.name.as_deref(),
        };
        name.unwrap_or_default()
    }

    pub fn resource_version(&self) -> Option<&str> {
        match self {
            LiveWorkload::Deployment(d) => d.metadata.resource_version.as_deref(),
            LiveWorkload::StatefulSet(s) => s.metadata.resource_version.as_deref(),
        }
    }

    /// Desired replica count; the API server defaults an unset count to 1
    pub fn replicas(&self) -> i32 {
        let replicas = match self {
            LiveWorkload::Deployment(d) => d.spec.as_ref().and_then(|s| s.replicas),
            LiveWorkload::StatefulSet(s) => s.spec.as_ref().and_then(|s| s.replicas),
        };
        replicas.unwrap_or(1)
    }

    pub fn set_replicas(&mut self, replicas: i32) {
        match self {
            LiveWorkload::Deployment(d) => d.spec.get_or_insert_with(Default::default).replicas = Some(replicas),
            LiveWorkload::StatefulSet(s) => s.spec.get_or_insert_with(Default::default).replicas = Some(replicas),
        }
    }

    /// Rollout availability from the status block.
    ///
    /// Deployments count available replicas, StatefulSets count ready ones.
    pub fn availability(&self) -> Availability {
        let (up, total) = match self {
            LiveWorkload::Deployment(d) => d
                .status
                .as_ref()
                .map(|s| (s.available_replicas.unwrap_or(0), s.replicas.unwrap_or(0)))
                .unwrap_or((0, 0)),
            LiveWorkload::StatefulSet(s) => s
                .status
                .as_ref()
                .map(|s| (s.ready_replicas.unwrap_or(0), s.replicas))
                .unwrap_or((0, 0)),
        };
        Availability::from_counts(up, total)
    }

    pub fn pod_spec(&self) -> Option<&PodSpec> {
        match self {
            LiveWorkload::Deployment(d) => d.spec.as_ref().and_then(|s| s.template.spec.as_ref()),
            LiveWorkload::StatefulSet(s) => s.spec.as_ref().and_then(|s| s.template.spec.as_ref()),
        }
    }

    pub fn pod_spec_mut(&mut self) -> Option<&mut PodSpec> {
        match self {
            LiveWorkload::Deployment(d) => d.spec.as_mut().and_then(|s| s.template.spec.as_mut()),
            LiveWorkload::StatefulSet(s) => s.spec.as_mut().and_then(|s| s.template.spec.as_mut()),
        }
    }

    pub fn container(&self, name: &str) -> Option<&Container> {
        self.pod_spec()?.containers.iter().find(|c| c.name == name)
    }

    /// Limits and requests of the named container, empty strings where unset
    pub fn container_resources(&self, name: &str) -> Option<ResourceQuantities> {
        let container = self.container(name)?;
        let resources = container.resources.as_ref();
        let limits = resources.and_then(|r| r.limits.as_ref());
        let requests = resources.and_then(|r| r.requests.as_ref());

        Some(ResourceQuantities {
            limits_cpu: get(limits, CPU),
            limits_memory: get(limits, MEMORY),
            requests_cpu: get(requests, CPU),
            requests_memory: get(requests, MEMORY),
        })
    }
}

impl From<Deployment> for LiveWorkload {
    fn from(deployment: Deployment) -> Self {
        LiveWorkload::Deployment(deployment)
    }
}

impl From<StatefulSet> for LiveWorkload {
    fn from(stateful_set: StatefulSet) -> Self {
        LiveWorkload::StatefulSet(stateful_set)
    }
}
