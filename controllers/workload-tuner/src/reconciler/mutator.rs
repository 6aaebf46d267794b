//! Resource mutator.
//!
//! Applies a request to an in-memory workload. No network calls.

use super::workload::{CPU, LiveWorkload, MEMORY};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;
use tuning_model::WorkloadMutationRequest;

fn quantities(cpu: &str, memory: &str) -> BTreeMap<String, Quantity> {
    BTreeMap::from([
        (CPU.to_string(), Quantity(cpu.to_string())),
        (MEMORY.to_string(), Quantity(memory.to_string())),
    ])
}

/// Sets the replica count and the named container's limits and requests.
///
/// Both maps are replaced whole, so resource types other than cpu and memory
/// are dropped. Returns `false` when no container has the requested name; the
/// replica count is set regardless.
pub fn apply_mutation(workload: &mut LiveWorkload, request: &WorkloadMutationRequest) -> bool {
    workload.set_replicas(request.replicas);

    let Some(container) = workload
        .pod_spec_mut()
        .and_then(|spec| spec.containers.iter_mut().find(|c| c.name == request.container))
    else {
        return false;
    };

    let resources = container.resources.get_or_insert_with(Default::default);
    let desired = &request.resources;
    resources.limits = Some(quantities(&desired.limits_cpu, &desired.limits_memory));
    resources.requests = Some(quantities(&desired.requests_cpu, &desired.requests_memory));
    true
}
