//! Replica capacity validation policy.
//!
//! Enforced on CREATE and UPDATE
//!
//! Validates:
//! - `spec.replicas` does not exceed the number of worker nodes able to host
//!   a pod, i.e. nodes without a `NoSchedule` or `NoExecute` taint
//!
//! The node inventory is read from the API server on every call. Two
//! concurrent admissions may each pass against the same snapshot; no
//! cross-request accounting is attempted.

use k8s_openapi::api::core::v1::Node;
use tracing::info;

use super::{ValidationContext, Warnings};
use crate::client::NodeLister;
use crate::error::{Result, ValidationError};

/// Taint effect that blocks new pods from being scheduled
pub const TAINT_EFFECT_NO_SCHEDULE: &str = "NoSchedule";
/// Taint effect that blocks scheduling and evicts running pods
pub const TAINT_EFFECT_NO_EXECUTE: &str = "NoExecute";

/// Check whether a node can host a config node pod.
///
/// A node is excluded as soon as one of its taints has a `NoSchedule` or
/// `NoExecute` effect. Any other effect, including `PreferNoSchedule`, is
/// ignored.
pub fn is_eligible_worker(node: &Node) -> bool {
    let taints = node
        .spec
        .as_ref()
        .and_then(|spec| spec.taints.as_deref())
        .unwrap_or_default();

    !taints.iter().any(|taint| {
        taint.effect == TAINT_EFFECT_NO_SCHEDULE || taint.effect == TAINT_EFFECT_NO_EXECUTE
    })
}

/// Count nodes that can host a config node pod.
pub fn eligible_worker_count(nodes: &[Node]) -> usize {
    let ineligible = nodes.iter().filter(|n| !is_eligible_worker(n)).count();
    nodes.len() - ineligible
}

/// Check a replica count against the eligible node count.
///
/// Negative counts are left to schema validation and never exceed capacity here.
pub fn exceeds_capacity(replicas: i32, eligible: usize) -> bool {
    usize::try_from(replicas).is_ok_and(|r| r > eligible)
}

/// Validate replica count against current worker node capacity
pub async fn validate<L: NodeLister>(nodes: &L, ctx: &ValidationContext<'_>) -> Result<Warnings> {
    // Fail closed: a failed read rejects the request before any counting
    let inventory = nodes.list_nodes().await?;

    let replicas = ctx.resource.replicas();
    let eligible = eligible_worker_count(&inventory);

    info!(
        name = %ctx.resource.display_name(),
        namespace = ?ctx.resource.metadata.namespace,
        update = ctx.is_update(),
        replicas,
        total_nodes = inventory.len(),
        eligible_nodes = eligible,
        "Validating ConfigNode replica capacity"
    );

    if exceeds_capacity(replicas, eligible) {
        return Err(ValidationError::ReplicasExceedWorkers { replicas, eligible });
    }

    Ok(Warnings::new())
}
