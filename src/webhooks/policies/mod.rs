//! Validation policies for ConfigNode admission webhooks.
//!
//! Only one policy exists today: replica capacity, enforced on CREATE and
//! UPDATE. DELETE never reaches the policies.

pub mod replicas;

use kube::core::admission::Operation;

use crate::client::NodeLister;
use crate::crd::ConfigNode;
use crate::error::Result;

/// Human-readable warnings attached to an allowed admission response
pub type Warnings = Vec<String>;

/// Context for validation
pub struct ValidationContext<'a> {
    /// Admission operation being validated
    pub operation: Operation,
    /// The resource being validated
    pub resource: &'a ConfigNode,
    /// The old resource (for UPDATE operations)
    pub old_resource: Option<&'a ConfigNode>,
}

impl<'a> ValidationContext<'a> {
    /// Context for a CREATE request
    pub fn create(resource: &'a ConfigNode) -> Self {
        Self {
            operation: Operation::Create,
            resource,
            old_resource: None,
        }
    }

    /// Context for an UPDATE request
    ///
    /// `old_resource` may be absent when the request did not carry it.
    pub fn update(old_resource: Option<&'a ConfigNode>, resource: &'a ConfigNode) -> Self {
        Self {
            operation: Operation::Update,
            resource,
            old_resource,
        }
    }

    /// Check if this is an UPDATE operation
    pub fn is_update(&self) -> bool {
        self.operation == Operation::Update
    }
}

/// Run all validation policies
pub async fn validate_all<L: NodeLister>(
    nodes: &L,
    ctx: &ValidationContext<'_>,
) -> Result<Warnings> {
    replicas::validate(nodes, ctx).await
}
