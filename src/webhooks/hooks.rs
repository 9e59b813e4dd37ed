//! Admission hooks for a resource kind.
//!
//! [`AdmissionHooks`] names the four operations the webhook server invokes:
//! one mutating (`default`) and three validating. [`ConfigNodeValidator`] is
//! the ConfigNode implementation; it owns its [`NodeLister`] rather than
//! reaching for a process-wide client.

use std::future::Future;

use tracing::info;

use super::policies::{ValidationContext, Warnings, validate_all};
use crate::client::NodeLister;
use crate::crd::ConfigNode;
use crate::error::Result;

/// Defaulting and validation hooks for resource kind `K`.
pub trait AdmissionHooks<K>: Send + Sync {
    /// Apply defaults in place before validation.
    fn default(&self, resource: &mut K);

    /// Validate a resource about to be created.
    fn validate_create(&self, resource: &K) -> impl Future<Output = Result<Warnings>> + Send;

    /// Validate an update. `old` is the stored object when the request carried it.
    fn validate_update(
        &self,
        old: Option<&K>,
        new: &K,
    ) -> impl Future<Output = Result<Warnings>> + Send;

    /// Validate a deletion. `resource` is the stored object when the request carried it.
    fn validate_delete(
        &self,
        resource: Option<&K>,
    ) -> impl Future<Output = Result<Warnings>> + Send;
}

/// Admission hooks for [`ConfigNode`].
pub struct ConfigNodeValidator<L> {
    nodes: L,
}

impl<L: NodeLister> ConfigNodeValidator<L> {
    /// Create a validator that reads node inventory through `nodes`
    pub fn new(nodes: L) -> Self {
        Self { nodes }
    }

    /// The node inventory reader
    pub fn nodes(&self) -> &L {
        &self.nodes
    }
}

impl<L: NodeLister> AdmissionHooks<ConfigNode> for ConfigNodeValidator<L> {
    fn default(&self, resource: &mut ConfigNode) {
        info!(name = %resource.display_name(), "default");
    }

    async fn validate_create(&self, resource: &ConfigNode) -> Result<Warnings> {
        info!(name = %resource.display_name(), "validate create");
        validate_all(&self.nodes, &ValidationContext::create(resource)).await
    }

    async fn validate_update(
        &self,
        old: Option<&ConfigNode>,
        new: &ConfigNode,
    ) -> Result<Warnings> {
        info!(
            name = %new.display_name(),
            old_replicas = ?old.map(ConfigNode::replicas),
            new_replicas = new.replicas(),
            "validate update"
        );
        validate_all(&self.nodes, &ValidationContext::update(old, new)).await
    }

    async fn validate_delete(&self, resource: Option<&ConfigNode>) -> Result<Warnings> {
        info!(
            name = %resource.map(ConfigNode::display_name).unwrap_or("<unknown>"),
            "validate delete"
        );
        Ok(Warnings::new())
    }
}
