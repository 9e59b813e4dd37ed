//! Cluster-state readers used by admission hooks.
//!
//! The hooks never hold a client directly: they receive a [`NodeLister`] at
//! construction so tests can substitute a fixed node inventory.

mod node_lister;

pub use node_lister::{DEFAULT_NODE_LIST_TIMEOUT, KubeNodeLister, NodeLister};
