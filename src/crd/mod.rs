//! Custom Resource Definitions (CRDs) served by the webhook.
//!
//! - `ConfigNode`: IoTDB config-node role, replicated across worker nodes

mod config_node;

pub use config_node::*;
