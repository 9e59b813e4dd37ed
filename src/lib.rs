//! confignode-webhook library crate
//!
//! Admission webhook for the IoTDB `ConfigNode` custom resource. Create and
//! update requests are rejected when `spec.replicas` exceeds the number of
//! cluster nodes without a `NoSchedule` or `NoExecute` taint.

pub mod client;
pub mod config;
pub mod crd;
pub mod error;
pub mod health;
pub mod webhooks;

pub use client::{KubeNodeLister, NodeLister};
pub use config::WebhookConfig;
pub use error::ValidationError;
pub use health::HealthState;
pub use webhooks::{
    AdmissionHooks, ConfigNodeValidator, WebhookError, WebhookState, run_webhook_server,
};
