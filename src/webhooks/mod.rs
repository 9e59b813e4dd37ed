//! Webhook module for ConfigNode admission requests.
//!
//! - `hooks`: the defaulting/validating operations for a resource kind
//! - `policies`: validation rules (replica capacity)
//! - `server`: HTTPS dispatch of AdmissionReview requests to the hooks

pub mod hooks;
pub mod policies;
mod server;

pub use hooks::{AdmissionHooks, ConfigNodeValidator};
pub use policies::{ValidationContext, Warnings};
pub use server::{
    MUTATE_PATH, VALIDATE_PATH, WebhookError, WebhookState, create_webhook_router,
    review_mutation, review_validation, run_webhook_server,
};

// Re-export kube-rs admission types for contract testing
pub use kube::core::DynamicObject;
pub use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
