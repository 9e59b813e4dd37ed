//! Admission webhook server.
//!
//! Provides HTTPS endpoints for Kubernetes admission webhooks:
//! - `POST /mutate-iotdb-apache-org-v1-confignode` - defaulting (no patch)
//! - `POST /validate-iotdb-apache-org-v1-confignode` - replica capacity
//!
//! Both endpoints must be registered with `failurePolicy: Fail` so that an
//! unreachable webhook rejects requests instead of admitting them unchecked.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::hooks::AdmissionHooks;
use super::policies::Warnings;
use crate::config::WebhookConfig;
use crate::crd::ConfigNode;
use crate::health::{HealthState, Metrics};

/// Path of the mutating (defaulting) endpoint
pub const MUTATE_PATH: &str = "/mutate-iotdb-apache-org-v1-confignode";
/// Path of the validating endpoint
pub const VALIDATE_PATH: &str = "/validate-iotdb-apache-org-v1-confignode";

/// Shared state for webhook handlers
pub struct WebhookState<H> {
    /// ConfigNode admission hooks
    pub hooks: H,
    /// Optional health state for metrics and readiness
    pub health_state: Option<Arc<HealthState>>,
}

impl<H> WebhookState<H> {
    /// Create handler state; metrics and readiness are skipped without a health state
    pub fn new(hooks: H, health_state: Option<Arc<HealthState>>) -> Self {
        Self {
            hooks,
            health_state,
        }
    }
}

/// Uppercase operation name as it appears in AdmissionReview
fn operation_label(operation: &Operation) -> &'static str {
    match operation {
        Operation::Create => "CREATE",
        Operation::Update => "UPDATE",
        Operation::Delete => "DELETE",
        Operation::Connect => "CONNECT",
    }
}

/// Allowed response, carrying warnings when there are any
fn allow_with_warnings(
    request: &AdmissionRequest<DynamicObject>,
    warnings: Warnings,
) -> AdmissionResponse {
    let mut response = AdmissionResponse::from(request);
    if !warnings.is_empty() {
        response.warnings = Some(warnings);
    }
    response
}

/// Convert an untyped review object into a [`ConfigNode`]
fn parse_confignode(object: &DynamicObject) -> Result<ConfigNode, serde_json::Error> {
    serde_json::to_value(object).and_then(serde_json::from_value)
}

/// Typed view of an object that is not validated; decode failures are ignored
fn parse_for_logging(uid: &str, object: Option<&DynamicObject>) -> Option<ConfigNode> {
    let object = object?;
    match parse_confignode(object) {
        Ok(resource) => Some(resource),
        Err(e) => {
            debug!(uid, error = %e, "Ignoring undecodable object");
            None
        }
    }
}

/// Build the response for a validating request.
///
/// CREATE and UPDATE need a new object that decodes as a ConfigNode. DELETE
/// only ever sees the old one and is answered whatever its shape.
pub async fn review_validation<H>(
    hooks: &H,
    request: &AdmissionRequest<DynamicObject>,
) -> AdmissionResponse
where
    H: AdmissionHooks<ConfigNode>,
{
    review_validation_with_metrics(hooks, request, None).await
}

async fn review_validation_with_metrics<H>(
    hooks: &H,
    request: &AdmissionRequest<DynamicObject>,
    metrics: Option<&Metrics>,
) -> AdmissionResponse
where
    H: AdmissionHooks<ConfigNode>,
{
    let outcome = match request.operation {
        Operation::Create | Operation::Update => {
            let Some(object) = request.object.as_ref() else {
                error!(uid = %request.uid, "Missing object in request");
                return AdmissionResponse::from(request).deny("Missing object in request");
            };
            let resource = match parse_confignode(object) {
                Ok(resource) => resource,
                Err(e) => {
                    warn!(uid = %request.uid, error = %e, "Undecodable ConfigNode object");
                    return AdmissionResponse::from(request)
                        .deny(format!("Invalid ConfigNode object: {}", e));
                }
            };
            if request.operation == Operation::Create {
                hooks.validate_create(&resource).await
            } else {
                let old = parse_for_logging(&request.uid, request.old_object.as_ref());
                hooks.validate_update(old.as_ref(), &resource).await
            }
        }
        Operation::Delete => {
            let old = parse_for_logging(&request.uid, request.old_object.as_ref());
            hooks.validate_delete(old.as_ref()).await
        }
        Operation::Connect => Ok(Warnings::new()),
    };

    match outcome {
        Ok(warnings) => allow_with_warnings(request, warnings),
        Err(e) => {
            if let Some(metrics) = metrics.filter(|_| e.is_infrastructure()) {
                metrics.record_node_list_error();
            }
            warn!(
                uid = %request.uid,
                name = %request.name,
                reason = e.reason(),
                error = %e,
                "Admission request denied"
            );
            AdmissionResponse::from(request).deny(e.to_string())
        }
    }
}

/// Build the response for a mutating request.
///
/// ConfigNode defaulting leaves the object untouched, so no patch is returned.
pub fn review_mutation<H>(
    hooks: &H,
    request: &AdmissionRequest<DynamicObject>,
) -> AdmissionResponse
where
    H: AdmissionHooks<ConfigNode>,
{
    if let Some(mut resource) = parse_for_logging(&request.uid, request.object.as_ref()) {
        hooks.default(&mut resource);
    }
    AdmissionResponse::from(request)
}

type Rejection = (StatusCode, Json<AdmissionReview<DynamicObject>>);

/// 400 response carrying an invalid AdmissionReview
fn bad_request(message: String) -> Rejection {
    (
        StatusCode::BAD_REQUEST,
        Json(AdmissionResponse::invalid(message).into_review()),
    )
}

/// Decode an incoming review, answering 400 when the body or its request is unusable
fn decode_review(
    body: Result<Json<AdmissionReview<DynamicObject>>, JsonRejection>,
) -> Result<AdmissionRequest<DynamicObject>, Rejection> {
    let Json(review) = body.map_err(|e| {
        error!(error = %e, "Failed to decode AdmissionReview body");
        bad_request(format!("Invalid AdmissionReview: {}", e.body_text()))
    })?;
    review.try_into().map_err(|e| {
        error!(error = %e, "Failed to extract admission request");
        bad_request(format!("Invalid AdmissionReview: {}", e))
    })
}

/// Create the webhook router
pub fn create_webhook_router<H>(state: Arc<WebhookState<H>>) -> Router
where
    H: AdmissionHooks<ConfigNode> + 'static,
{
    Router::new()
        .route(MUTATE_PATH, post(mutate_confignode::<H>))
        .route(VALIDATE_PATH, post(validate_confignode::<H>))
        .with_state(state)
}

/// Mutating ConfigNode admission webhook handler
async fn mutate_confignode<H>(
    State(state): State<Arc<WebhookState<H>>>,
    body: Result<Json<AdmissionReview<DynamicObject>>, JsonRejection>,
) -> impl IntoResponse
where
    H: AdmissionHooks<ConfigNode> + 'static,
{
    let request = match decode_review(body) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };

    debug!(
        uid = %request.uid,
        operation = ?request.operation,
        name = %request.name,
        "Processing mutation request"
    );

    let response = review_mutation(&state.hooks, &request);
    (StatusCode::OK, Json(response.into_review()))
}

/// Validating ConfigNode admission webhook handler
async fn validate_confignode<H>(
    State(state): State<Arc<WebhookState<H>>>,
    body: Result<Json<AdmissionReview<DynamicObject>>, JsonRejection>,
) -> impl IntoResponse
where
    H: AdmissionHooks<ConfigNode> + 'static,
{
    let request = match decode_review(body) {
        Ok(req) => req,
        Err(rejection) => return rejection,
    };

    let started = Instant::now();
    let operation = operation_label(&request.operation);
    debug!(
        uid = %request.uid,
        operation,
        namespace = ?request.namespace,
        name = %request.name,
        "Processing admission request"
    );

    let metrics = state.health_state.as_deref().map(|h| &h.metrics);
    let response = review_validation_with_metrics(&state.hooks, &request, metrics).await;

    if let Some(metrics) = metrics {
        metrics.record_admission(operation, response.allowed, started.elapsed().as_secs_f64());
    }
    if response.allowed {
        info!(uid = %request.uid, operation, "Admission request allowed");
    }

    (StatusCode::OK, Json(response.into_review()))
}

/// Errors that can occur when running the webhook server
#[derive(Error, Debug)]
pub enum WebhookError {
    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),
    /// Server error
    #[error("Webhook server error: {0}")]
    Server(String),
}

/// Flip readiness on once the server behind `handle` has bound its port
async fn mark_ready_when_listening(handle: Handle, health: Arc<HealthState>) {
    match handle.listening().await {
        Some(addr) => {
            info!(%addr, "Webhook server listening with TLS");
            health.set_ready(true).await;
        }
        None => warn!("Webhook server did not start listening"),
    }
}

/// Run the webhook server with TLS
///
/// Binds to `0.0.0.0:<config.port>` and serves both admission endpoints.
/// Readiness is on only while the listener is bound.
pub async fn run_webhook_server<H>(
    state: Arc<WebhookState<H>>,
    config: &WebhookConfig,
) -> Result<(), WebhookError>
where
    H: AdmissionHooks<ConfigNode> + 'static,
{
    let health_state = state.health_state.clone();
    let app = create_webhook_router(state);

    let tls = RustlsConfig::from_pem_file(
        PathBuf::from(&config.cert_path),
        PathBuf::from(&config.key_path),
    )
    .await
    .map_err(|e| WebhookError::TlsConfig(e.to_string()))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let handle = Handle::new();
    if let Some(health) = &health_state {
        tokio::spawn(mark_ready_when_listening(handle.clone(), health.clone()));
    }

    let served = axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await;

    if let Some(health) = &health_state {
        health.set_ready(false).await;
    }
    served.map_err(|e| WebhookError::Server(e.to_string()))
}
