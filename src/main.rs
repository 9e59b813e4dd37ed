//! confignode-webhook - admission webhook for IoTDB ConfigNode resources.
//!
//! This is the main entry point that:
//! - Initializes structured logging
//! - Loads configuration from the environment
//! - Creates the Kubernetes client
//! - Starts the health server and the TLS webhook server

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use kube::Client;
use tokio::signal;
use tokio::task::JoinError;
use tracing::{debug, error, info};

use confignode_webhook::health::{HealthState, run_health_server};
use confignode_webhook::{
    ConfigNodeValidator, KubeNodeLister, WebhookConfig, WebhookState, run_webhook_server,
};

/// Grace period for in-flight admission requests to complete during shutdown
const SHUTDOWN_GRACE_PERIOD_SECS: u64 = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("confignode_webhook=info".parse()?)
                .add_directive("kube=info".parse()?),
        )
        .json()
        .init();

    info!("Starting confignode-webhook");

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let config = WebhookConfig::from_env()?;
    info!(
        port = config.port,
        health_port = config.health_port,
        node_list_timeout = ?config.node_list_timeout,
        "Loaded configuration"
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    // Create shared health state
    let health_state = Arc::new(HealthState::new());

    // Start health server immediately (liveness should work before TLS is loaded)
    let health_handle = {
        let health_state = health_state.clone();
        let port = config.health_port;
        tokio::spawn(async move { run_health_server(health_state, port).await })
    };

    // Start webhook server; it flips readiness once the TLS listener is bound
    let webhook_handle = {
        let nodes = KubeNodeLister::with_timeout(client, config.node_list_timeout);
        let state = Arc::new(WebhookState::new(
            ConfigNodeValidator::new(nodes),
            Some(health_state.clone()),
        ));
        let config = config.clone();
        tokio::spawn(async move { run_webhook_server(state, &config).await })
    };

    // Wait for any task to complete (or fail), or shutdown signal.
    // A server that stops on its own ends the process with an error.
    let outcome = tokio::select! {
        result = webhook_handle => {
            health_state.set_ready(false).await;
            Err(server_stopped("webhook", result))
        }
        result = health_handle => Err(server_stopped("health", result)),
        // Handle graceful shutdown on SIGTERM or SIGINT
        _ = shutdown_signal() => {
            info!("Received shutdown signal, initiating graceful shutdown...");

            // Mark as not ready so the Service stops routing admission requests here
            health_state.set_ready(false).await;
            info!("Marked webhook as not ready");

            info!(
                "Waiting {}s for in-flight admission requests to complete...",
                SHUTDOWN_GRACE_PERIOD_SECS
            );
            tokio::time::sleep(Duration::from_secs(SHUTDOWN_GRACE_PERIOD_SECS)).await;

            info!("Grace period complete, shutting down");
            Ok(())
        }
    };

    info!("Webhook stopped");
    outcome
}

/// Error for a server task that ended before shutdown was requested
fn server_stopped<E>(server: &str, result: Result<Result<(), E>, JoinError>) -> Box<dyn Error>
where
    E: Error + 'static,
{
    match result {
        Ok(Ok(())) => {
            error!(server, "Server stopped unexpectedly");
            format!("{} server stopped unexpectedly", server).into()
        }
        Ok(Err(e)) => {
            error!(server, error = %e, "Server failed");
            e.into()
        }
        Err(e) => {
            error!(server, error = %e, "Server task panicked");
            e.into()
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
///
/// Note: Signal handler setup failures are fatal - the webhook cannot shut down
/// gracefully without them. Using expect() here is intentional.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
