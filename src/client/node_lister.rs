//! Node inventory reads against the live API server.

use std::future::Future;
use std::time::Duration;

use k8s_openapi::api::core::v1::Node;
use kube::api::ListParams;
use kube::{Api, Client};
use tracing::{debug, warn};

use crate::error::{Result, ValidationError};

/// Default deadline for a node list, kept below the API server's 10s webhook timeout.
pub const DEFAULT_NODE_LIST_TIMEOUT: Duration = Duration::from_secs(8);

/// Read access to the cluster's node inventory.
pub trait NodeLister: Send + Sync {
    /// List every node in the cluster.
    ///
    /// Implementations must read current state on each call; callers rely on
    /// the result reflecting the topology at decision time.
    fn list_nodes(&self) -> impl Future<Output = Result<Vec<Node>>> + Send;
}

/// [`NodeLister`] backed by a cluster-scoped `Api<Node>`.
#[derive(Clone)]
pub struct KubeNodeLister {
    api: Api<Node>,
    timeout: Duration,
}

impl KubeNodeLister {
    /// Create a lister using the default deadline
    pub fn new(client: Client) -> Self {
        Self::with_timeout(client, DEFAULT_NODE_LIST_TIMEOUT)
    }

    /// Create a lister with an explicit deadline per list call
    pub fn with_timeout(client: Client, timeout: Duration) -> Self {
        Self {
            api: Api::all(client),
            timeout,
        }
    }

    /// Deadline applied to each list call
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl NodeLister for KubeNodeLister {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        let nodes = with_deadline(self.timeout, self.api.list(&ListParams::default())).await?;
        debug!(count = nodes.items.len(), "Listed cluster nodes");
        Ok(nodes.items)
    }
}

/// Await a node read, failing with [`ValidationError::NodeListTimeout`] once `timeout` elapses.
///
/// Dropping the returned future cancels the underlying request.
pub(crate) async fn with_deadline<T, F>(timeout: Duration, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, kube::Error>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(|e| {
            warn!(error = %e, "Failed to list cluster nodes");
            ValidationError::NodeList(e)
        }),
        Err(_) => {
            warn!(timeout = ?timeout, "Timed out listing cluster nodes");
            Err(ValidationError::NodeListTimeout(timeout))
        }
    }
}
