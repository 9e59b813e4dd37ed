//! Test fixtures and builder patterns for ConfigNode and Node objects.

use std::collections::BTreeMap;

use confignode_webhook::crd::{ConfigNode, ConfigNodeSpec};
use confignode_webhook::error::{Result, ValidationError};
use confignode_webhook::NodeLister;
use k8s_openapi::api::core::v1::{Node, NodeSpec, Taint};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Builder for creating ConfigNode test fixtures.
///
/// # Example
/// ```ignore
/// let resource = ConfigNodeBuilder::new("iotdb-confignode")
///     .namespace("iotdb")
///     .replicas(3)
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct ConfigNodeBuilder {
    name: String,
    namespace: Option<String>,
    replicas: i32,
    envs: BTreeMap<String, String>,
}

impl ConfigNodeBuilder {
    /// Create a new builder with the given resource name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            replicas: 1,
            envs: BTreeMap::new(),
        }
    }

    /// Set the namespace for the resource.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set the number of replicas.
    pub fn replicas(mut self, replicas: i32) -> Self {
        self.replicas = replicas;
        self
    }

    /// Add a confignode property.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.insert(key.into(), value.into());
        self
    }

    /// Build the ConfigNode.
    pub fn build(self) -> ConfigNode {
        ConfigNode {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: self.namespace,
                ..Default::default()
            },
            spec: ConfigNodeSpec {
                replicas: self.replicas,
                envs: self.envs,
                ..Default::default()
            },
            status: None,
        }
    }
}

/// Create a ConfigNode in `default` with the given replica count.
pub fn confignode(replicas: i32) -> ConfigNode {
    ConfigNodeBuilder::new("test-confignode")
        .namespace("default")
        .replicas(replicas)
        .build()
}

/// Builder for creating Node test fixtures.
#[derive(Clone, Debug)]
pub struct NodeBuilder {
    name: String,
    taints: Vec<Taint>,
}

impl NodeBuilder {
    /// Create an untainted node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            taints: Vec::new(),
        }
    }

    /// Add a taint with the given effect.
    pub fn taint(mut self, key: impl Into<String>, effect: impl Into<String>) -> Self {
        self.taints.push(Taint {
            key: key.into(),
            effect: effect.into(),
            ..Default::default()
        });
        self
    }

    /// Build the Node.
    pub fn build(self) -> Node {
        Node {
            metadata: ObjectMeta {
                name: Some(self.name),
                ..Default::default()
            },
            spec: Some(NodeSpec {
                taints: if self.taints.is_empty() {
                    None
                } else {
                    Some(self.taints)
                },
                ..Default::default()
            }),
            status: None,
        }
    }
}

/// Create `count` untainted worker nodes.
pub fn workers(count: usize) -> Vec<Node> {
    (0..count)
        .map(|i| NodeBuilder::new(format!("worker-{}", i)).build())
        .collect()
}

/// Lister returning a fixed inventory.
pub struct StaticNodeLister(pub Vec<Node>);

impl NodeLister for StaticNodeLister {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        Ok(self.0.clone())
    }
}

/// Lister whose every read fails with an API error.
pub struct FailingNodeLister;

impl NodeLister for FailingNodeLister {
    async fn list_nodes(&self) -> Result<Vec<Node>> {
        Err(ValidationError::NodeList(kube::Error::Api(
            kube::error::ErrorResponse {
                status: "Failure".to_string(),
                message: "nodes is forbidden: User \"system:serviceaccount:iotdb:webhook\" cannot list resource \"nodes\"".to_string(),
                reason: "Forbidden".to_string(),
                code: 403,
            },
        )))
    }
}
