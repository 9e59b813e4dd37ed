//! ConfigNode Custom Resource Definition.
//!
//! A ConfigNode is the replicated configuration-management role of an IoTDB
//! cluster. The webhook only reads `spec.replicas`; the remaining fields are
//! carried so that admission reviews decode the full object.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ResourceRequirements;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group of the ConfigNode resource.
pub const CONFIGNODE_GROUP: &str = "iotdb.apache.org";
/// API version of the ConfigNode resource.
pub const CONFIGNODE_VERSION: &str = "v1";
/// Plural resource name used in webhook registrations and RBAC.
pub const CONFIGNODE_PLURAL: &str = "confignodes";

/// ConfigNode is a custom resource for deploying IoTDB config nodes.
///
/// Example:
/// ```yaml
/// apiVersion: iotdb.apache.org/v1
/// kind: ConfigNode
/// metadata:
///   name: iotdb-confignode
/// spec:
///   replicas: 3
///   image: apache/iotdb:1.3.2-confignode
///   envs:
///     cn_metric_reporter_list: PROMETHEUS
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "iotdb.apache.org",
    version = "v1",
    kind = "ConfigNode",
    plural = "confignodes",
    shortname = "cn",
    status = "ConfigNodeStatus",
    namespaced,
    printcolumn = r#"{"name":"Replicas", "type":"integer", "jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"Ready", "type":"integer", "jsonPath":".status.readyReplicas"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ConfigNodeSpec {
    /// Desired number of config node pods (default 1).
    /// Cannot exceed the number of schedulable worker nodes.
    #[serde(default = "default_replicas")]
    #[schemars(range(min = 0))]
    pub replicas: i32,

    /// Container image for the config node.
    #[serde(default = "default_image")]
    pub image: String,

    /// Resource requests and limits for config node pods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    /// Extra `iotdb-confignode.properties` entries passed as environment variables.
    #[serde(default)]
    pub envs: BTreeMap<String, String>,

    /// Additional labels to apply to managed resources.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl Default for ConfigNodeSpec {
    fn default() -> Self {
        Self {
            replicas: default_replicas(),
            image: default_image(),
            resources: None,
            envs: BTreeMap::new(),
            labels: BTreeMap::new(),
        }
    }
}

fn default_replicas() -> i32 {
    1
}

fn default_image() -> String {
    "apache/iotdb:1.3.2-confignode".to_string()
}

/// Observed state of a ConfigNode.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigNodeStatus {
    /// Number of config node pods reporting ready.
    #[serde(default)]
    pub ready_replicas: i32,
}

impl ConfigNode {
    /// Resource name, or `<unnamed>` when the request omitted it (generateName).
    pub fn display_name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or("<unnamed>")
    }

    /// Desired replica count.
    pub fn replicas(&self) -> i32 {
        self.spec.replicas
    }
}
