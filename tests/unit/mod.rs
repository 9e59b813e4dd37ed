// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Unit tests for confignode-webhook.
//!
//! These tests run without a Kubernetes cluster and exercise the public API
//! with in-memory node inventories.

#[path = "../common/mod.rs"]
mod common;

mod capacity_scenarios {
    use crate::common::*;
    use confignode_webhook::error::REPLICAS_EXCEED_WORKERS_MESSAGE;
    use confignode_webhook::{AdmissionHooks, ConfigNodeValidator, ValidationError};

    #[tokio::test]
    async fn test_three_clean_nodes_three_replicas() {
        let hooks = ConfigNodeValidator::new(StaticNodeLister(workers(3)));
        let warnings = hooks.validate_create(&confignode(3)).await.unwrap();
        assert!(warnings.is_empty());
    }

    #[tokio::test]
    async fn test_no_schedule_node_rejects_three_replicas() {
        let mut nodes = workers(2);
        nodes.push(
            NodeBuilder::new("control-plane")
                .taint("node-role.kubernetes.io/control-plane", "NoSchedule")
                .build(),
        );
        let hooks = ConfigNodeValidator::new(StaticNodeLister(nodes));

        let err = hooks.validate_create(&confignode(3)).await.unwrap_err();
        assert!(err.to_string().contains("available worker nodes"));
        assert_eq!(err.to_string(), REPLICAS_EXCEED_WORKERS_MESSAGE);
    }

    #[tokio::test]
    async fn test_no_execute_node_excluded() {
        let mut nodes = workers(2);
        nodes.push(
            NodeBuilder::new("draining")
                .taint("node.kubernetes.io/unreachable", "NoExecute")
                .build(),
        );
        let hooks = ConfigNodeValidator::new(StaticNodeLister(nodes));

        assert!(hooks.validate_create(&confignode(2)).await.is_ok());
        assert!(hooks.validate_create(&confignode(3)).await.is_err());
    }

    #[tokio::test]
    async fn test_prefer_no_schedule_node_counts() {
        let mut nodes = workers(2);
        nodes.push(
            NodeBuilder::new("soft")
                .taint("example.com/soft", "PreferNoSchedule")
                .build(),
        );
        let hooks = ConfigNodeValidator::new(StaticNodeLister(nodes));

        assert!(hooks.validate_create(&confignode(3)).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_cluster_zero_replicas() {
        let hooks = ConfigNodeValidator::new(StaticNodeLister(Vec::new()));
        assert!(hooks.validate_create(&confignode(0)).await.is_ok());
        assert!(hooks.validate_create(&confignode(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_list_failure_rejects_zero_replicas() {
        let hooks = ConfigNodeValidator::new(FailingNodeLister);

        let err = hooks.validate_create(&confignode(0)).await.unwrap_err();
        assert!(matches!(err, ValidationError::NodeList(_)));
        assert!(err.to_string().contains("nodes is forbidden"));
    }

    #[tokio::test]
    async fn test_update_checked_like_create() {
        let hooks = ConfigNodeValidator::new(StaticNodeLister(workers(2)));
        let old = confignode(1);

        assert!(hooks.validate_update(Some(&old), &confignode(2)).await.is_ok());
        assert!(
            hooks
                .validate_update(Some(&old), &confignode(3))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_delete_ignores_capacity_and_failures() {
        let hooks = ConfigNodeValidator::new(FailingNodeLister);
        let resource = confignode(100);

        let warnings = hooks.validate_delete(Some(&resource)).await.unwrap();
        assert!(warnings.is_empty());
    }
}

mod dispatcher_tests {
    use crate::common::*;
    use confignode_webhook::ConfigNodeValidator;
    use confignode_webhook::webhooks::{
        AdmissionRequest, AdmissionReview, DynamicObject, review_validation,
    };
    use serde_json::{Value, json};

    fn request(operation: &str, replicas: i32) -> AdmissionRequest<DynamicObject> {
        let object = serde_json::to_value(confignode(replicas)).unwrap();
        if operation == "DELETE" {
            raw_request(operation, json!(null), object)
        } else {
            raw_request(operation, object, json!(null))
        }
    }

    fn raw_request(operation: &str, object: Value, old: Value) -> AdmissionRequest<DynamicObject> {
        let review: AdmissionReview<DynamicObject> = serde_json::from_value(json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "e911857d-c318-11e8-bbad-025000000001",
                "kind": {"group": "iotdb.apache.org", "version": "v1", "kind": "ConfigNode"},
                "resource": {"group": "iotdb.apache.org", "version": "v1", "resource": "confignodes"},
                "name": "test-confignode",
                "namespace": "default",
                "operation": operation,
                "userInfo": {},
                "object": object,
                "oldObject": old
            }
        }))
        .unwrap();
        review.try_into().unwrap()
    }

    #[tokio::test]
    async fn test_review_serializes_denial() {
        let hooks = ConfigNodeValidator::new(StaticNodeLister(workers(1)));
        let response = review_validation(&hooks, &request("CREATE", 2)).await;

        let review = serde_json::to_value(response.into_review()).unwrap();
        assert_eq!(review["kind"], "AdmissionReview");
        assert_eq!(review["response"]["allowed"], false);
        assert_eq!(
            review["response"]["uid"],
            "e911857d-c318-11e8-bbad-025000000001"
        );
        assert!(
            review["response"]["status"]["message"]
                .as_str()
                .unwrap()
                .contains("available worker nodes")
        );
    }

    #[tokio::test]
    async fn test_review_allows_delete() {
        let hooks = ConfigNodeValidator::new(FailingNodeLister);
        let response = review_validation(&hooks, &request("DELETE", 7)).await;
        assert!(response.allowed);
    }

    #[tokio::test]
    async fn test_review_allows_delete_of_object_without_spec() {
        let hooks = ConfigNodeValidator::new(FailingNodeLister);
        let old = json!({
            "apiVersion": "iotdb.apache.org/v1",
            "kind": "ConfigNode",
            "metadata": {"name": "test-confignode", "namespace": "default"}
        });
        let response = review_validation(&hooks, &raw_request("DELETE", json!(null), old)).await;
        assert!(response.allowed);
    }
}

mod config_tests {
    use confignode_webhook::WebhookConfig;
    use confignode_webhook::config::{WEBHOOK_CERT_PATH, WEBHOOK_PORT};

    #[test]
    fn test_default_config_matches_manifests() {
        let config = WebhookConfig::default();
        assert_eq!(config.cert_path, WEBHOOK_CERT_PATH);
        assert_eq!(config.port, WEBHOOK_PORT);
        assert_eq!(config.health_port, 8080);
    }
}

mod error_tests {
    use confignode_webhook::ValidationError;

    #[test]
    fn test_error_kinds() {
        let kube_err = ValidationError::NodeList(kube::Error::Api(kube::error::ErrorResponse {
            status: "Failure".to_string(),
            message: "timeout".to_string(),
            reason: "Timeout".to_string(),
            code: 504,
        }));
        assert!(kube_err.is_infrastructure());

        let violation = ValidationError::ReplicasExceedWorkers {
            replicas: 4,
            eligible: 3,
        };
        assert!(!violation.is_infrastructure());
        assert_eq!(violation.reason(), "ReplicasExceedWorkers");
    }
}
