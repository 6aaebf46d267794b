//! QoS class lookup through the tracking label.

use crate::error::ReconcileError;
use cluster_client::ClusterClientTrait;

/// QoS class reported by the first pod labelled `<label_key>=<workload>`
pub async fn resolve_qos(
    cluster: &dyn ClusterClientTrait,
    namespace: &str,
    label_key: &str,
    workload: &str,
) -> Result<String, ReconcileError> {
    let selector = format!("{label_key}={workload}");
    let pods = cluster.list_pods(namespace, Some(&selector)).await?;

    let Some(pod) = pods.first() else {
        return Err(ReconcileError::LabelMissing {
            namespace: namespace.to_string(),
            selector,
        });
    };

    pod.status
        .as_ref()
        .and_then(|s| s.qos_class.clone())
        .filter(|class| !class.is_empty())
        .ok_or_else(|| ReconcileError::QosNotReported(pod.metadata.name.clone().unwrap_or_default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use cluster_client::MockClusterClient;

    #[tokio::test]
    async fn test_first_labelled_pod_wins() {
        let mock = MockClusterClient::new();
        mock.add_pod(create_test_pod("web-abc-1", "default", Some("web-abc"), Some("web"), Some("Burstable")));
        mock.add_pod(create_test_pod("other-1", "default", Some("other-x"), Some("other"), Some("BestEffort")));

        let class = resolve_qos(&mock, "default", "app", "web").await.unwrap();
        assert_eq!(class, "Burstable");
    }

    #[tokio::test]
    async fn test_no_labelled_pod_needs_manual_handling() {
        let mock = MockClusterClient::new();
        mock.add_pod(create_test_pod("web-abc-1", "default", Some("web-abc"), None, Some("Burstable")));

        let err = resolve_qos(&mock, "default", "app", "web").await.unwrap_err();
        assert!(matches!(err, ReconcileError::LabelMissing { ref selector, .. } if selector == "app=web"));
        assert!(err.to_string().contains("handle manually"));
    }

    #[tokio::test]
    async fn test_pod_without_qos_class() {
        let mock = MockClusterClient::new();
        mock.add_pod(create_test_pod("web-abc-1", "default", Some("web-abc"), Some("web"), None));

        let err = resolve_qos(&mock, "default", "app", "web").await.unwrap_err();
        assert!(matches!(err, ReconcileError::QosNotReported(ref pod) if pod == "web-abc-1"));
    }

    #[tokio::test]
    async fn test_list_failure_propagates() {
        let mock = MockClusterClient::new();
        mock.fail(cluster_client::Operation::ListPods, "connection refused");

        let err = resolve_qos(&mock, "default", "app", "web").await.unwrap_err();
        assert!(matches!(err, ReconcileError::Cluster(_)));
    }
}
