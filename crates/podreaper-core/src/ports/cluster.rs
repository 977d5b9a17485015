//! Cluster port - Kubernetes API の抽象化
//!
//! The reconciler only needs three namespace-scoped capabilities. The real
//! implementation lives in the `podreaper-kube` crate; `InMemoryCluster` is
//! used in tests and for local dry runs.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ManagedNamespace, NamespaceName, PodName, Workload};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClusterError {
    #[error("{operation} failed: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },

    /// Deleting something that is already gone ends up here.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
}

impl ClusterError {
    pub fn api(operation: &'static str, message: impl Into<String>) -> Self {
        ClusterError::Api {
            operation,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound { .. })
    }
}

/// Cluster は namespace / pod の列挙と pod の削除を提供
///
/// # 設計原則
/// - 全メソッドは失敗しうる（ネットワーク越し）
/// - タイムアウトは実装側（クライアント）の責務
/// - 削除は冪等であることを期待する（既に無い pod は NotFound）
#[async_trait]
pub trait Cluster: Send + Sync {
    /// Namespaces carrying the managed label and naming prefix.
    async fn list_managed_namespaces(&self) -> Result<Vec<ManagedNamespace>, ClusterError>;

    async fn list_workloads(
        &self,
        namespace: &NamespaceName,
    ) -> Result<Vec<Workload>, ClusterError>;

    async fn delete_workload(
        &self,
        namespace: &NamespaceName,
        pod: &PodName,
    ) -> Result<(), ClusterError>;
}

#[async_trait]
impl<C: Cluster + ?Sized> Cluster for Arc<C> {
    async fn list_managed_namespaces(&self) -> Result<Vec<ManagedNamespace>, ClusterError> {
        (**self).list_managed_namespaces().await
    }

    async fn list_workloads(
        &self,
        namespace: &NamespaceName,
    ) -> Result<Vec<Workload>, ClusterError> {
        (**self).list_workloads(namespace).await
    }

    async fn delete_workload(
        &self,
        namespace: &NamespaceName,
        pod: &PodName,
    ) -> Result<(), ClusterError> {
        (**self).delete_workload(namespace, pod).await
    }
}
