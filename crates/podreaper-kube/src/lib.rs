//! podreaper-kube
//!
//! Kubernetes 実装の `Cluster` port。`kube` クライアントで namespace / pod を
//! 列挙・削除する。タイムアウトやリトライはクライアント側の設定に任せる。

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Pod};
use kube::api::{Api, DeleteParams, ListParams};
use kube::Client;
use tracing::debug;

use podreaper_core::domain::{ManagedNamespace, NamespaceName, NamespaceSelector, PodName, Workload};
use podreaper_core::ports::{Cluster, ClusterError};

pub struct KubeCluster {
    client: Client,
    selector: NamespaceSelector,
}

impl KubeCluster {
    pub fn new(client: Client, selector: NamespaceSelector) -> Self {
        Self { client, selector }
    }

    /// In-cluster config or the local kubeconfig, whichever is found first.
    pub async fn try_default(selector: NamespaceSelector) -> Result<Self, kube::Error> {
        let client = Client::try_default().await?;
        Ok(Self::new(client, selector))
    }
}

fn api_error(operation: &'static str, err: kube::Error) -> ClusterError {
    ClusterError::api(operation, err.to_string())
}

/// Keep only namespaces that also match the naming prefix; the label part was
/// already applied server-side.
fn managed_namespaces(
    selector: &NamespaceSelector,
    namespaces: impl IntoIterator<Item = Namespace>,
) -> Vec<ManagedNamespace> {
    namespaces
        .into_iter()
        .filter_map(|ns| ns.metadata.name)
        .filter(|name| selector.matches_name(name))
        .map(ManagedNamespace::new)
        .collect()
}

/// Pods without a name cannot be deleted by name, so they are dropped.
fn workload_from_pod(namespace: &NamespaceName, pod: Pod) -> Option<Workload> {
    let name = pod.metadata.name?;
    Some(Workload {
        namespace: namespace.clone(),
        name: PodName::new(name),
        annotations: pod.metadata.annotations.unwrap_or_default(),
    })
}

#[async_trait]
impl Cluster for KubeCluster {
    async fn list_managed_namespaces(&self) -> Result<Vec<ManagedNamespace>, ClusterError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let params = ListParams::default().labels(&self.selector.label_selector());
        let list = api
            .list(&params)
            .await
            .map_err(|e| api_error("list namespaces", e))?;

        let managed = managed_namespaces(&self.selector, list.items);
        debug!(count = managed.len(), "listed managed namespaces");
        Ok(managed)
    }

    async fn list_workloads(
        &self,
        namespace: &NamespaceName,
    ) -> Result<Vec<Workload>, ClusterError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace.as_str());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| api_error("list pods", e))?;

        Ok(list
            .items
            .into_iter()
            .filter_map(|pod| workload_from_pod(namespace, pod))
            .collect())
    }

    async fn delete_workload(
        &self,
        namespace: &NamespaceName,
        pod: &PodName,
    ) -> Result<(), ClusterError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace.as_str());
        match api.delete(pod.as_str(), &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(resp)) if resp.code == 404 => Err(ClusterError::NotFound {
                kind: "pod",
                name: format!("{namespace}/{pod}"),
            }),
            Err(e) => Err(api_error("delete pod", e)),
        }
    }
}
