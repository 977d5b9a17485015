//! InMemoryCluster - テスト・ローカル検証用のクラスタ
//!
//! # 学習ポイント
//! - 失敗注入（namespace 列挙 / namespace 単位の pod 列挙 / pod 単位の削除）
//! - 削除の試行と成功を別々に記録して、部分失敗を検証できるようにする

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{ManagedNamespace, NamespaceName, NamespaceSelector, PodName, Workload};
use crate::ports::{Cluster, ClusterError};

struct NamespaceEntry {
    name: NamespaceName,
    labels: BTreeMap<String, String>,
    pods: Vec<Workload>,
}

#[derive(Default)]
struct ClusterState {
    /// 挿入順を保つ（API の列挙順の代わり）
    namespaces: Vec<NamespaceEntry>,
    fail_namespace_listing: bool,
    fail_listing_in: HashSet<NamespaceName>,
    fail_delete: HashSet<(NamespaceName, PodName)>,
    delete_attempts: Vec<(NamespaceName, PodName)>,
    deleted: Vec<(NamespaceName, PodName)>,
}

impl ClusterState {
    fn entry_mut(&mut self, name: &NamespaceName) -> Option<&mut NamespaceEntry> {
        self.namespaces.iter_mut().find(|ns| &ns.name == name)
    }
}

/// In-memory stand-in for the Kubernetes API.
///
/// Without a selector every namespace counts as managed.
#[derive(Default)]
pub struct InMemoryCluster {
    selector: Option<NamespaceSelector>,
    state: Mutex<ClusterState>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selector(selector: NamespaceSelector) -> Self {
        Self {
            selector: Some(selector),
            state: Mutex::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_namespace(&self, name: impl Into<NamespaceName>, labels: &[(&str, &str)]) {
        let name = name.into();
        let labels = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut state = self.state();
        match state.entry_mut(&name) {
            Some(entry) => entry.labels = labels,
            None => state.namespaces.push(NamespaceEntry {
                name,
                labels,
                pods: Vec::new(),
            }),
        }
    }

    /// Adds a workload, creating an unlabelled namespace if needed.
    pub fn add_workload(&self, workload: Workload) {
        let mut state = self.state();
        match state.entry_mut(&workload.namespace) {
            Some(entry) => entry.pods.push(workload),
            None => state.namespaces.push(NamespaceEntry {
                name: workload.namespace.clone(),
                labels: BTreeMap::new(),
                pods: vec![workload],
            }),
        }
    }

    pub fn fail_namespace_listing(&self, fail: bool) {
        self.state().fail_namespace_listing = fail;
    }

    pub fn fail_listing_in(&self, namespace: impl Into<NamespaceName>) {
        self.state().fail_listing_in.insert(namespace.into());
    }

    pub fn fail_delete(&self, namespace: impl Into<NamespaceName>, pod: impl Into<PodName>) {
        self.state()
            .fail_delete
            .insert((namespace.into(), pod.into()));
    }

    /// Every delete call, successful or not, in call order.
    pub fn delete_attempts(&self) -> Vec<(NamespaceName, PodName)> {
        self.state().delete_attempts.clone()
    }

    pub fn deleted(&self) -> Vec<(NamespaceName, PodName)> {
        self.state().deleted.clone()
    }

    pub fn remaining(&self, namespace: &NamespaceName) -> Vec<PodName> {
        let state = self.state();
        state
            .namespaces
            .iter()
            .find(|ns| &ns.name == namespace)
            .map(|ns| ns.pods.iter().map(|p| p.name.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Cluster for InMemoryCluster {
    async fn list_managed_namespaces(&self) -> Result<Vec<ManagedNamespace>, ClusterError> {
        let state = self.state();
        if state.fail_namespace_listing {
            return Err(ClusterError::api("list namespaces", "injected failure"));
        }
        Ok(state
            .namespaces
            .iter()
            .filter(|ns| {
                self.selector
                    .as_ref()
                    .is_none_or(|sel| sel.matches(ns.name.as_str(), &ns.labels))
            })
            .map(|ns| ManagedNamespace::new(ns.name.clone()))
            .collect())
    }

    async fn list_workloads(
        &self,
        namespace: &NamespaceName,
    ) -> Result<Vec<Workload>, ClusterError> {
        let state = self.state();
        if state.fail_listing_in.contains(namespace) {
            return Err(ClusterError::api(
                "list pods",
                format!("injected failure in {namespace}"),
            ));
        }
        Ok(state
            .namespaces
            .iter()
            .find(|ns| &ns.name == namespace)
            .map(|ns| ns.pods.clone())
            .unwrap_or_default())
    }

    async fn delete_workload(
        &self,
        namespace: &NamespaceName,
        pod: &PodName,
    ) -> Result<(), ClusterError> {
        let mut state = self.state();
        let key = (namespace.clone(), pod.clone());
        state.delete_attempts.push(key.clone());

        if state.fail_delete.contains(&key) {
            return Err(ClusterError::api(
                "delete pod",
                format!("injected failure for {namespace}/{pod}"),
            ));
        }

        let not_found = || ClusterError::NotFound {
            kind: "pod",
            name: format!("{namespace}/{pod}"),
        };
        let entry = state.entry_mut(namespace).ok_or_else(not_found)?;
        let idx = entry
            .pods
            .iter()
            .position(|p| &p.name == pod)
            .ok_or_else(not_found)?;
        entry.pods.remove(idx);
        state.deleted.push(key);
        Ok(())
    }
}
