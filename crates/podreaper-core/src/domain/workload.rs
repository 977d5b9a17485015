//! Cluster state snapshot: managed namespaces and the workloads inside them.
//!
//! These are read-only views re-fetched on every pass. Nothing here is cached
//! between passes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ids::{NamespaceName, PodName};

/// A per-user namespace that belongs to the reaped fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedNamespace {
    pub name: NamespaceName,
}

impl ManagedNamespace {
    pub fn new(name: impl Into<NamespaceName>) -> Self {
        Self { name: name.into() }
    }
}

/// A single pod, as far as the reaper cares about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub namespace: NamespaceName,
    pub name: PodName,

    /// Pod annotations. Only the expiry annotation is interpreted.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl Workload {
    pub fn new(namespace: impl Into<NamespaceName>, name: impl Into<PodName>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            annotations: BTreeMap::new(),
        }
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }
}

/// Which namespaces count as managed: a fixed `key=value` label plus a name
/// prefix.
///
/// Both conditions must hold. The label narrows the API query; the prefix is
/// checked client-side because label selectors cannot express it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceSelector {
    label_key: String,
    label_value: String,
    name_prefix: String,
}

impl NamespaceSelector {
    pub fn new(
        label_key: impl Into<String>,
        label_value: impl Into<String>,
        name_prefix: impl Into<String>,
    ) -> Self {
        Self {
            label_key: label_key.into(),
            label_value: label_value.into(),
            name_prefix: name_prefix.into(),
        }
    }

    /// Parse a `key=value` label. A bare `key` means `key=true`.
    pub fn from_label(label: &str, name_prefix: impl Into<String>) -> Self {
        let (key, value) = match label.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (label.trim(), "true"),
        };
        Self::new(key, value, name_prefix)
    }

    /// Label selector string for the Kubernetes list call.
    pub fn label_selector(&self) -> String {
        format!("{}={}", self.label_key, self.label_value)
    }

    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    pub fn matches_name(&self, name: &str) -> bool {
        name.starts_with(&self.name_prefix)
    }

    pub fn matches(&self, name: &str, labels: &BTreeMap<String, String>) -> bool {
        self.matches_name(name)
            && labels
                .get(&self.label_key)
                .is_some_and(|v| *v == self.label_value)
    }
}
