//! Domain identifiers (strongly-typed names).
//!
//! Kubernetes では namespace 名も pod 名もただの文字列ですが、
//! 取り違えると別テナントの pod を消しかねないので型で区別します。
//!
//! ## Phantom Type パターン
//! `Name<T>` で共通実装を持ち、`T` はマーカー型（実行時には存在しない）。
//! `NamespaceName` と `PodName` はコンパイル時に混同できません。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// NameMarker は各 Name 型のマーカー trait
pub trait NameMarker: Send + Sync + 'static {
    /// ログなどで使う種別名（"namespace", "pod"）
    fn kind() -> &'static str;
}

/// ジェネリック Name 型
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name<T: NameMarker> {
    value: String,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: NameMarker> Name<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// マーカーの種別名
    pub fn kind(&self) -> &'static str {
        T::kind()
    }
}

impl<T: NameMarker> From<&str> for Name<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T: NameMarker> From<String> for Name<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T: NameMarker> AsRef<str> for Name<T> {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl<T: NameMarker> fmt::Display for Name<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

// ========================================
// マーカー型の定義
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {}

impl NameMarker for Namespace {
    fn kind() -> &'static str {
        "namespace"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pod {}

impl NameMarker for Pod {
    fn kind() -> &'static str {
        "pod"
    }
}

/// Name of a managed (per-user) namespace.
pub type NamespaceName = Name<Namespace>;

/// Name of a workload (pod) inside a namespace.
pub type PodName = Name<Pod>;
