//! podreaper-core
//!
//! Decision and execution engine that deletes per-user pods once they pass
//! their own expiry annotation or when the daily auto-delete window opens.
//!
//! # モジュール構成
//! - **domain**: 名前・workload・削除ポリシー（window / ttl）・イベント・集計
//! - **ports**: 抽象化レイヤー（Cluster, Clock, EventSink）
//! - **app**: ReconcilerBuilder, Reconciler, ReaperLoop
//! - **impls**: InMemoryCluster, TracingEventSink, CapturingEventSink
//! - **config**: 設定（TOML + 環境変数）

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{BuildError, ReaperLoop, Reconciler, ReconcilerBuilder};
pub use config::{ConfigError, ReaperConfig};
pub use domain::{ReapEvent, ReconcileError, ReconcileSummary};
