//! Impls - ports の実装（開発用・テスト用）
//!
//! - **InMemoryCluster**: 失敗注入できるクラスタ
//! - **TracingEventSink**: 本番用のログ出力
//! - **CapturingEventSink**: テスト用
//!
//! Kubernetes 実装は別クレート `podreaper-kube` に置く。

pub mod capture_sink;
pub mod inmem_cluster;
pub mod tracing_sink;

pub use self::capture_sink::CapturingEventSink;
pub use self::inmem_cluster::InMemoryCluster;
pub use self::tracing_sink::TracingEventSink;
