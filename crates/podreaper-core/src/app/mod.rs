//! App - アプリケーション層
//!
//! ports を組み合わせて reconcile を実行する。
//!
//! # 主要コンポーネント
//! - **ReconcilerBuilder**: 構築とワイヤリング、起動時検証
//! - **Reconciler**: 1 pass の判定と削除
//! - **ReaperLoop**: 一定間隔で pass を回す常駐ドライバ

pub mod builder;
pub mod reaper_loop;
pub mod reconciler;

pub use self::builder::{BuildError, ReconcilerBuilder};
pub use self::reaper_loop::{LoopStats, ReaperLoop, ReaperLoopHandle};
pub use self::reconciler::Reconciler;
