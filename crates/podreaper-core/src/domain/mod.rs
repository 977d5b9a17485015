//! Domain model (names, workloads, policies, events, results).
//!
//! - ids: 型付きの namespace / pod 名
//! - workload: クラスタ状態のスナップショット
//! - window / ttl: 削除ポリシー（純粋関数）
//! - events / summary: 1 pass の記録

pub mod errors;
pub mod events;
pub mod ids;
pub mod summary;
pub mod ttl;
pub mod window;
pub mod workload;

pub use errors::ReconcileError;
pub use events::{DeletionCause, ReapEvent};
pub use ids::{NamespaceName, PodName};
pub use summary::ReconcileSummary;
pub use ttl::{DEFAULT_EXPIRY_ANNOTATION, ExpiryCheck, TtlParseError, TtlPolicy, check_expiry};
pub use window::{
    AutoDeleteWindow, DEFAULT_WINDOW_TOLERANCE, TimeOfDay, WindowError,
    is_within_auto_delete_window,
};
pub use workload::{ManagedNamespace, NamespaceSelector, Workload};
