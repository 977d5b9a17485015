//! Events - reconcile 中に発生したイベント
//!
//! The reconciler reports everything it does through these events instead of
//! logging directly, so the logging sink can be swapped out (see
//! `ports::EventSink`).

use chrono::{DateTime, Utc};

use super::ids::{NamespaceName, PodName};
use super::summary::ReconcileSummary;
use super::ttl::TtlParseError;
use super::window::WindowError;

/// Why a workload was selected for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionCause {
    /// The daily auto-delete window is open.
    Window,
    /// The workload's own expiry annotation has passed.
    Ttl { reason: String },
}

impl DeletionCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletionCause::Window => "auto_delete_window",
            DeletionCause::Ttl { .. } => "ttl_expired",
        }
    }
}

impl std::fmt::Display for DeletionCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeletionCause::Window => f.write_str("auto-delete window reached"),
            DeletionCause::Ttl { reason } => f.write_str(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReapEvent {
    PassStarted {
        at: DateTime<Utc>,
        window_open: bool,
        dry_run: bool,
    },

    /// The auto-delete time could not be parsed; window policy is off for
    /// this pass.
    WindowMisconfigured { error: WindowError },

    /// Namespace enumeration failed; the pass is aborted.
    NamespaceListingFailed { error: String },

    NamespaceSkipped {
        namespace: NamespaceName,
        error: String,
    },

    /// The expiry annotation is unparseable; the workload is treated as having
    /// no TTL.
    MalformedExpiry {
        namespace: NamespaceName,
        pod: PodName,
        error: TtlParseError,
    },

    WorkloadDeleted {
        namespace: NamespaceName,
        pod: PodName,
        cause: DeletionCause,
    },

    /// Dry-run counterpart of `WorkloadDeleted`.
    WouldDelete {
        namespace: NamespaceName,
        pod: PodName,
        cause: DeletionCause,
    },

    DeleteFailed {
        namespace: NamespaceName,
        pod: PodName,
        cause: DeletionCause,
        error: String,
    },

    PassFinished(ReconcileSummary),
}
