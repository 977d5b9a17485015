//! TracingEventSink - イベントを `tracing` の構造化ログに変換する

use tracing::{debug, error, info, warn};

use crate::domain::ReapEvent;
use crate::ports::EventSink;

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: ReapEvent) {
        match event {
            ReapEvent::PassStarted {
                at,
                window_open,
                dry_run,
            } => debug!(%at, window_open, dry_run, "reconcile pass started"),
            ReapEvent::WindowMisconfigured { error } => {
                warn!(error = %error, "auto-delete window disabled for this pass")
            }
            ReapEvent::NamespaceListingFailed { error } => {
                error!(error = %error, "failed to list managed namespaces, aborting pass")
            }
            ReapEvent::NamespaceSkipped { namespace, error } => {
                warn!(%namespace, error = %error, "failed to list pods, skipping namespace")
            }
            ReapEvent::MalformedExpiry {
                namespace,
                pod,
                error,
            } => warn!(%namespace, %pod, error = %error, "ignoring malformed expiry annotation"),
            ReapEvent::WorkloadDeleted {
                namespace,
                pod,
                cause,
            } => info!(%namespace, %pod, cause = cause.as_str(), detail = %cause, "deleted pod"),
            ReapEvent::WouldDelete {
                namespace,
                pod,
                cause,
            } => info!(%namespace, %pod, cause = cause.as_str(), detail = %cause, "dry run: would delete pod"),
            ReapEvent::DeleteFailed {
                namespace,
                pod,
                cause,
                error,
            } => warn!(%namespace, %pod, cause = cause.as_str(), error = %error, "failed to delete pod"),
            ReapEvent::PassFinished(summary) => {
                if summary.deleted > 0 || summary.has_failures() {
                    info!(
                        examined = summary.examined,
                        deleted = summary.deleted,
                        delete_failed = summary.delete_failed,
                        namespaces_skipped = summary.namespaces_skipped,
                        "{}",
                        summary.summary()
                    );
                } else {
                    debug!(examined = summary.examined, "{}", summary.summary());
                }
            }
        }
    }
}
