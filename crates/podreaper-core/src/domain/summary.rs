//! Per-pass result. Not persisted; exists for logs and the `check` command.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::events::DeletionCause;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub dry_run: bool,
    pub window_open: bool,

    pub namespaces_scanned: usize,
    pub namespaces_skipped: usize,

    /// Workloads looked at across all namespaces.
    pub examined: usize,

    /// Successful deletions (or would-be deletions in dry-run).
    pub deleted: usize,
    pub deleted_by_window: usize,
    pub deleted_by_ttl: usize,
    pub delete_failed: usize,

    pub malformed_annotations: usize,
}

impl ReconcileSummary {
    pub fn new(started_at: DateTime<Utc>, window_open: bool, dry_run: bool) -> Self {
        Self {
            started_at,
            duration_ms: 0,
            dry_run,
            window_open,
            namespaces_scanned: 0,
            namespaces_skipped: 0,
            examined: 0,
            deleted: 0,
            deleted_by_window: 0,
            deleted_by_ttl: 0,
            delete_failed: 0,
            malformed_annotations: 0,
        }
    }

    pub(crate) fn record_deleted(&mut self, cause: &DeletionCause) {
        self.deleted += 1;
        match cause {
            DeletionCause::Window => self.deleted_by_window += 1,
            DeletionCause::Ttl { .. } => self.deleted_by_ttl += 1,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.namespaces_skipped > 0 || self.delete_failed > 0
    }

    /// One human-readable line.
    pub fn summary(&self) -> String {
        let action = if self.dry_run { "would delete" } else { "deleted" };
        let mut line = format!(
            "{action} {} of {} pods in {} namespaces ({} by window, {} by ttl) in {}ms",
            self.deleted,
            self.examined,
            self.namespaces_scanned,
            self.deleted_by_window,
            self.deleted_by_ttl,
            self.duration_ms,
        );
        if self.delete_failed > 0 {
            line.push_str(&format!(", {} deletions failed", self.delete_failed));
        }
        if self.namespaces_skipped > 0 {
            line.push_str(&format!(", {} namespaces skipped", self.namespaces_skipped));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn summary_mentions_failures_only_when_present() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut s = ReconcileSummary::new(at, false, false);
        s.examined = 5;
        s.namespaces_scanned = 2;
        s.record_deleted(&DeletionCause::Ttl {
            reason: "expired 1m ago".into(),
        });

        assert_eq!(
            s.summary(),
            "deleted 1 of 5 pods in 2 namespaces (0 by window, 1 by ttl) in 0ms"
        );
        assert!(!s.has_failures());

        s.delete_failed = 1;
        assert!(s.summary().ends_with(", 1 deletions failed"));
        assert!(s.has_failures());
    }

    #[test]
    fn summary_serializes_for_check_output() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let s = ReconcileSummary::new(at, true, true);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["started_at"], "2024-01-01T00:00:00Z");
    }
}
