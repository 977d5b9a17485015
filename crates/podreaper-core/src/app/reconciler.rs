//! Reconciler - 1 pass 分の削除判定と実行
//!
//! # フロー
//! 1. Clock から現在時刻を 1 回だけ取得し、window 判定も 1 回だけ行う
//! 2. managed namespace を列挙（失敗したら pass 全体を中断）
//! 3. namespace ごとに pod を列挙（失敗したらその namespace だけ skip）
//! 4. pod ごとに window → TTL の順で判定し、該当すれば削除
//! 5. 削除失敗は記録して次の pod へ（リトライは次の pass に任せる）
//!
//! No state survives a pass. A pod whose deletion failed is simply evaluated
//! again next time.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::domain::{
    AutoDeleteWindow, DeletionCause, ExpiryCheck, NamespaceName, ReapEvent, ReconcileError,
    ReconcileSummary, Workload, check_expiry,
};
use crate::ports::{Clock, Cluster, EventSink};

/// Runs reconciliation passes against a cluster.
///
/// Built with `ReconcilerBuilder`.
pub struct Reconciler<C, K, S> {
    pub(crate) cluster: C,
    pub(crate) clock: K,
    pub(crate) sink: S,
    pub(crate) window: Option<AutoDeleteWindow<Tz>>,
    pub(crate) expiry_annotation: String,
    pub(crate) dry_run: bool,
    /// Validated against the window tolerance by the builder.
    pub(crate) poll_interval: Option<Duration>,
}

impl<C: Cluster, K: Clock, S: EventSink> Reconciler<C, K, S> {
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Loop period, if the reconciler was built for continuous mode.
    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval
    }

    /// Run one full pass over every managed namespace.
    ///
    /// Only a failure to enumerate namespaces is returned as an error. All
    /// other problems are reported through the event sink and counted in the
    /// summary.
    pub async fn reconcile_all(&self) -> Result<ReconcileSummary, ReconcileError> {
        let started = Instant::now();
        let now = self.clock.now();

        let window = self.window.as_ref().map(|w| w.is_open(now));
        let window_open = matches!(window, Some(Ok(true)));

        self.sink.emit(ReapEvent::PassStarted {
            at: now,
            window_open,
            dry_run: self.dry_run,
        });
        if let Some(Err(error)) = window {
            self.sink.emit(ReapEvent::WindowMisconfigured { error });
        }

        let namespaces = match self.cluster.list_managed_namespaces().await {
            Ok(namespaces) => namespaces,
            Err(e) => {
                self.sink.emit(ReapEvent::NamespaceListingFailed {
                    error: e.to_string(),
                });
                return Err(ReconcileError::NamespaceListing(e));
            }
        };

        let mut summary = ReconcileSummary::new(now, window_open, self.dry_run);
        for namespace in &namespaces {
            self.reconcile_namespace(&namespace.name, now, &mut summary).await;
        }

        summary.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.sink.emit(ReapEvent::PassFinished(summary.clone()));
        Ok(summary)
    }

    async fn reconcile_namespace(
        &self,
        namespace: &NamespaceName,
        now: DateTime<Utc>,
        summary: &mut ReconcileSummary,
    ) {
        let workloads = match self.cluster.list_workloads(namespace).await {
            Ok(workloads) => workloads,
            Err(e) => {
                summary.namespaces_skipped += 1;
                self.sink.emit(ReapEvent::NamespaceSkipped {
                    namespace: namespace.clone(),
                    error: e.to_string(),
                });
                return;
            }
        };
        summary.namespaces_scanned += 1;

        for workload in &workloads {
            summary.examined += 1;
            let Some(cause) = self.deletion_cause(namespace, workload, now, summary) else {
                continue;
            };
            self.delete(namespace, workload, cause, summary).await;
        }
    }

    /// Window first; TTL is only parsed when the window is closed.
    fn deletion_cause(
        &self,
        namespace: &NamespaceName,
        workload: &Workload,
        now: DateTime<Utc>,
        summary: &mut ReconcileSummary,
    ) -> Option<DeletionCause> {
        if summary.window_open {
            return Some(DeletionCause::Window);
        }

        match check_expiry(workload.annotation(&self.expiry_annotation), now) {
            ExpiryCheck::Expired { reason, .. } => Some(DeletionCause::Ttl { reason }),
            ExpiryCheck::Malformed(error) => {
                summary.malformed_annotations += 1;
                self.sink.emit(ReapEvent::MalformedExpiry {
                    namespace: namespace.clone(),
                    pod: workload.name.clone(),
                    error,
                });
                None
            }
            ExpiryCheck::NoPolicy | ExpiryCheck::Pending { .. } => None,
        }
    }

    async fn delete(
        &self,
        namespace: &NamespaceName,
        workload: &Workload,
        cause: DeletionCause,
        summary: &mut ReconcileSummary,
    ) {
        let pod = workload.name.clone();

        if self.dry_run {
            summary.record_deleted(&cause);
            self.sink.emit(ReapEvent::WouldDelete {
                namespace: namespace.clone(),
                pod,
                cause,
            });
            return;
        }

        match self.cluster.delete_workload(namespace, &pod).await {
            Ok(()) => {
                summary.record_deleted(&cause);
                self.sink.emit(ReapEvent::WorkloadDeleted {
                    namespace: namespace.clone(),
                    pod,
                    cause,
                });
            }
            Err(e) => {
                summary.delete_failed += 1;
                self.sink.emit(ReapEvent::DeleteFailed {
                    namespace: namespace.clone(),
                    pod,
                    cause,
                    error: e.to_string(),
                });
            }
        }
    }
}
