//! ReaperLoop - 一定間隔で reconcile pass を回す常駐ドライバ
//!
//! # フロー
//! 1. 起動直後に 1 pass（再起動後の取りこぼしを回収）
//! 2. 以後 `interval` ごとに 1 pass
//! 3. pass のエラーはログに残してループは継続（次の pass が実質的なリトライ）
//! 4. shutdown は pass と pass の間でだけ判定する（pass の途中では止めない）
//!
//! 間隔は reconciler が build 時に検証済みの poll interval をそのまま使う。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::builder::{BuildError, check_poll_interval};
use super::reconciler::Reconciler;
use crate::ports::{Clock, Cluster, EventSink};

/// Pass counters for one loop lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub passes: u64,
    pub failed_passes: u64,
    pub deleted: u64,
}

pub struct ReaperLoop<C, K, S> {
    reconciler: Arc<Reconciler<C, K, S>>,
    interval: Duration,
}

impl<C, K, S> ReaperLoop<C, K, S>
where
    C: Cluster + 'static,
    K: Clock + 'static,
    S: EventSink + 'static,
{
    /// Fails when the reconciler was built for one-shot use (no poll
    /// interval).
    pub fn new(reconciler: Arc<Reconciler<C, K, S>>) -> Result<Self, BuildError> {
        let interval = reconciler
            .poll_interval()
            .ok_or(BuildError::MissingPollInterval)?;
        check_poll_interval(reconciler.window.as_ref(), interval)?;
        Ok(Self {
            reconciler,
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run on the current task until `shutdown` flips to `true` or its
    /// sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> LoopStats {
        info!(interval_secs = self.interval.as_secs(), "reaper loop started");

        let mut stats = LoopStats::default();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    // sender dropped もシャットダウン扱い
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            stats.passes += 1;
            match self.reconciler.reconcile_all().await {
                Ok(summary) => stats.deleted += summary.deleted as u64,
                Err(e) => {
                    stats.failed_passes += 1;
                    error!(error = %e, "reconcile pass failed, retrying next tick");
                }
            }
        }

        info!(passes = stats.passes, "reaper loop stopped");
        stats
    }

    /// Spawn the loop on the tokio runtime.
    pub fn spawn(self) -> ReaperLoopHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(shutdown_rx));
        ReaperLoopHandle { shutdown_tx, join }
    }
}

/// Handle to a spawned loop.
/// - `shutdown_tx` を drop するとループも止まる
pub struct ReaperLoopHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<LoopStats>,
}

impl ReaperLoopHandle {
    /// Ask the loop to stop after the current pass.
    pub fn request_shutdown(&self) {
        // ignore send error: the loop may already have exited
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) -> LoopStats {
        self.request_shutdown();
        self.join.await.unwrap_or_else(|e| {
            error!(error = %e, "reaper loop task panicked");
            LoopStats::default()
        })
    }
}
