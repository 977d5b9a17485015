//! ReconcilerBuilder - reconciler の構築とワイヤリング
//!
//! # 起動時検証（Fail-fast 設計）
//! - window の長さ（tolerance）が poll 間隔より短いと、その日の window を
//!   丸ごと取りこぼすことがある。ループ運用ではこれを build() で弾く。
//! - CronJob のような単発実行では poll 間隔を設定しないので検証しない。

use std::time::Duration;

use chrono_tz::Tz;

use super::reconciler::Reconciler;
use crate::config::ReaperConfig;
use crate::domain::{AutoDeleteWindow, DEFAULT_EXPIRY_ANNOTATION};
use crate::impls::TracingEventSink;
use crate::ports::{Clock, Cluster, EventSink, SystemClock};

/// BuildError は reconciler 構築時のエラー
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error(
        "auto-delete window tolerance {tolerance:?} is shorter than the poll interval {poll_interval:?}; the window could be missed"
    )]
    ToleranceBelowPollInterval {
        tolerance: Duration,
        poll_interval: Duration,
    },

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("reconciler was built without a poll interval; set one to run it in a loop")]
    MissingPollInterval,

    #[error("expiry annotation key must not be empty")]
    EmptyExpiryAnnotation,
}

/// # 使用例
/// ```ignore
/// let reconciler = ReconcilerBuilder::new(cluster)
///     .with_config(&config)
///     .poll_interval(config.poll_interval())
///     .build()?;
/// ```
///
/// Clock と EventSink のデフォルトは `SystemClock` と `TracingEventSink`。
/// window はデフォルトで無効（TTL のみ）。
pub struct ReconcilerBuilder<C, K = SystemClock, S = TracingEventSink> {
    cluster: C,
    clock: K,
    sink: S,
    window: Option<AutoDeleteWindow<Tz>>,
    expiry_annotation: String,
    dry_run: bool,
    poll_interval: Option<Duration>,
}

impl<C: Cluster> ReconcilerBuilder<C> {
    pub fn new(cluster: C) -> Self {
        Self {
            cluster,
            clock: SystemClock,
            sink: TracingEventSink,
            window: None,
            expiry_annotation: DEFAULT_EXPIRY_ANNOTATION.to_string(),
            dry_run: false,
            poll_interval: None,
        }
    }
}

impl<C: Cluster, K: Clock, S: EventSink> ReconcilerBuilder<C, K, S> {
    pub fn clock<K2: Clock>(self, clock: K2) -> ReconcilerBuilder<C, K2, S> {
        ReconcilerBuilder {
            cluster: self.cluster,
            clock,
            sink: self.sink,
            window: self.window,
            expiry_annotation: self.expiry_annotation,
            dry_run: self.dry_run,
            poll_interval: self.poll_interval,
        }
    }

    pub fn event_sink<S2: EventSink>(self, sink: S2) -> ReconcilerBuilder<C, K, S2> {
        ReconcilerBuilder {
            cluster: self.cluster,
            clock: self.clock,
            sink,
            window: self.window,
            expiry_annotation: self.expiry_annotation,
            dry_run: self.dry_run,
            poll_interval: self.poll_interval,
        }
    }

    pub fn auto_delete_window(mut self, window: AutoDeleteWindow<Tz>) -> Self {
        self.window = Some(window);
        self
    }

    pub fn expiry_annotation(mut self, key: impl Into<String>) -> Self {
        self.expiry_annotation = key.into();
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Declare the driver's poll interval so `build` can validate it against
    /// the window tolerance.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Window, annotation key and dry-run flag from a loaded config.
    pub fn with_config(mut self, config: &ReaperConfig) -> Self {
        self.window = config.auto_delete_window();
        self.expiry_annotation = config.expiry_annotation.clone();
        self.dry_run = config.dry_run;
        self
    }

    pub fn build(self) -> Result<Reconciler<C, K, S>, BuildError> {
        if self.expiry_annotation.trim().is_empty() {
            return Err(BuildError::EmptyExpiryAnnotation);
        }
        if let Some(poll_interval) = self.poll_interval {
            check_poll_interval(self.window.as_ref(), poll_interval)?;
        }

        Ok(Reconciler {
            cluster: self.cluster,
            clock: self.clock,
            sink: self.sink,
            window: self.window,
            expiry_annotation: self.expiry_annotation,
            dry_run: self.dry_run,
            poll_interval: self.poll_interval,
        })
    }
}

/// Zero is rejected; with the window enabled the interval must not exceed its
/// tolerance.
pub(crate) fn check_poll_interval(
    window: Option<&AutoDeleteWindow<Tz>>,
    poll_interval: Duration,
) -> Result<(), BuildError> {
    if poll_interval.is_zero() {
        return Err(BuildError::ZeroPollInterval);
    }
    if let Some(window) = window
        && window.tolerance() < poll_interval
    {
        return Err(BuildError::ToleranceBelowPollInterval {
            tolerance: window.tolerance(),
            poll_interval,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryCluster;

    fn window(tolerance_secs: u64) -> AutoDeleteWindow<Tz> {
        AutoDeleteWindow::new("23:00", Tz::UTC, Duration::from_secs(tolerance_secs))
    }

    #[test]
    fn test_build_success() {
        let r = ReconcilerBuilder::new(InMemoryCluster::new())
            .auto_delete_window(window(120))
            .poll_interval(Duration::from_secs(60))
            .build();
        assert!(r.is_ok());
    }

    #[test]
    fn test_build_rejects_poll_interval_longer_than_window() {
        let r = ReconcilerBuilder::new(InMemoryCluster::new())
            .auto_delete_window(window(120))
            .poll_interval(Duration::from_secs(300))
            .build();
        assert!(matches!(
            r,
            Err(BuildError::ToleranceBelowPollInterval { poll_interval, .. })
                if poll_interval == Duration::from_secs(300)
        ));
    }

    #[test]
    fn test_build_one_shot_skips_interval_check() {
        let r = ReconcilerBuilder::new(InMemoryCluster::new())
            .auto_delete_window(window(1))
            .build();
        assert!(r.is_ok());
    }

    #[test]
    fn test_build_without_window_ignores_tolerance() {
        let r = ReconcilerBuilder::new(InMemoryCluster::new())
            .poll_interval(Duration::from_secs(3600))
            .build();
        assert!(r.is_ok());
    }

    #[test]
    fn test_build_rejects_zero_interval_and_empty_annotation() {
        let r = ReconcilerBuilder::new(InMemoryCluster::new())
            .poll_interval(Duration::ZERO)
            .build();
        assert!(matches!(r, Err(BuildError::ZeroPollInterval)));

        let r = ReconcilerBuilder::new(InMemoryCluster::new())
            .expiry_annotation(" ")
            .build();
        assert!(matches!(r, Err(BuildError::EmptyExpiryAnnotation)));
    }

    #[test]
    fn test_with_config_applies_policy() {
        let config = ReaperConfig {
            dry_run: true,
            expiry_annotation: "example.com/ttl".into(),
            auto_delete_enabled: false,
            ..ReaperConfig::default()
        };
        let r = ReconcilerBuilder::new(InMemoryCluster::new())
            .with_config(&config)
            .build()
            .unwrap();
        assert!(r.is_dry_run());
        assert!(r.window.is_none());
        assert_eq!(r.expiry_annotation, "example.com/ttl");
    }
}
