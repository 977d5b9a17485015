use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use chrono_tz::Tz;
use podreaper_core::app::{ReaperLoop, ReconcilerBuilder};
use podreaper_core::domain::{
    AutoDeleteWindow, DEFAULT_EXPIRY_ANNOTATION, NamespaceName, NamespaceSelector, Workload,
};
use podreaper_core::impls::{CapturingEventSink, InMemoryCluster};
use podreaper_core::ports::FixedClock;
use podreaper_core::{ReapEvent, ReaperConfig};

fn cluster() -> Arc<InMemoryCluster> {
    let config = ReaperConfig::default();
    let cluster = Arc::new(InMemoryCluster::with_selector(config.namespace_selector()));
    cluster.add_namespace("user-alice", &[("podreaper.io/managed", "true")]);
    cluster.add_namespace("user-bob", &[("podreaper.io/managed", "true")]);
    cluster.add_namespace("kube-system", &[]);
    cluster.add_workload(
        Workload::new("user-alice", "notebook-0")
            .with_annotation(DEFAULT_EXPIRY_ANNOTATION, "2024-03-01T08:00:00Z"),
    );
    cluster.add_workload(Workload::new("user-bob", "notebook-0"));
    cluster.add_workload(Workload::new("kube-system", "coredns"));
    cluster
}

#[tokio::test]
async fn loop_deletes_expired_then_window_and_stops_on_shutdown() {
    let cluster = cluster();
    let sink = Arc::new(CapturingEventSink::new());
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
    ));

    let reconciler = ReconcilerBuilder::new(cluster.clone())
        .clock(clock.clone())
        .event_sink(sink.clone())
        .auto_delete_window(AutoDeleteWindow::new(
            "23:00",
            Tz::UTC,
            Duration::from_secs(120),
        ))
        .poll_interval(Duration::from_millis(10))
        .build()
        .unwrap();

    let handle = ReaperLoop::new(Arc::new(reconciler)).unwrap().spawn();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // TTL pass: only alice's notebook is gone, bob's has no TTL
    assert!(cluster.remaining(&NamespaceName::new("user-alice")).is_empty());
    assert_eq!(cluster.remaining(&NamespaceName::new("user-bob")).len(), 1);

    // window opens: bob's notebook goes too, unmanaged namespace untouched
    clock.set(Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 30).unwrap());
    tokio::time::sleep(Duration::from_millis(50)).await;

    let stats = handle.shutdown_and_join().await;

    assert!(stats.passes >= 2);
    assert_eq!(stats.failed_passes, 0);
    assert_eq!(stats.deleted, 2);
    assert!(cluster.remaining(&NamespaceName::new("user-bob")).is_empty());
    assert_eq!(cluster.remaining(&NamespaceName::new("kube-system")).len(), 1);
    assert_eq!(
        sink.count(|e| matches!(e, ReapEvent::WorkloadDeleted { .. })),
        2
    );
}

#[tokio::test]
async fn loop_survives_failed_passes() {
    let cluster = Arc::new(InMemoryCluster::with_selector(NamespaceSelector::from_label(
        "managed", "user-",
    )));
    cluster.fail_namespace_listing(true);

    let reconciler = ReconcilerBuilder::new(cluster.clone())
        .event_sink(Arc::new(CapturingEventSink::new()))
        .poll_interval(Duration::from_millis(5))
        .build()
        .unwrap();
    let handle = ReaperLoop::new(Arc::new(reconciler)).unwrap().spawn();
    tokio::time::sleep(Duration::from_millis(30)).await;

    cluster.fail_namespace_listing(false);
    tokio::time::sleep(Duration::from_millis(30)).await;

    let stats = handle.shutdown_and_join().await;
    assert!(stats.failed_passes >= 1);
    assert!(stats.passes > stats.failed_passes);
}
