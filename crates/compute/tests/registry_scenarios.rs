//! End-to-end behaviour of the registry publishing into a live hub.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use waitwatch_compute::{Registry, SnapshotFilter};
use waitwatch_core::{EventKind, RideReading};
use waitwatch_notify::NotificationHub;

fn t(minutes: i64) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T09:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
        + Duration::minutes(minutes)
}

fn registry_with_hub() -> (Registry, NotificationHub) {
    let hub = NotificationHub::new();
    let registry = Registry::new(Arc::new(hub.clone()));
    (registry, hub)
}

#[tokio::test]
async fn subscriber_sees_ride_reopen() {
    let (registry, hub) = registry_with_hub();
    let mut sub = hub.subscribe(["10"]);

    registry.ingest_at("1", "Test Park", &[RideReading::closed("10", "Ride A")], t(0));
    assert!(sub.try_recv().is_none());

    let report = registry.ingest_at("1", "Test Park", &[RideReading::open("10", "Ride A", 5)], t(5));
    assert_eq!(report.events, 1);

    let event = sub.recv().await.unwrap();
    assert_eq!(event.entity_id, "10");
    assert_eq!(event.entity_name, "Ride A");
    assert_eq!(event.kind, EventKind::Opened);
    assert_eq!(event.current_value, Some(5));
    assert!(sub.try_recv().is_none());
}

#[tokio::test]
async fn unusually_low_reaches_subscriber() {
    let (registry, hub) = registry_with_hub();
    let mut sub = hub.subscribe(Vec::<String>::new());

    for i in 0..3 {
        registry.ingest_at("1", "Test Park", &[RideReading::open("10", "Ride A", 10)], t(i * 5));
    }
    assert!(sub.try_recv().is_none());

    registry.ingest_at("1", "Test Park", &[RideReading::open("10", "Ride A", 5)], t(15));
    let event = sub.recv().await.unwrap();
    assert_eq!(event.kind, EventKind::UnusuallyLow);
    assert_eq!(event.current_value, Some(5));

    let rows = registry.snapshot(Some("1"), &SnapshotFilter::default());
    assert!(rows[0].is_unusually_low);
}

#[test]
fn filtered_subscriber_ignores_other_rides() {
    let (registry, hub) = registry_with_hub();
    let mut sub = hub.subscribe(["10"]);

    registry.ingest_at("1", "Test Park", &[RideReading::closed("11", "Ride B")], t(0));
    registry.ingest_at("1", "Test Park", &[RideReading::open("11", "Ride B", 5)], t(5));
    assert!(sub.try_recv().is_none());
}

#[test]
fn bad_reading_does_not_disturb_rest_of_batch() {
    let (registry, hub) = registry_with_hub();
    let mut sub = hub.subscribe(Vec::<String>::new());

    registry.ingest_at("1", "Test Park", &[RideReading::closed("10", "Ride A")], t(0));

    let nameless = RideReading {
        id: None,
        ..RideReading::open("ignored", "No Id", 3)
    };
    let report = registry.ingest_at(
        "1",
        "Test Park",
        &[nameless, RideReading::open("10", "Ride A", 5)],
        t(5),
    );
    assert_eq!(report.skipped, 1);
    assert_eq!(report.applied, 1);
    assert_eq!(sub.try_recv().map(|e| e.kind), Some(EventKind::Opened));
    assert_eq!(registry.ride_count(), 1);
}

#[test]
fn dropped_subscription_is_pruned_from_hub() {
    let (registry, hub) = registry_with_hub();
    let sub = hub.subscribe(["10"]);
    drop(sub);

    registry.ingest_at("1", "Test Park", &[RideReading::closed("10", "Ride A")], t(0));
    let report = registry.ingest_at("1", "Test Park", &[RideReading::open("10", "Ride A", 5)], t(5));
    assert_eq!(report.events, 1);
    assert_eq!(hub.subscriber_count(), 0);
}

#[test]
fn parks_keep_separate_state() {
    let (registry, _hub) = registry_with_hub();
    registry.ingest_at("1", "Park One", &[RideReading::open("10", "Shared Id", 30)], t(0));
    registry.ingest_at("2", "Park Two", &[RideReading::closed("10", "Shared Id")], t(0));

    let one = registry.snapshot(Some("1"), &SnapshotFilter::default());
    let two = registry.snapshot(Some("2"), &SnapshotFilter::default());
    assert!(one[0].is_open);
    assert!(!two[0].is_open);
    assert_eq!(registry.snapshot(None, &SnapshotFilter::open(true)).len(), 1);
}
