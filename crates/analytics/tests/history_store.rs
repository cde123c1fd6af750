#![forbid(unsafe_code)]

use analytics::domain::{DeviceCounts, HistoryContainer};
use analytics::store::{HistoryOrigin, RecordKind};
use analytics::{
    Clock, HistoryRepository, HistoryStore, JsonFileRepository, ManualClock, MemoryRepository,
};
use chrono::{DateTime, TimeDelta, Utc};
use config::Config;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::tempdir;

fn start() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_717_200_000, 0).unwrap()
}

fn memory_store(config: &Config) -> (HistoryStore, Arc<MemoryRepository>, Arc<ManualClock>) {
    let repo = Arc::new(MemoryRepository::default());
    let clock = Arc::new(ManualClock::new(start()));
    let store = HistoryStore::new(repo.clone(), clock.clone(), config);
    (store, repo, clock)
}

#[tokio::test]
async fn fresh_install_starts_empty() {
    let (store, repo, _clock) = memory_store(&Config::default());

    let origin = store.init().await;
    let loaded = store.load_history().await;

    assert_eq!(origin, HistoryOrigin::Created);
    assert!(loaded.history.snapshots.is_empty());
    assert_eq!(loaded.history.installation_id.len(), 16);
    assert!(!loaded.has_sufficient_history);

    // nothing recorded, nothing flushed
    store.close().await;
    assert_eq!(repo.saves(), 0);
}

#[tokio::test]
async fn real_data_replaces_recent_mock_snapshot() {
    let (store, _repo, clock) = memory_store(&Config::default());

    let first = store
        .record_snapshot(DeviceCounts::new(1000, 200, 800, 0), false)
        .await;
    clock.advance(TimeDelta::hours(1));
    let second = store
        .record_snapshot(DeviceCounts::new(1000, 205, 795, 0), true)
        .await;

    assert_eq!(first.kind, RecordKind::Appended);
    assert_eq!(second.kind, RecordKind::UpdatedInPlace);
    let snapshots = store.snapshots().await;
    assert_eq!(snapshots.len(), 1);
    assert!(snapshots[0].is_real_data);
    assert_eq!(snapshots[0].cloud_managed_devices, 205);
    assert_eq!(snapshots[0].timestamp, clock.now());
}

#[tokio::test]
async fn recent_insignificant_change_is_skipped() {
    let (store, repo, clock) = memory_store(&Config::default());

    store
        .record_snapshot(DeviceCounts::new(1000, 200, 800, 0), true)
        .await;
    clock.advance(TimeDelta::hours(1));
    let outcome = store
        .record_snapshot(DeviceCounts::new(1000, 201, 799, 0), true)
        .await;

    assert_eq!(outcome.kind, RecordKind::Skipped);
    assert!(!outcome.committed());
    assert_eq!(repo.saves(), 1);
    let snapshots = store.snapshots().await;
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].cloud_managed_devices, 200);
}

#[tokio::test]
async fn recent_significant_change_updates_in_place() {
    let (store, _repo, clock) = memory_store(&Config::default());

    store
        .record_snapshot(DeviceCounts::new(1000, 200, 800, 0), true)
        .await;
    clock.advance(TimeDelta::hours(2));
    let outcome = store
        .record_snapshot(DeviceCounts::new(1000, 220, 780, 0), true)
        .await;

    assert_eq!(outcome.kind, RecordKind::UpdatedInPlace);
    assert!(outcome.persisted);
    let snapshots = store.snapshots().await;
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].cloud_managed_devices, 220);
}

#[tokio::test]
async fn snapshot_appended_once_interval_elapsed() {
    let (store, _repo, clock) = memory_store(&Config::default());

    store
        .record_snapshot(DeviceCounts::new(1000, 200, 800, 0), true)
        .await;
    clock.advance(TimeDelta::hours(12));
    let outcome = store
        .record_snapshot(DeviceCounts::new(1000, 200, 800, 0), true)
        .await;

    assert_eq!(outcome.kind, RecordKind::Appended);
    assert_eq!(store.snapshots().await.len(), 2);
}

#[tokio::test]
async fn retention_cap_drops_oldest() {
    let (store, _repo, clock) = memory_store(&Config::default());
    let first_timestamp = clock.now();

    for i in 0..731u64 {
        let outcome = store
            .record_snapshot(DeviceCounts::new(1000, i % 1000, 1000 - i % 1000, 0), true)
            .await;
        assert_eq!(outcome.kind, RecordKind::Appended);
        clock.advance(TimeDelta::hours(12));
    }

    let snapshots = store.snapshots().await;
    assert_eq!(snapshots.len(), 730);
    assert_eq!(
        snapshots[0].timestamp,
        first_timestamp + TimeDelta::hours(12)
    );
    assert!(
        snapshots
            .windows(2)
            .all(|pair| pair[0].timestamp < pair[1].timestamp)
    );
}

#[tokio::test]
async fn trend_data_projects_until_history_is_sufficient() {
    let (store, _repo, clock) = memory_store(&Config::default());
    let current = DeviceCounts::new(1000, 400, 600, 100);

    store.record_snapshot(current, true).await;
    assert!(!store.has_sufficient_history().await);
    let projected = store.trend_data(current).await;
    assert!(projected.quality.is_projected);
    assert!(projected.points.iter().all(|p| p.is_projected));
    assert_eq!(
        projected.points.last().map(|p| p.label.as_str()),
        Some("Current")
    );

    clock.advance(TimeDelta::days(8));
    store.record_snapshot(current, true).await;
    assert!(store.has_sufficient_history().await);

    let recorded = store.trend_data(current).await;
    assert!(!recorded.quality.is_projected);
    assert!(recorded.points.iter().all(|p| !p.is_projected));
}

#[tokio::test]
async fn concurrent_records_are_serialized() {
    let (store, repo, _clock) = memory_store(&Config::default());

    let (a, b) = tokio::join!(
        store.record_snapshot(DeviceCounts::new(1000, 200, 800, 0), true),
        store.record_snapshot(DeviceCounts::new(1000, 201, 799, 0), true),
    );

    let kinds = [a.kind, b.kind];
    assert!(kinds.contains(&RecordKind::Appended));
    assert!(kinds.contains(&RecordKind::Skipped));
    assert_eq!(store.snapshots().await.len(), 1);
    assert_eq!(repo.saves(), 1);
}

#[tokio::test]
async fn summary_stats_follow_recorded_history() {
    let (store, _repo, clock) = memory_store(&Config::default());

    for day in 0..=10u64 {
        store
            .record_snapshot(DeviceCounts::new(1000, 100 + day * 20, 900 - day * 20, 0), true)
            .await;
        clock.advance(TimeDelta::days(1));
    }

    let stats = store.summary_stats().await;
    assert_eq!(stats.snapshot_count, 11);
    assert_eq!(stats.real_snapshot_count, 11);
    assert_eq!(stats.current_devices, 1000);
    assert_eq!(stats.migrated_last_7_days, 140);
    assert!((stats.average_daily_velocity - 20.0).abs() < 1e-9);
    assert_eq!(stats.estimated_days_to_completion, Some(35));
}

#[tokio::test]
async fn clear_history_starts_over() {
    let (store, repo, _clock) = memory_store(&Config::default());
    store
        .record_snapshot(DeviceCounts::new(10, 5, 5, 0), true)
        .await;
    let before = store.load_history().await.history.installation_id;

    store.clear_history().await;

    assert!(repo.stored().is_none());
    let after = store.load_history().await;
    assert!(after.history.snapshots.is_empty());
    assert_eq!(after.origin, HistoryOrigin::Created);
    assert_ne!(after.history.installation_id, before);
}

#[tokio::test]
async fn json_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("history.json");
    let config = Config::default();
    let clock = Arc::new(ManualClock::new(start()));

    let store = HistoryStore::new(
        Arc::new(JsonFileRepository::new(&path)),
        clock.clone(),
        &config,
    );
    store
        .record_snapshot(DeviceCounts::new(1000, 250, 750, 40), true)
        .await;
    let written = store.load_history().await.history;
    store.close().await;
    assert!(path.is_file());
    assert!(!path.with_file_name("history.json.tmp").exists());

    let reopened = HistoryStore::new(Arc::new(JsonFileRepository::new(&path)), clock, &config);
    assert_eq!(reopened.init().await, HistoryOrigin::Loaded);
    let loaded = reopened.load_history().await.history;
    assert_eq!(loaded, written);
}

#[tokio::test]
async fn corrupt_file_starts_fresh() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, b"{ not json").unwrap();

    let store = HistoryStore::new(
        Arc::new(JsonFileRepository::new(&path)),
        Arc::new(ManualClock::new(start())),
        &Config::default(),
    );

    assert!(matches!(
        store.init().await,
        HistoryOrigin::Corrupt { .. }
    ));
    let loaded = store.load_history().await;
    assert!(loaded.history.snapshots.is_empty());
    assert!(!loaded.history.installation_id.is_empty());
}

#[tokio::test]
async fn pascal_case_document_is_readable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(
        &path,
        r#"{
            "FormatVersion": 1,
            "FirstRecordedDate": "2024-06-01T00:00:00Z",
            "LastUpdatedDate": "2024-06-02T00:00:00Z",
            "InstallationId": "0123456789abcdef",
            "Snapshots": [
                {
                    "Timestamp": "2024-06-01T00:00:00Z",
                    "TotalDevices": 500,
                    "CloudManagedDevices": 100,
                    "ConfigMgrOnlyDevices": 400,
                    "CloudNativeDevices": 10,
                    "IsRealData": true
                }
            ]
        }"#,
    )
    .unwrap();

    let repo = JsonFileRepository::new(&path);
    let history: HistoryContainer = repo.load().await.unwrap().unwrap();

    assert_eq!(history.installation_id, "0123456789abcdef");
    assert_eq!(history.snapshots.len(), 1);
    assert_eq!(history.snapshots[0].cloud_managed_devices, 100);
    assert!(history.snapshots[0].is_real_data);
}

#[tokio::test]
async fn missing_installation_id_is_treated_as_corrupt() {
    let mut history = HistoryContainer::new(start());
    history.installation_id.clear();
    let store = HistoryStore::new(
        Arc::new(MemoryRepository::with_history(history)),
        Arc::new(ManualClock::new(start())),
        &Config::default(),
    );

    assert!(matches!(
        store.init().await,
        HistoryOrigin::Corrupt { .. }
    ));
    assert_eq!(store.load_history().await.history.installation_id.len(), 16);
}
