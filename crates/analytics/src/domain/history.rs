#![forbid(unsafe_code)]

use super::HistoricalSnapshot;
use crate::trend::TrendDirection;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

pub const HISTORY_FORMAT_VERSION: u32 = 1;

/// 16 lowercase hex characters identifying this installation.
pub fn new_installation_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}

/// The persisted document. Snapshots are kept in insertion order, which is
/// also chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryContainer {
    pub format_version: u32,
    pub first_recorded_date: DateTime<Utc>,
    pub last_updated_date: DateTime<Utc>,
    pub installation_id: String,
    #[serde(default)]
    pub snapshots: Vec<HistoricalSnapshot>,
    #[serde(default)]
    pub summary_stats: SummaryStats,
}

impl HistoryContainer {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            format_version: HISTORY_FORMAT_VERSION,
            first_recorded_date: now,
            last_updated_date: now,
            installation_id: new_installation_id(),
            snapshots: Vec::new(),
            summary_stats: SummaryStats::default(),
        }
    }

    pub fn latest(&self) -> Option<&HistoricalSnapshot> {
        self.snapshots.last()
    }

    pub fn real_snapshots(&self) -> impl Iterator<Item = &HistoricalSnapshot> + '_ {
        self.snapshots.iter().filter(|s| s.is_real_data)
    }

    pub fn real_snapshot_count(&self) -> usize {
        self.real_snapshots().count()
    }

    /// Days spanned by real snapshots, first to last.
    pub fn days_of_history(&self) -> f64 {
        let mut real = self.real_snapshots();
        let Some(first) = real.next() else {
            return 0.0;
        };
        let last = real.last().unwrap_or(first);
        days_between(first.timestamp, last.timestamp)
    }

    pub fn has_sufficient_history(&self, min_days: u32, min_real: usize) -> bool {
        self.real_snapshot_count() >= min_real && self.days_of_history() >= f64::from(min_days)
    }

    /// Drop the oldest snapshots until at most `cap` remain. Returns how many
    /// were removed.
    pub fn prune_to(&mut self, cap: usize) -> usize {
        let excess = self.snapshots.len().saturating_sub(cap);
        if excess > 0 {
            self.snapshots.drain(..excess);
        }
        excess
    }

    /// Days since cloud-managed devices last went up. Falls back to the age
    /// of the first snapshot when they never did.
    pub fn days_since_last_increase(&self, now: DateTime<Utc>) -> Option<f64> {
        let last_increase = self
            .snapshots
            .windows(2)
            .rev()
            .find(|pair| pair[1].cloud_managed_devices > pair[0].cloud_managed_devices)
            .map(|pair| pair[1].timestamp);
        let since = last_increase.or_else(|| self.snapshots.first().map(|s| s.timestamp))?;
        Some(days_between(since, now).max(0.0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SummaryStats {
    pub peak_devices: u64,
    pub current_devices: u64,
    pub current_percentage: f64,
    pub migrated_last_7_days: i64,
    pub migrated_last_30_days: i64,
    pub migrated_last_90_days: i64,
    pub average_daily_velocity: f64,
    pub trend_direction: TrendDirection,
    pub estimated_days_to_completion: Option<u64>,
    pub snapshot_count: usize,
    pub real_snapshot_count: usize,
    pub days_of_history: f64,
}

pub(crate) fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / TimeDelta::days(1).num_seconds() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeviceCounts;

    fn at(day: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap() + TimeDelta::days(day)
    }

    fn container(points: &[(i64, u64, bool)]) -> HistoryContainer {
        let mut history = HistoryContainer::new(at(0));
        for &(day, cloud, real) in points {
            history.snapshots.push(HistoricalSnapshot::new(
                at(day),
                DeviceCounts::new(100, cloud, 100 - cloud, 0),
                real,
            ));
        }
        history
    }

    #[test]
    fn installation_id_is_sixteen_hex_chars() {
        let id = new_installation_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn days_of_history_ignores_mock_data() {
        let history = container(&[(0, 1, false), (2, 2, true), (9, 3, true)]);
        assert_eq!(history.real_snapshot_count(), 2);
        assert_eq!(history.days_of_history(), 7.0);
        assert!(history.has_sufficient_history(7, 2));
        assert!(!history.has_sufficient_history(8, 2));
    }

    #[test]
    fn prune_removes_oldest_first() {
        let mut history = container(&[(0, 1, true), (1, 2, true), (2, 3, true)]);
        assert_eq!(history.prune_to(2), 1);
        let clouds: Vec<_> = history
            .snapshots
            .iter()
            .map(|s| s.cloud_managed_devices)
            .collect();
        assert_eq!(clouds, vec![2, 3]);
    }

    #[test]
    fn last_increase_is_found() {
        let history = container(&[(0, 1, true), (1, 5, true), (2, 5, true), (3, 5, true)]);
        assert_eq!(history.days_since_last_increase(at(10)), Some(9.0));
        assert_eq!(HistoryContainer::new(at(0)).days_since_last_increase(at(1)), None);
    }
}
