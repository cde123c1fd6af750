#![forbid(unsafe_code)]

use crate::domain::{DeviceCounts, HistoricalSnapshot, HistoryContainer};
use chrono::{DateTime, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub label: String,
    pub date: DateTime<Utc>,
    pub total_devices: u64,
    pub cloud_managed_devices: u64,
    pub config_mgr_only_devices: u64,
    pub cloud_native_devices: u64,
    pub enrollment_percentage: f64,
    pub is_projected: bool,
}

impl TrendPoint {
    fn new(label: String, date: DateTime<Utc>, counts: DeviceCounts, is_projected: bool) -> Self {
        Self {
            label,
            date,
            total_devices: counts.total,
            cloud_managed_devices: counts.cloud_managed,
            config_mgr_only_devices: counts.config_mgr_only,
            cloud_native_devices: counts.cloud_native,
            enrollment_percentage: counts.enrollment_percentage(),
            is_projected,
        }
    }
}

/// How trustworthy the plotted points are, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub is_projected: bool,
    pub real_snapshot_count: usize,
    pub days_of_history: f64,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendData {
    pub points: Vec<TrendPoint>,
    pub quality: DataQuality,
}

/// Monthly trend points for charts.
///
/// With enough real history, one recorded snapshot is picked per month
/// (closest to the same day `months` back through today) and a trailing
/// point for `current` is added when the newest pick is older than
/// `stale_after`. Otherwise the curve is a projection from zero to
/// `current` and is flagged as such.
pub fn build_trend_data(
    history: &HistoryContainer,
    current: DeviceCounts,
    now: DateTime<Utc>,
    policy: &config::History,
) -> TrendData {
    let real_snapshot_count = history.real_snapshot_count();
    let days_of_history = history.days_of_history();
    let sufficient =
        history.has_sufficient_history(policy.min_history_days, policy.min_real_snapshots);

    if !sufficient {
        let explanation = if real_snapshot_count < policy.min_real_snapshots {
            format!(
                "Only {real_snapshot_count} real snapshot(s) recorded, {} needed. \
                 The curve is a linear projection from zero to today's counts.",
                policy.min_real_snapshots
            )
        } else {
            format!(
                "Recorded history spans {days_of_history:.1} days, {} needed. \
                 The curve is a linear projection from zero to today's counts.",
                policy.min_history_days
            )
        };
        return TrendData {
            points: projected_points(current, now, policy.trend_months),
            quality: DataQuality {
                is_projected: true,
                real_snapshot_count,
                days_of_history,
                explanation,
            },
        };
    }

    let real: Vec<&HistoricalSnapshot> = history.real_snapshots().collect();
    let mut picked: Vec<usize> = Vec::new();
    for back in (0..=policy.trend_months).rev() {
        let target = month_back(now, back);
        if let Some(ix) = closest(&real, target)
            && picked.last() != Some(&ix)
        {
            picked.push(ix);
        }
    }

    let mut points: Vec<TrendPoint> = picked
        .iter()
        .map(|&ix| {
            let snapshot = real[ix];
            TrendPoint::new(
                snapshot.timestamp.format("%b %Y").to_string(),
                snapshot.timestamp,
                snapshot.counts(),
                false,
            )
        })
        .collect();

    let stale_after = TimeDelta::from_std(policy.stale_after).unwrap_or(TimeDelta::days(1));
    if points.last().is_none_or(|p| now - p.date > stale_after) {
        points.push(TrendPoint::new("Current".into(), now, current, false));
    }

    TrendData {
        points,
        quality: DataQuality {
            is_projected: false,
            real_snapshot_count,
            days_of_history,
            explanation: format!(
                "Based on {real_snapshot_count} recorded snapshots spanning \
                 {days_of_history:.0} days."
            ),
        },
    }
}

fn month_back(now: DateTime<Utc>, back: u32) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(back)).unwrap_or(now)
}

fn closest(snapshots: &[&HistoricalSnapshot], target: DateTime<Utc>) -> Option<usize> {
    snapshots
        .iter()
        .enumerate()
        .min_by_key(|(_, s)| (s.timestamp - target).num_seconds().abs())
        .map(|(ix, _)| ix)
}

/// `months + 1` buckets interpolated from zero to `current`. Cloud-native
/// devices grow faster than cloud-managed ones (a 30% baseline plus 70%
/// linear) but never exceed them.
fn projected_points(current: DeviceCounts, now: DateTime<Utc>, months: u32) -> Vec<TrendPoint> {
    let steps = months.max(1);
    (0..=steps)
        .map(|i| {
            let f = f64::from(i) / f64::from(steps);
            let cloud_managed = (current.cloud_managed as f64 * f).round() as u64;
            let native_share = 0.3 + 0.7 * f;
            let cloud_native =
                ((current.cloud_native as f64 * native_share).round() as u64).min(cloud_managed);
            let config_mgr_only = current
                .config_mgr_only
                .saturating_add(current.cloud_managed - cloud_managed)
                .min(current.total);
            let date = month_back(now, steps - i);
            let label = if i == steps {
                "Current".to_string()
            } else {
                date.format("%b %Y").to_string()
            };
            let counts =
                DeviceCounts::new(current.total, cloud_managed, config_mgr_only, cloud_native);
            TrendPoint::new(label, date, counts, true)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap() + TimeDelta::days(day)
    }

    fn policy() -> config::History {
        config::History::default()
    }

    fn history(points: &[(i64, u64, bool)]) -> HistoryContainer {
        let mut history = HistoryContainer::new(at(0));
        for &(day, cloud, real) in points {
            history.snapshots.push(HistoricalSnapshot::new(
                at(day),
                DeviceCounts::new(1000, cloud, 1000 - cloud, cloud / 2),
                real,
            ));
        }
        history
    }

    #[test]
    fn projection_runs_from_zero_to_current() {
        let current = DeviceCounts::new(1000, 600, 400, 300);
        let data = build_trend_data(&history(&[]), current, at(0), &policy());
        assert!(data.quality.is_projected);
        assert_eq!(data.points.len(), 7);
        let first = &data.points[0];
        let last = &data.points[6];
        assert_eq!(first.cloud_managed_devices, 0);
        assert_eq!(first.cloud_native_devices, 0);
        assert_eq!(last.cloud_managed_devices, 600);
        assert_eq!(last.cloud_native_devices, 300);
        assert_eq!(last.label, "Current");
        assert!(data.points.iter().all(|p| p.is_projected));
        assert!(
            data.points
                .iter()
                .all(|p| p.cloud_native_devices <= p.cloud_managed_devices)
        );
        // native devices run ahead of linear growth mid-curve
        assert_eq!(data.points[3].cloud_native_devices, 195);
    }

    #[test]
    fn mock_snapshots_do_not_count_as_history() {
        let h = history(&[(0, 100, false), (10, 200, false), (20, 300, true)]);
        let current = DeviceCounts::new(1000, 300, 700, 0);
        let data = build_trend_data(&h, current, at(20), &policy());
        assert!(data.quality.is_projected);
        assert_eq!(data.quality.real_snapshot_count, 1);
    }

    #[test]
    fn real_history_picks_one_snapshot_per_month() {
        let points: Vec<(i64, u64, bool)> = (0..=200)
            .step_by(5)
            .map(|d| (d, d as u64, true))
            .collect();
        let h = history(&points);
        let now = at(200);
        let current = DeviceCounts::new(1000, 200, 800, 100);
        let data = build_trend_data(&h, current, now, &policy());
        assert!(!data.quality.is_projected);
        assert_eq!(data.points.len(), 7);
        assert_eq!(data.points.last().map(|p| p.date), Some(now));
        assert!(data.points.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn stale_history_gets_current_point() {
        let h = history(&[(0, 100, true), (8, 200, true)]);
        let current = DeviceCounts::new(1000, 250, 750, 0);
        let data = build_trend_data(&h, current, at(12), &policy());
        assert!(!data.quality.is_projected);
        assert_eq!(data.points.len(), 3);
        let last = data.points.last().unwrap();
        assert_eq!(last.label, "Current");
        assert_eq!(last.cloud_managed_devices, 250);
    }
}
