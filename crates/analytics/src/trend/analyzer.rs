#![forbid(unsafe_code)]

use crate::domain::{HistoricalSnapshot, HistoryContainer, SummaryStats, days_between};
use crate::trend::{TrendAnalysis, TrendDirection};
use chrono::TimeDelta;
use config::Config;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct TrendAnalyzer {
    thresholds: config::Trend,
}

impl TrendAnalyzer {
    pub fn new(config: &Config) -> Self {
        Self {
            thresholds: config.trend.clamp(),
        }
    }

    /// Map a week-over-week percentage-point delta to a direction.
    pub fn classify(&self, weekly_delta: f64) -> TrendDirection {
        let t = &self.thresholds;
        if weekly_delta > t.accelerating {
            TrendDirection::Accelerating
        } else if weekly_delta > t.steady {
            TrendDirection::Steady
        } else if weekly_delta > t.stalled {
            TrendDirection::Stalled
        } else {
            TrendDirection::Declining
        }
    }

    /// Analyze a chronologically ordered run of snapshots.
    pub fn analyze(&self, snapshots: &[HistoricalSnapshot]) -> TrendAnalysis {
        let Some(latest) = snapshots.last() else {
            return TrendAnalysis::default();
        };

        let mut analysis = TrendAnalysis {
            velocity_7: velocity(snapshots, 7),
            velocity_30: velocity(snapshots, 30),
            velocity_60: velocity(snapshots, 60),
            velocity_90: velocity(snapshots, 90),
            current_percentage: latest.enrollment_percentage(),
            ..Default::default()
        };

        let Some(week_ago) = baseline_index(snapshots, 7) else {
            return analysis;
        };
        let base = &snapshots[week_ago];
        analysis.week_over_week_change =
            analysis.current_percentage - base.enrollment_percentage();
        analysis.trend = self.classify(analysis.week_over_week_change);

        let previous = &snapshots[..=week_ago];
        if baseline_index(previous, 7).is_some() {
            analysis.velocity_change = Some(analysis.velocity_7 - velocity(previous, 7));
        }

        trace!(
            snapshots = snapshots.len(),
            trend = ?analysis.trend,
            weekly_delta = analysis.week_over_week_change,
            "trend analyzed"
        );
        analysis
    }

    /// The run used for analysis: real snapshots when there are any,
    /// otherwise everything recorded.
    pub fn series(history: &HistoryContainer) -> Vec<HistoricalSnapshot> {
        let real: Vec<_> = history.real_snapshots().cloned().collect();
        if real.is_empty() {
            history.snapshots.clone()
        } else {
            real
        }
    }

    pub fn summarize(&self, history: &HistoryContainer) -> SummaryStats {
        let series = Self::series(history);
        let (Some(first), Some(latest)) = (series.first(), series.last()) else {
            return SummaryStats::default();
        };

        let span = days_between(first.timestamp, latest.timestamp);
        let average_daily_velocity = if span > 0.0 {
            (latest.cloud_managed_devices as f64 - first.cloud_managed_devices as f64) / span
        } else {
            0.0
        };
        let estimated_days_to_completion = (average_daily_velocity > 0.0)
            .then(|| (latest.gap() as f64 / average_daily_velocity).ceil() as u64);

        SummaryStats {
            peak_devices: history
                .snapshots
                .iter()
                .map(|s| s.total_devices)
                .max()
                .unwrap_or(0),
            current_devices: latest.total_devices,
            current_percentage: latest.enrollment_percentage(),
            migrated_last_7_days: migrated_since(&series, 7),
            migrated_last_30_days: migrated_since(&series, 30),
            migrated_last_90_days: migrated_since(&series, 90),
            average_daily_velocity,
            trend_direction: self.analyze(&series).trend,
            estimated_days_to_completion,
            snapshot_count: history.snapshots.len(),
            real_snapshot_count: history.real_snapshot_count(),
            days_of_history: history.days_of_history(),
        }
    }
}

/// Index of the newest snapshot taken at or before `days` before the last one.
fn baseline_index(snapshots: &[HistoricalSnapshot], days: i64) -> Option<usize> {
    let latest = snapshots.last()?;
    let cutoff = latest.timestamp - TimeDelta::days(days);
    snapshots.iter().rposition(|s| s.timestamp <= cutoff)
}

fn velocity(snapshots: &[HistoricalSnapshot], days: i64) -> f64 {
    let (Some(latest), Some(ix)) = (snapshots.last(), baseline_index(snapshots, days)) else {
        return 0.0;
    };
    let base = &snapshots[ix];
    let elapsed = days_between(base.timestamp, latest.timestamp);
    if elapsed <= 0.0 {
        return 0.0;
    }
    (latest.cloud_managed_devices as f64 - base.cloud_managed_devices as f64) / elapsed
}

/// Cloud-managed delta over the window, measured from the earliest snapshot
/// when history is shorter than the window.
fn migrated_since(snapshots: &[HistoricalSnapshot], days: i64) -> i64 {
    let Some(latest) = snapshots.last() else {
        return 0;
    };
    let base = baseline_index(snapshots, days)
        .map(|ix| &snapshots[ix])
        .or(snapshots.first())
        .unwrap_or(latest);
    latest.cloud_managed_devices as i64 - base.cloud_managed_devices as i64
}
