#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::{path::PathBuf, time::Duration};

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct History {
    /// Optional path to the history document. Falls back to the per-user
    /// data directory when unset.
    pub path: Option<PathBuf>,

    /// Minimum age of the last snapshot before a new one is appended.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub min_interval: Duration,

    /// Relative change (percent) in total or cloud-managed devices that lets
    /// a too-early snapshot overwrite the last one.
    pub significant_change_pct: f64,

    /// Maximum number of snapshots kept; oldest are pruned first.
    pub retention_cap: usize,

    /// Days of real history required before trends stop being projected.
    pub min_history_days: u32,

    /// Real snapshots required before trends stop being projected.
    pub min_real_snapshots: usize,

    /// Number of past months plotted in addition to "now".
    pub trend_months: u32,

    /// A trend point older than this gets a trailing "current" point.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub stale_after: Duration,
}

impl Default for History {
    fn default() -> Self {
        Self {
            path: None,
            min_interval: Duration::from_secs(12 * 60 * 60),
            significant_change_pct: 5.0,
            retention_cap: 730,
            min_history_days: 7,
            min_real_snapshots: 2,
            trend_months: 6,
            stale_after: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl History {
    pub fn clamp(self) -> Self {
        Self {
            significant_change_pct: self.significant_change_pct.max(0.0),
            retention_cap: self.retention_cap.max(1),
            min_real_snapshots: self.min_real_snapshots.max(1),
            ..self
        }
    }

    /// Resolve the history file location.
    ///
    /// An explicit `path` wins. Otherwise `%LOCALAPPDATA%` is used when
    /// present, then `$XDG_DATA_HOME`, then `$HOME/.local/share`.
    pub fn resolve_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.path {
            return Some(path.clone());
        }
        if let Some(dir) = std::env::var_os("LOCALAPPDATA") {
            return Some(
                PathBuf::from(dir)
                    .join("EnrollmentInsights")
                    .join("history.json"),
            );
        }
        let base = std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share"))
            })?;
        Some(base.join("enrollment-insights").join("history.json"))
    }
}
