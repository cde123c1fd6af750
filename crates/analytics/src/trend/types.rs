#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendDirection {
    Accelerating,
    Steady,
    Stalled,
    Declining,
    /// Fewer than two snapshots, or none at least a week old.
    #[default]
    InsufficientData,
}

impl TrendDirection {
    pub fn label(self) -> &'static str {
        match self {
            TrendDirection::Accelerating => "Accelerating",
            TrendDirection::Steady => "Steady",
            TrendDirection::Stalled => "Stalled",
            TrendDirection::Declining => "Declining",
            TrendDirection::InsufficientData => "Insufficient data",
        }
    }

    /// Momentum has been lost and needs attention.
    pub fn is_losing_momentum(self) -> bool {
        matches!(self, TrendDirection::Stalled | TrendDirection::Declining)
    }
}

/// Velocities are cloud-managed devices gained per day. A velocity whose
/// window has no snapshot at or before its start stays 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    pub velocity_7: f64,
    pub velocity_30: f64,
    pub velocity_60: f64,
    pub velocity_90: f64,
    pub current_percentage: f64,
    /// Percentage points gained since the snapshot a week back.
    pub week_over_week_change: f64,
    /// This week's 7-day velocity minus last week's. `None` until the
    /// earlier week has its own baseline.
    pub velocity_change: Option<f64>,
    pub trend: TrendDirection,
}
