#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Week-over-week percentage-point thresholds. Every comparison is strictly
/// greater-than, so a delta of exactly `accelerating` is still "steady".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Trend {
    pub accelerating: f64,
    pub steady: f64,
    pub stalled: f64,
}

impl Default for Trend {
    fn default() -> Self {
        Self {
            accelerating: 2.0,
            steady: 0.5,
            stalled: -0.5,
        }
    }
}

impl Trend {
    /// Keep the thresholds ordered: `accelerating >= steady >= stalled`.
    pub fn clamp(self) -> Self {
        let steady = self.steady.min(self.accelerating);
        Self {
            accelerating: self.accelerating,
            steady,
            stalled: self.stalled.min(steady),
        }
    }
}
