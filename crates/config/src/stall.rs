#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Stall {
    /// Lower bound of the trust-trough band (percent, inclusive).
    pub trough_min: f64,
    /// Upper bound of the trust-trough band (percent, inclusive).
    pub trough_max: f64,
    /// Days without a new enrollment before each risk level applies.
    pub low_days: u32,
    pub medium_days: u32,
    pub high_days: u32,
    pub critical_days: u32,
}

impl Default for Stall {
    fn default() -> Self {
        Self {
            trough_min: 50.0,
            trough_max: 60.0,
            low_days: 3,
            medium_days: 7,
            high_days: 14,
            critical_days: 30,
        }
    }
}

impl Stall {
    /// Clamp the band to 0..=100 and make the day thresholds non-decreasing.
    pub fn clamp(self) -> Self {
        let trough_min = self.trough_min.clamp(0.0, 100.0);
        let trough_max = self.trough_max.clamp(trough_min, 100.0);
        let medium_days = self.medium_days.max(self.low_days);
        let high_days = self.high_days.max(medium_days);
        Self {
            trough_min,
            trough_max,
            low_days: self.low_days,
            medium_days,
            high_days,
            critical_days: self.critical_days.max(high_days),
        }
    }
}
