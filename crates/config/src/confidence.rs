#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Confidence {
    /// Lowest score in the Medium band.
    pub medium: u8,
    /// Lowest score in the High band.
    pub high: u8,
    /// How many drivers and detractors are surfaced.
    pub top_drivers: usize,
}

impl Default for Confidence {
    fn default() -> Self {
        Self {
            medium: 50,
            high: 75,
            top_drivers: 3,
        }
    }
}

impl Confidence {
    pub fn clamp(self) -> Self {
        let high = self.high.min(100);
        Self {
            medium: self.medium.min(high),
            high,
            top_drivers: self.top_drivers,
        }
    }
}
