#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Recommendation {
    /// Devices taken into the low-risk enrollment batch.
    pub batch_size: usize,
    /// Minimum readiness score (0-100) for a device to enter a batch.
    pub min_readiness: f64,
}

impl Default for Recommendation {
    fn default() -> Self {
        Self {
            batch_size: 25,
            min_readiness: 60.0,
        }
    }
}
