#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `part / whole * 100`, clamped to 0..=100. Zero `whole` yields 0.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 100.0).clamp(0.0, 100.0)
}

/// Aggregate device counts as reported by the live data service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCounts {
    pub total: u64,
    pub cloud_managed: u64,
    pub config_mgr_only: u64,
    pub cloud_native: u64,
}

impl DeviceCounts {
    pub fn new(total: u64, cloud_managed: u64, config_mgr_only: u64, cloud_native: u64) -> Self {
        Self {
            total,
            cloud_managed,
            config_mgr_only,
            cloud_native,
        }
    }

    pub fn enrollment_percentage(&self) -> f64 {
        percentage(self.cloud_managed, self.total)
    }

    pub fn gap(&self) -> u64 {
        self.total.saturating_sub(self.cloud_managed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSnapshot {
    pub timestamp: DateTime<Utc>,
    pub total_devices: u64,
    pub cloud_managed_devices: u64,
    pub config_mgr_only_devices: u64,
    pub cloud_native_devices: u64,
    pub is_real_data: bool,
    #[serde(default)]
    pub source_hash: String,
}

impl HistoricalSnapshot {
    pub fn new(timestamp: DateTime<Utc>, counts: DeviceCounts, is_real_data: bool) -> Self {
        Self {
            timestamp,
            total_devices: counts.total,
            cloud_managed_devices: counts.cloud_managed,
            config_mgr_only_devices: counts.config_mgr_only,
            cloud_native_devices: counts.cloud_native,
            is_real_data,
            source_hash: source_hash(&counts, is_real_data),
        }
    }

    pub fn counts(&self) -> DeviceCounts {
        DeviceCounts::new(
            self.total_devices,
            self.cloud_managed_devices,
            self.config_mgr_only_devices,
            self.cloud_native_devices,
        )
    }

    pub fn enrollment_percentage(&self) -> f64 {
        percentage(self.cloud_managed_devices, self.total_devices)
    }

    pub fn gap(&self) -> u64 {
        self.total_devices.saturating_sub(self.cloud_managed_devices)
    }

    /// Overwrite the counts and timestamp. Only used for the in-place
    /// correction of the most recent snapshot.
    pub(crate) fn overwrite(
        &mut self,
        timestamp: DateTime<Utc>,
        counts: DeviceCounts,
        is_real_data: bool,
    ) {
        *self = Self::new(timestamp, counts, is_real_data);
    }
}

fn source_hash(counts: &DeviceCounts, is_real_data: bool) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&counts.total.to_le_bytes());
    hasher.update(&counts.cloud_managed.to_le_bytes());
    hasher.update(&counts.config_mgr_only.to_le_bytes());
    hasher.update(&counts.cloud_native.to_le_bytes());
    hasher.update(&[u8::from(is_real_data)]);
    let mut hex = hasher.finalize().to_hex().to_string();
    hex.truncate(16);
    hex
}
