#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCandidate {
    pub device_id: String,
    pub device_name: String,
    /// 0-100, higher is more ready.
    pub readiness_score: f64,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default = "eligible_by_default")]
    pub is_eligible: bool,
}

fn eligible_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybookEnrollmentBatch {
    pub name: String,
    pub criterion: String,
    pub devices: Vec<DeviceCandidate>,
    pub average_readiness: f64,
}

/// Pick up to `size` eligible devices, most ready first, fewest risk factors
/// breaking ties, then by name.
pub fn select_low_risk_batch(
    candidates: &[DeviceCandidate],
    size: usize,
    min_readiness: f64,
) -> PlaybookEnrollmentBatch {
    let mut eligible: Vec<&DeviceCandidate> = candidates
        .iter()
        .filter(|c| c.is_eligible && c.readiness_score.is_finite())
        .filter(|c| c.readiness_score >= min_readiness)
        .collect();

    eligible.sort_by(|a, b| {
        b.readiness_score
            .partial_cmp(&a.readiness_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.risk_factors.len().cmp(&b.risk_factors.len()))
            .then_with(|| a.device_name.cmp(&b.device_name))
    });

    let devices: Vec<DeviceCandidate> = eligible.into_iter().take(size).cloned().collect();
    let average_readiness = if devices.is_empty() {
        0.0
    } else {
        devices.iter().map(|d| d.readiness_score).sum::<f64>() / devices.len() as f64
    };

    PlaybookEnrollmentBatch {
        name: "Low-risk batch".into(),
        criterion: format!(
            "Top {size} eligible devices with readiness of at least {min_readiness:.0}, \
             highest readiness and fewest risk factors first"
        ),
        devices,
        average_readiness,
    }
}
