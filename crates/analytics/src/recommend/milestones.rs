#![forbid(unsafe_code)]

use crate::recommend::PlaybookType;
use serde::{Deserialize, Serialize};

/// `(threshold, name, description, playbook)` in ascending threshold order.
pub const MILESTONE_LADDER: &[(f64, &str, &str, Option<PlaybookType>)] = &[
    (
        10.0,
        "Pilot",
        "A pilot group is cloud-managed and validating policies",
        Some(PlaybookType::AutopilotHygiene),
    ),
    (
        25.0,
        "Early adopters",
        "Early adopter departments are enrolled",
        Some(PlaybookType::ReduceDependencies),
    ),
    (
        50.0,
        "Halfway",
        "Half of the fleet is cloud-managed",
        Some(PlaybookType::RebuildMomentum),
    ),
    (
        60.0,
        "Past the trough",
        "Enrollment has cleared the trust trough",
        Some(PlaybookType::StallRecovery),
    ),
    (
        75.0,
        "Majority",
        "Three quarters of the fleet is cloud-managed",
        Some(PlaybookType::ScaleUp),
    ),
    (
        90.0,
        "Final stretch",
        "Only hard-to-move devices remain",
        Some(PlaybookType::ReduceDependencies),
    ),
    (100.0, "Complete", "Every device is cloud-managed", None),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub percentage: f64,
    pub name: String,
    pub description: String,
    pub is_achieved: bool,
    /// Highest achieved milestone.
    pub is_current: bool,
    /// Smallest milestone not yet achieved.
    pub is_next: bool,
    pub recommended_playbook: Option<PlaybookType>,
}

/// Evaluate the fixed ladder against the current enrollment percentage.
pub fn milestone_ladder(current_percentage: f64) -> Vec<Milestone> {
    let pct = if current_percentage.is_finite() {
        current_percentage.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let current = MILESTONE_LADDER.iter().rposition(|m| pct >= m.0);
    let next = MILESTONE_LADDER.iter().position(|m| pct < m.0);

    MILESTONE_LADDER
        .iter()
        .enumerate()
        .map(|(ix, &(threshold, name, description, playbook))| Milestone {
            percentage: threshold,
            name: name.to_string(),
            description: description.to_string(),
            is_achieved: pct >= threshold,
            is_current: current == Some(ix),
            is_next: next == Some(ix),
            recommended_playbook: playbook,
        })
        .collect()
}
