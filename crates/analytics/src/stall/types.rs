#![forbid(unsafe_code)]

use crate::trend::{TrendAnalysis, TrendDirection};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum StallRiskLevel {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl StallRiskLevel {
    /// One step more severe, saturating at `Critical`.
    pub fn escalate(self) -> Self {
        match self {
            StallRiskLevel::None => StallRiskLevel::Low,
            StallRiskLevel::Low => StallRiskLevel::Medium,
            StallRiskLevel::Medium => StallRiskLevel::High,
            StallRiskLevel::High | StallRiskLevel::Critical => StallRiskLevel::Critical,
        }
    }

    /// The action that goes with the overall level.
    pub fn action(self) -> &'static str {
        match self {
            StallRiskLevel::None => "Keep the current enrollment cadence",
            StallRiskLevel::Low => "Review enrollment progress at the next weekly check-in",
            StallRiskLevel::Medium => "Schedule a focused enrollment push for the coming week",
            StallRiskLevel::High => {
                "Escalate to migration leadership and assign an owner to unblock enrollment"
            }
            StallRiskLevel::Critical => {
                "Run the stall recovery playbook and report daily until enrollment resumes"
            }
        }
    }
}

/// Recent velocity signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VelocityHistory {
    pub velocity_7: f64,
    pub velocity_30: f64,
    /// This week's 7-day velocity minus last week's, when last week had a
    /// baseline to measure against.
    pub velocity_change: Option<f64>,
    pub trend: TrendDirection,
}

impl From<&TrendAnalysis> for VelocityHistory {
    fn from(trend: &TrendAnalysis) -> Self {
        Self {
            velocity_7: trend.velocity_7,
            velocity_30: trend.velocity_30,
            velocity_change: trend.velocity_change,
            trend: trend.trend,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StallFactor {
    /// Enrollment sits in the trust-trough band and measured velocity is not
    /// rising.
    TrustTrough { percentage: f64 },
    NoRecentEnrollments { days: f64 },
    DecliningVelocity { change: f64 },
    NoProgress,
}

impl StallFactor {
    pub fn description(&self) -> String {
        match self {
            StallFactor::TrustTrough { percentage } => format!(
                "Enrollment has plateaued at {percentage:.1}% while velocity is not improving"
            ),
            StallFactor::NoRecentEnrollments { days } => {
                format!("No new devices enrolled in {days:.0} day(s)")
            }
            StallFactor::DecliningVelocity { change } => {
                format!("7-day velocity dropped by {:.1} devices/day", change.abs())
            }
            StallFactor::NoProgress => "No net enrollment gain over the last week".to_string(),
        }
    }

    pub fn actions(&self) -> &'static [&'static str] {
        match self {
            StallFactor::TrustTrough { .. } => &[
                "Publish early-adopter success stories to rebuild trust",
                "Pilot the next wave with a low-risk device batch",
                "Resolve top blockers reported by the remaining device owners",
            ],
            StallFactor::NoRecentEnrollments { .. } => &[
                "Check enrollment collections and deployment schedules for pauses",
                "Review recent enrollment errors in the management console",
            ],
            StallFactor::DecliningVelocity { .. } => &[
                "Compare this week's enrollment failures against last week",
                "Confirm no co-management workload or policy change is blocking enrollment",
            ],
            StallFactor::NoProgress => &[
                "Verify the auto-enrollment policy is still assigned to target devices",
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StallRiskAssessment {
    pub is_at_risk: bool,
    pub risk_level: StallRiskLevel,
    pub days_at_risk: u32,
    pub contributing_factors: Vec<StallFactor>,
    pub recommended_actions: Vec<String>,
    pub is_trust_trough_risk: bool,
}
