#![forbid(unsafe_code)]

use crate::stall::{StallFactor, StallRiskAssessment, StallRiskLevel, VelocityHistory};
use crate::trend::TrendDirection;
use config::Config;
use tracing::trace;

pub trait StallRiskAssessor: Send + Sync {
    fn assess(
        &self,
        current_percentage: f64,
        velocity: &VelocityHistory,
        days_since_last_enrollment: f64,
    ) -> StallRiskAssessment;
}

/// Day thresholds set the base level, a falling velocity escalates it one
/// step, no progress at all lifts it to at least `Medium`, and the trust
/// trough is always `Critical`. Velocity signals that history cannot yet
/// measure never count against the fleet.
#[derive(Debug, Clone)]
pub struct ThresholdStallAssessor {
    policy: config::Stall,
}

impl ThresholdStallAssessor {
    pub fn new(config: &Config) -> Self {
        Self {
            policy: config.stall.clamp(),
        }
    }

    pub fn is_trust_trough(&self, percentage: f64, velocity: &VelocityHistory) -> bool {
        let growing = matches!(
            velocity.trend,
            TrendDirection::Accelerating | TrendDirection::Steady
        );
        (self.policy.trough_min..=self.policy.trough_max).contains(&percentage)
            && velocity.velocity_change.is_some_and(|change| change <= 0.0)
            && !growing
    }

    fn level_for_days(&self, days: f64) -> StallRiskLevel {
        let p = &self.policy;
        if days >= f64::from(p.critical_days) {
            StallRiskLevel::Critical
        } else if days >= f64::from(p.high_days) {
            StallRiskLevel::High
        } else if days >= f64::from(p.medium_days) {
            StallRiskLevel::Medium
        } else if days >= f64::from(p.low_days) {
            StallRiskLevel::Low
        } else {
            StallRiskLevel::None
        }
    }
}

impl StallRiskAssessor for ThresholdStallAssessor {
    fn assess(
        &self,
        current_percentage: f64,
        velocity: &VelocityHistory,
        days_since_last_enrollment: f64,
    ) -> StallRiskAssessment {
        let percentage = if current_percentage.is_finite() {
            current_percentage.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let days = if days_since_last_enrollment.is_finite() {
            days_since_last_enrollment.max(0.0)
        } else {
            0.0
        };

        if percentage >= 100.0 {
            return StallRiskAssessment {
                recommended_actions: vec![StallRiskLevel::None.action().to_string()],
                ..Default::default()
            };
        }

        let mut factors = Vec::new();
        let trough = self.is_trust_trough(percentage, velocity);
        if trough {
            factors.push(StallFactor::TrustTrough { percentage });
        }

        let mut level = self.level_for_days(days);
        if level != StallRiskLevel::None {
            factors.push(StallFactor::NoRecentEnrollments { days });
        }
        if let Some(change) = velocity.velocity_change.filter(|c| *c < 0.0) {
            factors.push(StallFactor::DecliningVelocity { change });
            level = level.escalate();
        }
        if velocity.trend != TrendDirection::InsufficientData && velocity.velocity_7 <= 0.0 {
            factors.push(StallFactor::NoProgress);
            level = level.max(StallRiskLevel::Medium);
        }
        if trough {
            level = StallRiskLevel::Critical;
        }

        let mut actions: Vec<String> = Vec::new();
        let factor_actions = factors.iter().flat_map(|f| f.actions().iter().copied());
        for action in factor_actions.chain([level.action()]) {
            if !actions.iter().any(|a| a == action) {
                actions.push(action.to_string());
            }
        }

        let is_at_risk = level != StallRiskLevel::None;
        trace!(?level, trough, factors = factors.len(), "stall risk assessed");

        StallRiskAssessment {
            is_at_risk,
            risk_level: level,
            days_at_risk: if is_at_risk { days.floor() as u32 } else { 0 },
            contributing_factors: factors,
            recommended_actions: actions,
            is_trust_trough_risk: trough,
        }
    }
}
