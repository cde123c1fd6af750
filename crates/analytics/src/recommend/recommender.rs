#![forbid(unsafe_code)]

use crate::confidence::{ConfidenceBand, ConfidenceCategory, ConfidenceResult};
use crate::recommend::{Applicability, Playbook, PlaybookType, builtin_playbooks};
use crate::stall::StallRiskAssessment;
use crate::trend::{TrendAnalysis, TrendDirection};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Everything known about the rollout when picking playbooks.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationContext<'a> {
    pub current_percentage: f64,
    pub trend: &'a TrendAnalysis,
    pub confidence: &'a ConfidenceResult,
    pub stall: &'a StallRiskAssessment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedPlaybook {
    pub playbook: Playbook,
    /// 1 is the most urgent.
    pub priority: u32,
    pub is_recommended: bool,
    pub justification: String,
}

pub trait PlaybookRecommender: Send + Sync {
    /// Applicable playbooks, most urgent first.
    fn recommend(&self, context: &RecommendationContext<'_>) -> Vec<RecommendedPlaybook>;
}

#[derive(Debug, Clone)]
pub struct TemplatePlaybookRecommender {
    templates: Vec<Playbook>,
}

impl Default for TemplatePlaybookRecommender {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplatePlaybookRecommender {
    pub fn new() -> Self {
        Self {
            templates: builtin_playbooks(),
        }
    }

    /// Register an additional template, typically a `Custom` one.
    pub fn with_template(mut self, playbook: Playbook) -> Self {
        self.templates.push(playbook);
        self
    }

    pub fn templates(&self) -> &[Playbook] {
        &self.templates
    }

    pub fn applies(applicability: Applicability, context: &RecommendationContext<'_>) -> bool {
        let pct = context.current_percentage;
        match applicability {
            Applicability::AtRisk => context.stall.is_at_risk,
            Applicability::LosingMomentum => {
                pct < 100.0 && context.trend.trend.is_losing_momentum()
            }
            Applicability::ComplexityHigh => {
                context.confidence.is_weak(ConfidenceCategory::Complexity)
            }
            Applicability::InfrastructureWeak => {
                context.confidence.is_weak(ConfidenceCategory::Infrastructure)
            }
            Applicability::HealthyGrowth => {
                pct < 100.0
                    && !context.stall.is_at_risk
                    && matches!(
                        context.trend.trend,
                        TrendDirection::Accelerating | TrendDirection::Steady
                    )
                    && context.confidence.band >= ConfidenceBand::Medium
            }
            Applicability::PercentageRange { min, max } => (min..=max).contains(&pct),
            Applicability::Always => true,
        }
    }

    fn justify(playbook: &Playbook, context: &RecommendationContext<'_>) -> String {
        let category = |c: ConfidenceCategory| {
            context
                .confidence
                .category(c)
                .map(|s| s.score)
                .unwrap_or_default()
        };
        match playbook.playbook_type {
            PlaybookType::StallRecovery => {
                let level = context.stall.risk_level;
                match context.stall.contributing_factors.first() {
                    Some(factor) => format!("Stall risk is {level:?}. {}.", factor.description()),
                    None => format!("Stall risk is {level:?}."),
                }
            }
            PlaybookType::RebuildMomentum => format!(
                "Enrollment is {} ({:+.1} points week over week).",
                context.trend.trend.label().to_lowercase(),
                context.trend.week_over_week_change
            ),
            PlaybookType::ReduceDependencies => format!(
                "Migration complexity scored {:.1} of {}.",
                category(ConfidenceCategory::Complexity),
                ConfidenceCategory::Complexity.weight()
            ),
            PlaybookType::AutopilotHygiene => format!(
                "Infrastructure readiness scored {:.1} of {}.",
                category(ConfidenceCategory::Infrastructure),
                ConfidenceCategory::Infrastructure.weight()
            ),
            PlaybookType::ScaleUp => format!(
                "Enrollment is {} with {:?} confidence ({}/100).",
                context.trend.trend.label().to_lowercase(),
                context.confidence.band,
                context.confidence.score
            ),
            PlaybookType::Custom => format!(
                "{} matches the current state at {:.1}% enrolled.",
                playbook.name, context.current_percentage
            ),
        }
    }
}

impl PlaybookRecommender for TemplatePlaybookRecommender {
    fn recommend(&self, context: &RecommendationContext<'_>) -> Vec<RecommendedPlaybook> {
        let mut selected: Vec<&Playbook> = self
            .templates
            .iter()
            .filter(|p| Self::applies(p.applicability, context))
            .collect();
        // stable: templates of equal rank keep registration order
        selected.sort_by_key(|p| p.playbook_type.severity_rank());

        debug!(
            selected = selected.len(),
            templates = self.templates.len(),
            "playbooks selected"
        );

        selected
            .into_iter()
            .enumerate()
            .map(|(ix, playbook)| RecommendedPlaybook {
                justification: Self::justify(playbook, context),
                playbook: playbook.clone(),
                priority: ix as u32 + 1,
                is_recommended: ix == 0,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidence::{ConfidenceInputs, ConfidenceScorer, WeightedConfidenceScorer};
    use crate::recommend::{PlaybookRisk, PlaybookStep, StepAction};
    use crate::stall::{StallFactor, StallRiskLevel};
    use config::Config;

    fn confidence(inputs: ConfidenceInputs) -> ConfidenceResult {
        WeightedConfidenceScorer::new(&Config::default()).score(&inputs)
    }

    fn strong_inputs() -> ConfidenceInputs {
        ConfidenceInputs {
            velocity_7: 20.0,
            velocity_30: 20.0,
            total_devices: 1000,
            current_percentage: 40.0,
            enrollment_attempts: 100,
            enrollment_successes: 99,
            workloads_shifted: 7,
            co_management_enabled: true,
            cloud_management_gateway: true,
            autopilot_configured: true,
            hybrid_join_configured: true,
            ca_requires_compliance: true,
            compliance_policy_count: 2,
            ca_blocks_legacy_auth: true,
            ..Default::default()
        }
    }

    fn types(recommended: &[RecommendedPlaybook]) -> Vec<PlaybookType> {
        recommended.iter().map(|r| r.playbook.playbook_type).collect()
    }

    #[test]
    fn healthy_growth_recommends_scale_up() {
        let trend = TrendAnalysis {
            trend: TrendDirection::Accelerating,
            ..Default::default()
        };
        let confidence = confidence(strong_inputs());
        let stall = StallRiskAssessment::default();
        let context = RecommendationContext {
            current_percentage: 40.0,
            trend: &trend,
            confidence: &confidence,
            stall: &stall,
        };
        let recommended = TemplatePlaybookRecommender::new().recommend(&context);
        assert_eq!(types(&recommended), vec![PlaybookType::ScaleUp]);
        assert!(recommended[0].is_recommended);
        assert_eq!(recommended[0].priority, 1);
    }

    #[test]
    fn stall_recovery_ranks_first_when_at_risk() {
        let trend = TrendAnalysis {
            trend: TrendDirection::Declining,
            week_over_week_change: -1.0,
            ..Default::default()
        };
        let confidence = confidence(ConfidenceInputs::default());
        let stall = StallRiskAssessment {
            is_at_risk: true,
            risk_level: StallRiskLevel::High,
            days_at_risk: 15,
            contributing_factors: vec![StallFactor::NoRecentEnrollments { days: 15.0 }],
            recommended_actions: vec![],
            is_trust_trough_risk: false,
        };
        let context = RecommendationContext {
            current_percentage: 30.0,
            trend: &trend,
            confidence: &confidence,
            stall: &stall,
        };
        let recommended = TemplatePlaybookRecommender::new().recommend(&context);
        let kinds = types(&recommended);
        assert_eq!(kinds.first(), Some(&PlaybookType::StallRecovery));
        assert!(kinds.contains(&PlaybookType::RebuildMomentum));
        assert!(!kinds.contains(&PlaybookType::ScaleUp));
        assert_eq!(recommended.iter().filter(|r| r.is_recommended).count(), 1);
        assert!(recommended[0].justification.contains("No new devices enrolled"));
        // playbook steps come back exactly as authored
        let template = TemplatePlaybookRecommender::new()
            .templates()
            .iter()
            .find(|p| p.playbook_type == PlaybookType::StallRecovery)
            .cloned()
            .unwrap();
        assert_eq!(recommended[0].playbook.steps, template.steps);
    }

    #[test]
    fn custom_templates_rank_last() {
        let custom = Playbook {
            id: "exec-briefing".into(),
            name: "Executive briefing".into(),
            description: "Brief leadership at the halfway mark".into(),
            playbook_type: PlaybookType::Custom,
            risk_level: PlaybookRisk::Low,
            applicability: Applicability::PercentageRange {
                min: 45.0,
                max: 55.0,
            },
            estimated_days: 1,
            steps: vec![PlaybookStep {
                order: 1,
                title: "Send briefing".into(),
                description: "Summarize progress".into(),
                action: StepAction::Communicate,
                requires_confirmation: false,
                rollback_instructions: None,
            }],
        };
        let recommender = TemplatePlaybookRecommender::new().with_template(custom);
        let trend = TrendAnalysis {
            trend: TrendDirection::Steady,
            ..Default::default()
        };
        let confidence = confidence(strong_inputs());
        let stall = StallRiskAssessment::default();
        let context = RecommendationContext {
            current_percentage: 50.0,
            trend: &trend,
            confidence: &confidence,
            stall: &stall,
        };
        let recommended = recommender.recommend(&context);
        assert_eq!(
            types(&recommended),
            vec![PlaybookType::ScaleUp, PlaybookType::Custom]
        );
        assert!(!recommended[1].is_recommended);
    }
}
