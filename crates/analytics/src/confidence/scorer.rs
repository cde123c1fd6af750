#![forbid(unsafe_code)]

use crate::confidence::inputs::CO_MANAGEMENT_WORKLOADS;
use crate::confidence::{
    CategoryScore, ConfidenceBand, ConfidenceCategory, ConfidenceInputs, ConfidenceResult,
    ScoreDriver,
};
use config::Config;
use std::cmp::Ordering;
use tracing::trace;

pub trait ConfidenceScorer: Send + Sync {
    /// Score the likelihood that enrollment keeps progressing.
    fn score(&self, inputs: &ConfidenceInputs) -> ConfidenceResult;
}

/// Five independently scored categories. Each starts at half its weight,
/// every signal nudges it up or down, and the result is clamped to
/// `0..=weight`.
#[derive(Debug, Clone)]
pub struct WeightedConfidenceScorer {
    bands: config::Confidence,
}

/// Signals collected for one category.
struct Tally {
    category: ConfidenceCategory,
    drivers: Vec<ScoreDriver>,
}

impl Tally {
    fn new(category: ConfidenceCategory) -> Self {
        Self {
            category,
            drivers: Vec::new(),
        }
    }

    fn push(&mut self, name: &str, detail: String, impact: f64) {
        if impact == 0.0 {
            return;
        }
        self.drivers.push(ScoreDriver {
            category: self.category,
            name: name.to_string(),
            detail,
            impact,
        });
    }

    fn score(&self) -> CategoryScore {
        let weight = self.category.weight();
        let raw = self.category.midpoint() + self.drivers.iter().map(|d| d.impact).sum::<f64>();
        CategoryScore {
            category: self.category,
            weight,
            score: raw.clamp(0.0, f64::from(weight)),
        }
    }
}

impl WeightedConfidenceScorer {
    pub fn new(config: &Config) -> Self {
        Self {
            bands: config.confidence.clamp(),
        }
    }

    pub fn band_for(&self, score: u8) -> ConfidenceBand {
        if score >= self.bands.high {
            ConfidenceBand::High
        } else if score >= self.bands.medium {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    fn velocity(inputs: &ConfidenceInputs) -> Tally {
        let mut tally = Tally::new(ConfidenceCategory::Velocity);
        if inputs.current_percentage >= 100.0 {
            tally.push(
                "Migration complete",
                "Every device is cloud-managed".into(),
                ConfidenceCategory::Velocity.midpoint(),
            );
            return tally;
        }

        let weekly_rate = if inputs.total_devices > 0 {
            inputs.velocity_7 * 7.0 / inputs.total_devices as f64 * 100.0
        } else {
            0.0
        };
        let impact = if inputs.velocity_7 <= 0.0 {
            -8.0
        } else if weekly_rate >= 5.0 {
            10.0
        } else if weekly_rate >= 2.0 {
            6.0
        } else if weekly_rate >= 0.5 {
            2.0
        } else {
            -3.0
        };
        tally.push(
            "Weekly enrollment rate",
            format!("{weekly_rate:.1}% of the fleet per week"),
            impact,
        );

        if inputs.velocity_30 > 0.0 {
            let ratio = inputs.velocity_7 / inputs.velocity_30;
            let impact = if ratio >= 1.2 {
                4.0
            } else if ratio <= 0.8 {
                -4.0
            } else {
                0.0
            };
            tally.push(
                "Momentum",
                format!("7-day velocity is {:.0}% of the 30-day velocity", ratio * 100.0),
                impact,
            );
        } else if inputs.velocity_7 > 0.0 {
            tally.push("Momentum", "Enrollment picked up this week".into(), 4.0);
        }

        let days = inputs.days_since_last_enrollment;
        let impact = if days >= 14.0 {
            -5.0
        } else if days >= 7.0 {
            -3.0
        } else if days <= 1.0 {
            1.0
        } else {
            0.0
        };
        tally.push(
            "Recent enrollments",
            format!("{days:.0} day(s) since the last new enrollment"),
            impact,
        );

        if inputs.velocity_7 > 0.0 {
            let remaining =
                inputs.total_devices as f64 * (100.0 - inputs.current_percentage) / 100.0;
            let days_left = remaining / inputs.velocity_7;
            let impact = if days_left <= 90.0 {
                3.0
            } else if days_left > 365.0 {
                -3.0
            } else {
                0.0
            };
            tally.push(
                "Projected completion",
                format!("About {days_left:.0} days at the current pace"),
                impact,
            );
        }
        tally
    }

    fn success_rate(inputs: &ConfidenceInputs) -> Tally {
        let mut tally = Tally::new(ConfidenceCategory::SuccessRate);
        let attempts = inputs.enrollment_attempts;

        if attempts > 0 {
            let rate = inputs.enrollment_successes as f64 / attempts as f64;
            tally.push(
                "Enrollment success rate",
                format!("{:.0}% of attempts succeeded", rate * 100.0),
                ((rate - 0.8) * 60.0).clamp(-12.5, 12.5),
            );
        }

        let retries = inputs.retry_count;
        let impact = match (attempts, retries) {
            (_, 0) if attempts > 0 => 1.0,
            (0, r) if r > 0 => -2.0,
            (a, r) if a > 0 && r as f64 / a as f64 > 1.0 => -4.0,
            (a, r) if a > 0 && r as f64 / a as f64 > 0.5 => -2.0,
            _ => 0.0,
        };
        tally.push(
            "Retries",
            format!("{retries} retries across {attempts} attempts"),
            impact,
        );

        let failures = inputs.recent_failures.min(10);
        tally.push(
            "Recent failures",
            format!("{} failure(s) in the last week", inputs.recent_failures),
            -(failures as f64) * 0.5,
        );
        tally
    }

    fn complexity(inputs: &ConfidenceInputs) -> Tally {
        let mut tally = Tally::new(ConfidenceCategory::Complexity);

        let apps = inputs.app_dependency_count;
        let impact = match apps {
            0 => 3.0,
            1..=5 => 1.0,
            6..=20 => -2.0,
            _ => -4.0,
        };
        tally.push(
            "Application dependencies",
            format!("{apps} app(s) only deployable through ConfigMgr"),
            impact,
        );

        let policies = inputs.policy_dependency_count;
        let impact = match policies {
            0 => 2.0,
            1..=5 => 0.0,
            6..=20 => -2.0,
            _ => -3.0,
        };
        tally.push(
            "Policy dependencies",
            format!("{policies} policy object(s) without a cloud equivalent"),
            impact,
        );

        let scripts = inputs.script_dependency_count;
        let impact = match scripts {
            0 => 1.0,
            1..=10 => -1.0,
            _ => -3.0,
        };
        tally.push(
            "Script dependencies",
            format!("{scripts} task sequence(s) or script(s) tied to ConfigMgr"),
            impact,
        );

        let shifted = inputs.workloads_shifted as f64 / CO_MANAGEMENT_WORKLOADS as f64;
        tally.push(
            "Workloads shifted",
            format!(
                "{} of {CO_MANAGEMENT_WORKLOADS} co-management workloads moved to the cloud",
                inputs.workloads_shifted
            ),
            (shifted - 0.5) * 8.0,
        );
        tally
    }

    fn infrastructure(inputs: &ConfidenceInputs) -> Tally {
        let mut tally = Tally::new(ConfidenceCategory::Infrastructure);
        let flags = [
            ("Co-management", inputs.co_management_enabled, 2.5, -2.5),
            ("Cloud management gateway", inputs.cloud_management_gateway, 1.5, -1.5),
            ("Autopilot", inputs.autopilot_configured, 2.0, -1.0),
            ("Hybrid join", inputs.hybrid_join_configured, 1.5, -1.5),
            ("Tenant attach", inputs.tenant_attach_enabled, 1.0, 0.0),
        ];
        for (name, enabled, on, off) in flags {
            let detail = if enabled { "Configured" } else { "Not configured" };
            tally.push(name, detail.into(), if enabled { on } else { off });
        }
        tally
    }

    fn conditional_access(inputs: &ConfidenceInputs) -> Tally {
        let mut tally = Tally::new(ConfidenceCategory::ConditionalAccess);
        let policies = inputs.compliance_policy_count;
        match (inputs.ca_requires_compliance, policies > 0) {
            (true, true) => tally.push(
                "Compliance-based access",
                format!("Access requires compliance; {policies} compliance policies assigned"),
                3.0,
            ),
            (true, false) => tally.push(
                "Compliance-based access",
                "Access requires compliance but no compliance policies are assigned".into(),
                -4.0,
            ),
            (false, _) => tally.push(
                "Compliance-based access",
                "Conditional access does not require device compliance".into(),
                -1.0,
            ),
        }
        let (detail, impact) = if inputs.ca_blocks_legacy_auth {
            ("Legacy authentication is blocked", 1.5)
        } else {
            ("Legacy authentication is allowed", -1.0)
        };
        tally.push("Legacy authentication", detail.into(), impact);
        tally
    }

    fn explain(
        score: u8,
        band: ConfidenceBand,
        best: Option<&ScoreDriver>,
        worst: Option<&ScoreDriver>,
    ) -> String {
        let mut text = format!("{band:?} confidence ({score}/100).");
        if let Some(best) = best {
            text.push_str(&format!(" Strongest driver: {} ({}).", best.name, best.detail));
        }
        if let Some(worst) = worst {
            text.push_str(&format!(" Biggest detractor: {} ({}).", worst.name, worst.detail));
        }
        text
    }
}

impl ConfidenceScorer for WeightedConfidenceScorer {
    fn score(&self, inputs: &ConfidenceInputs) -> ConfidenceResult {
        let inputs = inputs.sanitized();
        let tallies = [
            Self::velocity(&inputs),
            Self::success_rate(&inputs),
            Self::complexity(&inputs),
            Self::infrastructure(&inputs),
            Self::conditional_access(&inputs),
        ];

        let breakdown: Vec<CategoryScore> = tallies.iter().map(Tally::score).collect();
        let total: f64 = breakdown.iter().map(|c| c.score).sum();
        let score = total.round().clamp(0.0, 100.0) as u8;
        let band = self.band_for(score);

        let mut drivers: Vec<ScoreDriver> = tallies.into_iter().flat_map(|t| t.drivers).collect();
        drivers.sort_by(|a, b| b.impact.partial_cmp(&a.impact).unwrap_or(Ordering::Equal));

        let top_drivers: Vec<ScoreDriver> = drivers
            .iter()
            .filter(|d| d.impact > 0.0)
            .take(self.bands.top_drivers)
            .cloned()
            .collect();
        let top_detractors: Vec<ScoreDriver> = drivers
            .iter()
            .rev()
            .filter(|d| d.impact < 0.0)
            .take(self.bands.top_drivers)
            .cloned()
            .collect();

        trace!(score, ?band, "confidence scored");

        ConfidenceResult {
            score,
            band,
            explanation: Self::explain(score, band, top_drivers.first(), top_detractors.first()),
            top_drivers,
            top_detractors,
            breakdown,
        }
    }
}
