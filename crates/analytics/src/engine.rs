#![forbid(unsafe_code)]

use crate::clock::Clock;
use crate::confidence::{
    ConfidenceInputs, ConfidenceResult, ConfidenceScorer, WeightedConfidenceScorer,
};
use crate::domain::{DeviceCounts, HistoricalSnapshot, SummaryStats};
use crate::error::Error;
use crate::persistence::HistoryRepository;
use crate::recommend::{
    DeviceCandidate, Milestone, PlaybookEnrollmentBatch, PlaybookRecommender,
    RecommendationContext, RecommendedPlaybook, TemplatePlaybookRecommender, milestone_ladder,
    select_low_risk_batch,
};
use crate::stall::{StallRiskAssessment, StallRiskAssessor, ThresholdStallAssessor, VelocityHistory};
use crate::store::{HistoryOrigin, HistoryStore, RecordOutcome, TrendData};
use crate::trend::{TrendAnalysis, TrendAnalyzer, TrendDirection};
use chrono::{DateTime, Utc};
use config::Config;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub struct Services {
    pub store: HistoryStore,
    pub scorer: Box<dyn ConfidenceScorer>,
    pub assessor: Box<dyn StallRiskAssessor>,
    pub recommender: Box<dyn PlaybookRecommender>,
    pub clock: Arc<dyn Clock>,
}

impl Services {
    /// The default service set over the given repository and clock.
    pub fn new(config: &Config, repo: Arc<dyn HistoryRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: HistoryStore::new(repo, clock.clone(), config),
            scorer: Box::new(WeightedConfidenceScorer::new(config)),
            assessor: Box::new(ThresholdStallAssessor::new(config)),
            recommender: Box::new(TemplatePlaybookRecommender::new()),
            clock,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One analysis run as requested by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnalyticsRequest {
    pub counts: DeviceCounts,
    #[serde(default = "default_true")]
    pub is_real_data: bool,
    /// Record `counts` as a snapshot before analyzing.
    #[serde(default = "default_true")]
    pub record: bool,
    #[serde(default)]
    pub signals: ConfidenceInputs,
    #[serde(default)]
    pub candidates: Vec<DeviceCandidate>,
    /// Overrides the configured batch size.
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// Derived from history when absent.
    #[serde(default)]
    pub days_since_last_enrollment: Option<f64>,
}

impl AnalyticsRequest {
    pub fn new(counts: DeviceCounts) -> Self {
        Self {
            counts,
            is_real_data: true,
            record: true,
            signals: ConfidenceInputs::default(),
            candidates: Vec::new(),
            batch_size: None,
            days_since_last_enrollment: None,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        let c = &self.counts;
        if c.cloud_managed > c.total {
            return Err(Error::InvalidRequest {
                field: "counts.cloudManaged",
                reason: format!("{} exceeds total devices {}", c.cloud_managed, c.total),
            });
        }
        if c.config_mgr_only > c.total {
            return Err(Error::InvalidRequest {
                field: "counts.configMgrOnly",
                reason: format!("{} exceeds total devices {}", c.config_mgr_only, c.total),
            });
        }
        if c.cloud_native > c.cloud_managed {
            return Err(Error::InvalidRequest {
                field: "counts.cloudNative",
                reason: format!(
                    "{} exceeds cloud-managed devices {}",
                    c.cloud_native, c.cloud_managed
                ),
            });
        }
        if self.batch_size == Some(0) {
            return Err(Error::InvalidRequest {
                field: "batchSize",
                reason: "must be at least 1".into(),
            });
        }
        if let Some(days) = self.days_since_last_enrollment
            && !(days.is_finite() && days >= 0.0)
        {
            return Err(Error::InvalidRequest {
                field: "daysSinceLastEnrollment",
                reason: format!("{days} is not a non-negative number of days"),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentAnalyticsResult {
    pub generated_at: DateTime<Utc>,
    pub record: Option<RecordOutcome>,
    pub snapshots: Vec<HistoricalSnapshot>,
    pub summary: SummaryStats,
    pub trend_data: TrendData,
    pub trend: TrendAnalysis,
    pub confidence: ConfidenceResult,
    pub stall_risk: StallRiskAssessment,
    pub milestones: Vec<Milestone>,
    pub playbooks: Vec<RecommendedPlaybook>,
    pub low_risk_batch: PlaybookEnrollmentBatch,
}

/// Runs record, trend, score, stall assessment and recommendation in one
/// pass over the history store.
pub struct EnrollmentAnalytics {
    config: Config,
    services: Services,
    analyzer: TrendAnalyzer,
}

impl EnrollmentAnalytics {
    pub fn new(config: Config, services: Services) -> Self {
        let analyzer = TrendAnalyzer::new(&config);
        Self {
            config,
            services,
            analyzer,
        }
    }

    /// Warm the history cache.
    pub async fn init(&self) -> HistoryOrigin {
        self.services.store.init().await
    }

    /// Flush history and release the cache.
    pub async fn shutdown(&self) {
        self.services.store.close().await;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &HistoryStore {
        &self.services.store
    }

    pub async fn analyze(
        &self,
        request: &AnalyticsRequest,
    ) -> Result<EnrollmentAnalyticsResult, Error> {
        request.validate()?;
        let store = &self.services.store;
        let counts = request.counts;

        let record = if request.record {
            Some(store.record_snapshot(counts, request.is_real_data).await)
        } else {
            None
        };

        let loaded = store.load_history().await;
        let now = self.services.clock.now();
        let trend = self.analyzer.analyze(&TrendAnalyzer::series(&loaded.history));
        let days_since_last_enrollment = request
            .days_since_last_enrollment
            .or_else(|| loaded.history.days_since_last_increase(now))
            .unwrap_or(0.0);
        let current_percentage = counts.enrollment_percentage();

        let mut inputs = request.signals.clone();
        if trend.trend != TrendDirection::InsufficientData {
            inputs.velocity_7 = trend.velocity_7;
            inputs.velocity_30 = trend.velocity_30;
        }
        inputs.total_devices = i64::try_from(counts.total).unwrap_or(i64::MAX);
        inputs.current_percentage = current_percentage;
        inputs.days_since_last_enrollment = days_since_last_enrollment;

        let confidence = self.services.scorer.score(&inputs);
        let stall_risk = self.services.assessor.assess(
            current_percentage,
            &VelocityHistory::from(&trend),
            days_since_last_enrollment,
        );
        let milestones = milestone_ladder(current_percentage);
        let playbooks = self.services.recommender.recommend(&RecommendationContext {
            current_percentage,
            trend: &trend,
            confidence: &confidence,
            stall: &stall_risk,
        });
        let low_risk_batch = select_low_risk_batch(
            &request.candidates,
            request
                .batch_size
                .unwrap_or(self.config.recommendation.batch_size),
            self.config.recommendation.min_readiness,
        );
        let trend_data = store.trend_data(counts).await;

        info!(
            score = confidence.score,
            band = ?confidence.band,
            risk = ?stall_risk.risk_level,
            trend = ?trend.trend,
            playbooks = playbooks.len(),
            "enrollment analysis complete"
        );

        Ok(EnrollmentAnalyticsResult {
            generated_at: now,
            record,
            summary: self.analyzer.summarize(&loaded.history),
            snapshots: loaded.history.snapshots,
            trend_data,
            trend,
            confidence,
            stall_risk,
            milestones,
            playbooks,
            low_risk_batch,
        })
    }
}
