#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceCategory {
    Velocity,
    SuccessRate,
    Complexity,
    Infrastructure,
    ConditionalAccess,
}

impl ConfidenceCategory {
    pub const ALL: [ConfidenceCategory; 5] = [
        ConfidenceCategory::Velocity,
        ConfidenceCategory::SuccessRate,
        ConfidenceCategory::Complexity,
        ConfidenceCategory::Infrastructure,
        ConfidenceCategory::ConditionalAccess,
    ];

    /// Maximum points the category contributes. The weights sum to 100.
    pub const fn weight(self) -> u8 {
        match self {
            ConfidenceCategory::Velocity => 30,
            ConfidenceCategory::SuccessRate => 25,
            ConfidenceCategory::Complexity => 20,
            ConfidenceCategory::Infrastructure => 15,
            ConfidenceCategory::ConditionalAccess => 10,
        }
    }

    pub fn midpoint(self) -> f64 {
        f64::from(self.weight()) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfidenceBand {
    Low,
    Medium,
    High,
}

/// One signal that moved its category away from the midpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDriver {
    pub category: ConfidenceCategory,
    pub name: String,
    pub detail: String,
    pub impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub category: ConfidenceCategory,
    pub weight: u8,
    /// Always within `0..=weight`.
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceResult {
    pub score: u8,
    pub band: ConfidenceBand,
    pub explanation: String,
    pub top_drivers: Vec<ScoreDriver>,
    pub top_detractors: Vec<ScoreDriver>,
    pub breakdown: Vec<CategoryScore>,
}

impl ConfidenceResult {
    pub fn category(&self, category: ConfidenceCategory) -> Option<&CategoryScore> {
        self.breakdown.iter().find(|c| c.category == category)
    }

    /// The category scored below its midpoint.
    pub fn is_weak(&self, category: ConfidenceCategory) -> bool {
        self.category(category)
            .is_some_and(|c| c.score < category.midpoint())
    }
}
