#![forbid(unsafe_code)]

mod assessor;
mod types;

pub use assessor::{StallRiskAssessor, ThresholdStallAssessor};
pub use types::{StallFactor, StallRiskAssessment, StallRiskLevel, VelocityHistory};
