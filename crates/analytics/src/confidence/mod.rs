#![forbid(unsafe_code)]

mod inputs;
mod scorer;
mod types;

pub use inputs::ConfidenceInputs;
pub use scorer::{ConfidenceScorer, WeightedConfidenceScorer};
pub use types::{CategoryScore, ConfidenceBand, ConfidenceCategory, ConfidenceResult, ScoreDriver};
