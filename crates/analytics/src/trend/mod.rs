#![forbid(unsafe_code)]

mod analyzer;
mod types;

pub use analyzer::TrendAnalyzer;
pub use types::{TrendAnalysis, TrendDirection};
