#![forbid(unsafe_code)]

mod history_store;
mod trend_data;

pub use history_store::{HistoryOrigin, HistoryStore, LoadedHistory, RecordKind, RecordOutcome};
pub use trend_data::{DataQuality, TrendData, TrendPoint, build_trend_data};
