#![forbid(unsafe_code)]

mod history;
mod snapshot;

pub(crate) use history::days_between;
pub use history::{HISTORY_FORMAT_VERSION, HistoryContainer, SummaryStats, new_installation_id};
pub use snapshot::{DeviceCounts, HistoricalSnapshot, percentage};
