#![forbid(unsafe_code)]

pub mod clock;
pub mod confidence;
pub mod domain;
pub mod engine;
mod error;
pub mod persistence;
pub mod recommend;
pub mod stall;
pub mod store;
pub mod trend;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{AnalyticsRequest, EnrollmentAnalytics, EnrollmentAnalyticsResult, Services};
pub use error::Error;
pub use persistence::{HistoryRepository, JsonFileRepository, MemoryRepository};
pub use store::HistoryStore;
