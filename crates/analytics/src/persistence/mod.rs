#![forbid(unsafe_code)]

mod keys;
mod repo;

pub use keys::fold_keys;
pub use repo::{HistoryRepository, JsonFileRepository, MemoryRepository};
