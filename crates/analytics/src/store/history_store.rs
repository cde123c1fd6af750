#![forbid(unsafe_code)]

use crate::clock::Clock;
use crate::domain::{DeviceCounts, HistoricalSnapshot, HistoryContainer, SummaryStats};
use crate::persistence::HistoryRepository;
use crate::store::{TrendData, build_trend_data};
use crate::trend::TrendAnalyzer;
use chrono::TimeDelta;
use config::Config;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Where the cached history came from on first load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HistoryOrigin {
    /// Read from the repository.
    Loaded,
    /// Nothing was persisted yet; a fresh history was started.
    Created,
    /// The persisted history could not be read; a fresh one replaced it.
    Corrupt { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedHistory {
    pub history: HistoryContainer,
    pub origin: HistoryOrigin,
    pub has_sufficient_history: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordKind {
    Appended,
    /// The last snapshot was too recent but the change was significant, so
    /// it was overwritten.
    UpdatedInPlace,
    /// The last snapshot was too recent and nothing significant changed.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcome {
    pub kind: RecordKind,
    /// Whether the write reached the repository.
    pub persisted: bool,
    /// Snapshots dropped by the retention cap.
    pub pruned: usize,
}

impl RecordOutcome {
    /// A snapshot was appended or updated.
    pub fn committed(&self) -> bool {
        self.kind != RecordKind::Skipped
    }
}

#[derive(Debug)]
struct CachedHistory {
    history: HistoryContainer,
    origin: HistoryOrigin,
}

/// Owns the enrollment history: a write-through cache in front of a
/// [`HistoryRepository`].
///
/// Every load/mutate/save sequence runs under the cache's write lock.
/// Repository failures are logged and degrade to an empty history; they are
/// never returned to callers.
pub struct HistoryStore {
    repo: Arc<dyn HistoryRepository>,
    clock: Arc<dyn Clock>,
    policy: config::History,
    analyzer: TrendAnalyzer,
    cache: RwLock<Option<CachedHistory>>,
}

impl HistoryStore {
    pub fn new(repo: Arc<dyn HistoryRepository>, clock: Arc<dyn Clock>, config: &Config) -> Self {
        Self {
            repo,
            clock,
            policy: config.history.clone().clamp(),
            analyzer: TrendAnalyzer::new(config),
            cache: RwLock::new(None),
        }
    }

    /// Warm the cache and report where the history came from.
    pub async fn init(&self) -> HistoryOrigin {
        let origin = self.load_history().await.origin;
        info!(?origin, "history store initialized");
        origin
    }

    /// Flush the cached history to the repository and drop the cache.
    pub async fn close(&self) {
        let mut guard = self.cache.write().await;
        let Some(cached) = guard.take() else {
            return;
        };
        // nothing recorded yet
        if cached.history.snapshots.is_empty() && cached.origin != HistoryOrigin::Loaded {
            return;
        }
        if let Err(err) = self.repo.save(&cached.history).await {
            warn!(error = %err, "failed to flush history on close");
        }
        info!("history store closed");
    }

    pub async fn load_history(&self) -> LoadedHistory {
        if let Some(cached) = self.cache.read().await.as_ref() {
            return self.view(cached);
        }

        let mut guard = self.cache.write().await;
        let cached = match guard.take() {
            Some(cached) => cached,
            None => self.read_persisted().await,
        };
        self.view(guard.insert(cached))
    }

    /// Record the current counts.
    ///
    /// Appends a snapshot when the last one is at least `min_interval` old.
    /// A younger last snapshot is overwritten only for a significant change
    /// (mock to real data, or a relative move in total or cloud-managed
    /// devices above `significant_change_pct`); otherwise the data is dropped.
    pub async fn record_snapshot(
        &self,
        counts: DeviceCounts,
        is_real_data: bool,
    ) -> RecordOutcome {
        let now = self.clock.now();
        let mut guard = self.cache.write().await;
        let cached = match guard.take() {
            Some(cached) => cached,
            None => self.read_persisted().await,
        };
        let history = &mut guard.insert(cached).history;

        let min_interval =
            TimeDelta::from_std(self.policy.min_interval).unwrap_or(TimeDelta::MAX);
        let kind = match history.latest() {
            None => RecordKind::Appended,
            Some(last) if now - last.timestamp >= min_interval => RecordKind::Appended,
            Some(last) if self.is_significant(last, &counts, is_real_data) => {
                RecordKind::UpdatedInPlace
            }
            Some(_) => RecordKind::Skipped,
        };

        let mut outcome = RecordOutcome {
            kind,
            persisted: false,
            pruned: 0,
        };
        match kind {
            RecordKind::Skipped => {
                debug!(?counts, "snapshot skipped: last one is too recent");
                return outcome;
            }
            RecordKind::UpdatedInPlace => {
                if let Some(last) = history.snapshots.last_mut() {
                    last.overwrite(now, counts, is_real_data);
                }
                debug!(?counts, is_real_data, "last snapshot updated in place");
            }
            RecordKind::Appended => {
                history
                    .snapshots
                    .push(HistoricalSnapshot::new(now, counts, is_real_data));
                debug!(?counts, is_real_data, "snapshot appended");
            }
        }

        history.last_updated_date = now;
        outcome.pruned = history.prune_to(self.policy.retention_cap);
        if outcome.pruned > 0 {
            debug!(pruned = outcome.pruned, "oldest snapshots pruned");
        }
        history.summary_stats = self.analyzer.summarize(history);

        outcome.persisted = match self.repo.save(history).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to persist history");
                false
            }
        };
        outcome
    }

    pub async fn summary_stats(&self) -> SummaryStats {
        let loaded = self.load_history().await;
        self.analyzer.summarize(&loaded.history)
    }

    /// Enough real history to plot recorded trends instead of a projection.
    pub async fn has_sufficient_history(&self) -> bool {
        self.load_history().await.has_sufficient_history
    }

    pub async fn snapshots(&self) -> Vec<HistoricalSnapshot> {
        self.load_history().await.history.snapshots
    }

    pub async fn trend_data(&self, current: DeviceCounts) -> TrendData {
        let loaded = self.load_history().await;
        build_trend_data(&loaded.history, current, self.clock.now(), &self.policy)
    }

    /// Delete the persisted history and forget the cache. The next load
    /// starts a fresh history.
    pub async fn clear_history(&self) {
        let mut guard = self.cache.write().await;
        if let Err(err) = self.repo.clear().await {
            warn!(error = %err, "failed to delete persisted history");
        }
        guard.take();
        info!("history cleared");
    }

    fn view(&self, cached: &CachedHistory) -> LoadedHistory {
        LoadedHistory {
            has_sufficient_history: cached.history.has_sufficient_history(
                self.policy.min_history_days,
                self.policy.min_real_snapshots,
            ),
            history: cached.history.clone(),
            origin: cached.origin.clone(),
        }
    }

    async fn read_persisted(&self) -> CachedHistory {
        let now = self.clock.now();
        match self.repo.load().await {
            Ok(Some(history)) if !history.installation_id.is_empty() => {
                debug!(snapshots = history.snapshots.len(), "history loaded");
                CachedHistory {
                    history,
                    origin: HistoryOrigin::Loaded,
                }
            }
            Ok(Some(_)) => {
                warn!("persisted history has no installation id, starting fresh");
                CachedHistory {
                    history: HistoryContainer::new(now),
                    origin: HistoryOrigin::Corrupt {
                        reason: "missing installation id".into(),
                    },
                }
            }
            Ok(None) => {
                info!("no persisted history, starting fresh");
                CachedHistory {
                    history: HistoryContainer::new(now),
                    origin: HistoryOrigin::Created,
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to read history, starting fresh");
                CachedHistory {
                    history: HistoryContainer::new(now),
                    origin: HistoryOrigin::Corrupt {
                        reason: err.to_string(),
                    },
                }
            }
        }
    }

    fn is_significant(
        &self,
        last: &HistoricalSnapshot,
        counts: &DeviceCounts,
        is_real_data: bool,
    ) -> bool {
        let threshold = self.policy.significant_change_pct;
        (is_real_data && !last.is_real_data)
            || relative_change(last.total_devices, counts.total) > threshold
            || relative_change(last.cloud_managed_devices, counts.cloud_managed) > threshold
    }
}

/// Percent change from `old` to `new`. Any move away from zero counts as 100%.
fn relative_change(old: u64, new: u64) -> f64 {
    if old == 0 {
        return if new == 0 { 0.0 } else { 100.0 };
    }
    (new as f64 - old as f64).abs() / old as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_change_handles_zero() {
        assert_eq!(relative_change(0, 0), 0.0);
        assert_eq!(relative_change(0, 5), 100.0);
        assert_eq!(relative_change(200, 210), 5.0);
        assert_eq!(relative_change(200, 190), 5.0);
    }
}
