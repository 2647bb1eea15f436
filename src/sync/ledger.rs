//! Per-session sync counters.
//!
//! Lock-free tallies of what the session fetched, what failed and what was
//! thrown away after a stop or a superseding query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
pub struct SyncLedger {
    /// Poll cycles started
    cycles: AtomicU64,
    realtime_ok: AtomicU64,
    realtime_failed: AtomicU64,
    stats_ok: AtomicU64,
    /// Stats failures (never shown to the user)
    stats_failed: AtomicU64,
    history_loads: AtomicU64,
    history_failed: AtomicU64,
    /// Completions dropped because their gate had closed
    discarded: AtomicU64,
    /// Session start time
    started_at: DateTime<Utc>,
}

impl SyncLedger {
    pub fn new() -> Self {
        Self {
            cycles: AtomicU64::new(0),
            realtime_ok: AtomicU64::new(0),
            realtime_failed: AtomicU64::new(0),
            stats_ok: AtomicU64::new(0),
            stats_failed: AtomicU64::new(0),
            history_loads: AtomicU64::new(0),
            history_failed: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    pub fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_realtime(&self, ok: bool) {
        let counter = if ok { &self.realtime_ok } else { &self.realtime_failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stats(&self, ok: bool) {
        let counter = if ok { &self.stats_ok } else { &self.stats_failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_history(&self, ok: bool) {
        let counter = if ok { &self.history_loads } else { &self.history_failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> SyncLedgerStats {
        SyncLedgerStats {
            cycles: self.cycles.load(Ordering::Relaxed),
            realtime_ok: self.realtime_ok.load(Ordering::Relaxed),
            realtime_failed: self.realtime_failed.load(Ordering::Relaxed),
            stats_ok: self.stats_ok.load(Ordering::Relaxed),
            stats_failed: self.stats_failed.load(Ordering::Relaxed),
            history_loads: self.history_loads.load(Ordering::Relaxed),
            history_failed: self.history_failed.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            started_at: self.started_at,
            session_duration_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Poll cycles: {}\n\
             - Realtime fetches: {} ok, {} failed\n\
             - Stats fetches: {} ok, {} failed\n\
             - History loads: {} ok, {} failed\n\
             - Late completions discarded: {}\n\
             - Session duration: {} seconds",
            stats.cycles,
            stats.realtime_ok,
            stats.realtime_failed,
            stats.stats_ok,
            stats.stats_failed,
            stats.history_loads,
            stats.history_failed,
            stats.discarded,
            stats.session_duration_secs
        )
    }
}

impl Default for SyncLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the ledger counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncLedgerStats {
    pub cycles: u64,
    pub realtime_ok: u64,
    pub realtime_failed: u64,
    pub stats_ok: u64,
    pub stats_failed: u64,
    pub history_loads: u64,
    pub history_failed: u64,
    pub discarded: u64,
    pub started_at: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe shared ledger.
pub type SharedLedger = Arc<SyncLedger>;

pub fn create_shared_ledger() -> SharedLedger {
    Arc::new(SyncLedger::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_counting() {
        let ledger = SyncLedger::new();

        ledger.record_cycle();
        ledger.record_realtime(true);
        ledger.record_realtime(false);
        ledger.record_stats(false);
        ledger.record_discarded();

        let stats = ledger.stats();
        assert_eq!(stats.cycles, 1);
        assert_eq!(stats.realtime_ok, 1);
        assert_eq!(stats.realtime_failed, 1);
        assert_eq!(stats.stats_ok, 0);
        assert_eq!(stats.stats_failed, 1);
        assert_eq!(stats.discarded, 1);
    }

    #[test]
    fn test_summary_format() {
        let ledger = SyncLedger::new();
        let summary = ledger.summary();

        assert!(summary.contains("Poll cycles: 0"));
        assert!(summary.contains("Stats fetches"));
        assert!(summary.contains("Late completions discarded"));
    }
}
