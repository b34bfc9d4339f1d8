// src/stats.rs
//! Lookup statistics for a CLI run

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Thread-safe statistics collector
#[derive(Clone)]
pub struct StatsCollector {
    lookups: Arc<AtomicU64>,
    cache_hits: Arc<AtomicU64>,
    domains_found: Arc<AtomicU64>,
    programs_found: Arc<AtomicU64>,
    start_time: Instant,
}

/// Snapshot of statistics at a point in time
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub lookups: u64,
    pub cache_hits: u64,
    pub domains_found: u64,
    pub programs_found: u64,
    pub elapsed_secs: u64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            lookups: Arc::new(AtomicU64::new(0)),
            cache_hits: Arc::new(AtomicU64::new(0)),
            domains_found: Arc::new(AtomicU64::new(0)),
            programs_found: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Count one finished lookup and what it found
    pub fn record_lookup(&self, programs: usize) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if programs > 0 {
            self.domains_found.fetch_add(1, Ordering::Relaxed);
            self.programs_found.fetch_add(programs as u64, Ordering::Relaxed);
        }
    }

    /// Count an outcome served from the cache
    pub fn record_cache_hit(&self, found: bool) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        if found {
            self.domains_found.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            domains_found: self.domains_found.load(Ordering::Relaxed),
            programs_found: self.programs_found.load(Ordering::Relaxed),
            elapsed_secs: self.start_time.elapsed().as_secs(),
        }
    }

    /// Format statistics as a human-readable string
    pub fn format_stats(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            "{} lookups | {} cache hits | {} domains with programs | {} programs | elapsed: {}",
            snapshot.lookups,
            snapshot.cache_hits,
            snapshot.domains_found,
            snapshot.programs_found,
            Self::format_elapsed(snapshot.elapsed_secs)
        )
    }

    pub fn format_elapsed(secs: u64) -> String {
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
