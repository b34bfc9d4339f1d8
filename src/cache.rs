// src/cache.rs
//! Per-domain cache of lookup outcomes with a fixed time-to-live

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::types::LookupResult;

/// Default validity window of a cache entry
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Cached outcome for one domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    pub found: bool,
    pub timestamp: Instant,
}

/// Domain -> last lookup outcome.
///
/// Only the boolean outcome is kept, which is all badge rendering needs. Each
/// write schedules its own removal after the TTL; reads never check expiry.
#[derive(Clone)]
pub struct DomainCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl DomainCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached outcome for a domain, if present
    pub async fn get(&self, domain: &str) -> Option<bool> {
        let entries = self.entries.lock().await;
        entries.get(domain).map(|entry| entry.found)
    }

    /// Record an outcome and schedule its removal
    pub async fn insert(&self, domain: &str, found: bool) {
        let entry = CacheEntry {
            found,
            timestamp: Instant::now(),
        };

        {
            let mut entries = self.entries.lock().await;
            entries.insert(domain.to_string(), entry);
        }

        let entries = Arc::clone(&self.entries);
        let domain = domain.to_string();
        let ttl = self.ttl;

        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;

            let mut entries = entries.lock().await;
            // A later write owns its own removal
            if entries.get(&domain).map(|e| e.timestamp) == Some(entry.timestamp) {
                entries.remove(&domain);
                debug!("Cache entry for {} expired", domain);
            }
        });
    }

    /// Return the cached outcome, or run `compute` and cache what it finds.
    ///
    /// Hits carry no program records; callers needing records must bypass the cache.
    pub async fn get_or_compute<F, Fut>(&self, domain: &str, compute: F) -> LookupResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LookupResult>,
    {
        self.get_or_compute_with_hit(domain, compute).await.0
    }

    /// Like `get_or_compute`, also reporting whether the cache answered
    pub async fn get_or_compute_with_hit<F, Fut>(&self, domain: &str, compute: F) -> (LookupResult, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LookupResult>,
    {
        if let Some(found) = self.get(domain).await {
            debug!("Cache hit for {}: found={}", domain, found);
            return (LookupResult::outcome_only(found), true);
        }

        debug!("Cache miss for {}", domain);
        let result = compute().await;
        self.insert(domain, result.found).await;
        (result, false)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Drop every entry; for resetting state between runs
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

impl Default for DomainCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
