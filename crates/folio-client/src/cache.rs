//! Time-boxed response cache shared by every dispatch in the process

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use moka::future::Cache;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);
const MAX_ENTRIES: u64 = 1_000;

/// Counters describing cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

/// Memoizes response bodies by caller-supplied key for a fixed TTL.
///
/// This is a serving-layer optimization, not a source of truth: a read may
/// return a value up to one TTL old, and concurrent writers to the same key
/// race with last-writer-wins. Values are replaced whole, never mutated.
pub struct ResponseCache {
    entries: Cache<String, Value>,
    ttl: Duration,
    sweep_interval: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration, sweep_interval: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();

        Self {
            entries,
            ttl,
            sweep_interval,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sweeper: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start the periodic sweep. Calling it again restarts the task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn init(&self) {
        let entries = self.entries.clone();
        let period = self.sweep_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                entries.run_pending_tasks().await;
                debug!(entries = entries.entry_count(), "Swept response cache");
            }
        });

        let mut sweeper = self.sweeper.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = sweeper.replace(handle) {
            previous.abort();
        }
    }

    /// Stop the periodic sweep
    pub fn dispose(&self) {
        let mut sweeper = self.sweeper.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = sweeper.take() {
            handle.abort();
        }
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .map(|s| s.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Value stored under `key`, if it was stored less than one TTL ago.
    ///
    /// Expired entries read as absent whether or not a sweep has run.
    pub async fn get(&self, key: &str) -> Option<Value> {
        match self.entries.get(key).await {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value).await;
    }

    pub async fn delete(&self, key: &str) {
        self.entries.invalidate(key).await;
    }

    /// Drop every entry whose key contains `pattern`
    pub fn delete_matching(&self, pattern: &str) {
        let pattern = pattern.to_string();
        if let Err(e) = self
            .entries
            .invalidate_entries_if(move |key, _| key.contains(&pattern))
        {
            warn!(error = %e, "Failed to invalidate cache entries");
        }
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    /// Remove all expired entries now
    pub async fn sweep(&self) {
        self.entries.run_pending_tasks().await;
    }

    pub async fn stats(&self) -> CacheStats {
        self.entries.run_pending_tasks().await;
        CacheStats {
            entries: self.entries.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_SWEEP_INTERVAL)
    }
}

impl Drop for ResponseCache {
    fn drop(&mut self) {
        self.dispose();
    }
}
