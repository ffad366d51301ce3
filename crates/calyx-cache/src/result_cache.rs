//! In-memory result cache with single-flight computation.
//!
//! Every lookup path goes through [`ResultCache::get_or_compute`], which
//! guarantees that concurrent callers for the same uncomputed key share one
//! underlying engine invocation: the first caller computes while holding the
//! key's slot lock, later callers await the lock and observe the stored
//! value.
//!
//! The configuration fingerprint is part of the key, so a changed weight
//! configuration can never serve a stale result. Staleness is therefore
//! limited to company-data changes, which callers signal via
//! [`ResultCache::invalidate`].
//!
//! The cache is best-effort: a computation error is returned to the caller
//! who ran it and nothing is stored, so the next caller simply recomputes.
//! The cache is constructed explicitly and injected wherever it is needed;
//! there is no process-global instance.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use calyx_common::error::Result;
use calyx_scoring::score::ScoringResult;

/// Cache key: one company under one logical weight configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub company_id: Uuid,
    pub fingerprint: String,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entries older than this are treated as misses and dropped.
    pub ttl: Duration,
    /// Oldest entries are evicted past this bound.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(1),
            max_entries: 1024,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// One cached (or in-flight) result. Holding the slot lock while computing
/// is what serializes concurrent callers of the same key.
#[derive(Default)]
struct Slot {
    value: Option<(Arc<ScoringResult>, DateTime<Utc>)>,
}

pub struct ResultCache {
    slots: Mutex<HashMap<CacheKey, Arc<Mutex<Slot>>>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Non-computing lookup. Returns None on miss or expiry.
    pub async fn get(&self, company_id: Uuid, fingerprint: &str) -> Option<Arc<ScoringResult>> {
        let key = CacheKey { company_id, fingerprint: fingerprint.to_string() };
        let slot = {
            let slots = self.slots.lock().await;
            slots.get(&key)?.clone()
        };
        let guard = slot.lock().await;
        match &guard.value {
            Some((result, stored_at)) if !self.expired(*stored_at) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(result.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a result directly.
    pub async fn put(&self, company_id: Uuid, fingerprint: &str, result: ScoringResult) {
        let key = CacheKey { company_id, fingerprint: fingerprint.to_string() };
        let slot = self.slot_for(key).await;
        let mut guard = slot.lock().await;
        guard.value = Some((Arc::new(result), Utc::now()));
    }

    /// Look up the key, computing (once) on miss.
    ///
    /// Concurrent callers with the same key share the first caller's
    /// computation. If the computation fails nothing is cached and the
    /// error goes to the caller that ran it; a later caller recomputes.
    pub async fn get_or_compute<F, Fut>(
        &self,
        company_id: Uuid,
        fingerprint: &str,
        compute: F,
    ) -> Result<Arc<ScoringResult>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ScoringResult>>,
    {
        let key = CacheKey { company_id, fingerprint: fingerprint.to_string() };
        let slot = self.slot_for(key.clone()).await;

        let mut guard = slot.lock().await;
        if let Some((result, stored_at)) = &guard.value {
            if !self.expired(*stored_at) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(company_id = %company_id, "cache hit");
                return Ok(result.clone());
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(company_id = %company_id, "cache miss; computing");
        let result = Arc::new(compute().await?);
        guard.value = Some((result.clone(), Utc::now()));
        Ok(result)
    }

    /// Drop every entry for a company, across all configurations. Callers
    /// use this to signal that the company's underlying data changed.
    pub async fn invalidate(&self, company_id: Uuid) {
        let mut slots = self.slots.lock().await;
        slots.retain(|key, _| key.company_id != company_id);
    }

    pub async fn clear_all(&self) {
        let mut slots = self.slots.lock().await;
        slots.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        let slots = self.slots.lock().await;
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: slots.len(),
        }
    }

    /// Get or create the slot for a key, evicting as needed.
    async fn slot_for(&self, key: CacheKey) -> Arc<Mutex<Slot>> {
        let mut slots = self.slots.lock().await;
        if !slots.contains_key(&key) && slots.len() >= self.config.max_entries {
            self.evict_oldest(&mut slots);
        }
        slots.entry(key).or_default().clone()
    }

    fn expired(&self, stored_at: DateTime<Utc>) -> bool {
        Utc::now() - stored_at > self.config.ttl
    }

    /// Evict the entry with the oldest stored value. Slots that are still
    /// computing have no timestamp and are never evicted here.
    fn evict_oldest(&self, slots: &mut HashMap<CacheKey, Arc<Mutex<Slot>>>) {
        let oldest = slots
            .iter()
            .filter_map(|(key, slot)| {
                let guard = slot.try_lock().ok()?;
                let (_, stored_at) = guard.value.as_ref()?;
                Some((key.clone(), *stored_at))
            })
            .min_by_key(|(_, stored_at)| *stored_at);

        if let Some((key, _)) = oldest {
            debug!(company_id = %key.company_id, "evicting oldest cache entry");
            slots.remove(&key);
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
