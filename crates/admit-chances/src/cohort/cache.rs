//! Memoization of the two engine inputs.
//!
//! The institutional snapshot changes rarely and is cached for hours; peer cohorts
//! are cached for minutes under a [`CohortKey`]. Both use `moka::sync::Cache`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use serde::Serialize;

use super::key::CohortKey;
use super::source::SourceError;
use crate::engine::{SchoolData, SimilarProfileStats};

/// TTLs and capacity for [`CohortCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub school_ttl: Duration,
    pub cohort_ttl: Duration,
    pub max_cohort_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            school_ttl: Duration::from_secs(6 * 60 * 60),
            cohort_ttl: Duration::from_secs(5 * 60),
            max_cohort_entries: 10_000,
        }
    }
}

/// Value served from the cache, with whether it was already present.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: Arc<T>,
    pub hit: bool,
}

/// Counters exposed for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub cohort_entries: u64,
    pub cohort_hits: u64,
    pub cohort_misses: u64,
    pub cohort_hit_rate: f64,
    pub school_snapshot_cached: bool,
}

pub struct CohortCache {
    schools: Cache<(), Arc<Vec<SchoolData>>>,
    cohorts: Cache<CohortKey, Arc<Vec<SimilarProfileStats>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CohortCache {
    pub fn new(config: &CacheConfig) -> Self {
        let schools = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.school_ttl)
            .build();
        let cohorts = Cache::builder()
            .max_capacity(config.max_cohort_entries)
            .time_to_live(config.cohort_ttl)
            .build();

        Self {
            schools,
            cohorts,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cached institutional snapshot, loading it with `fetch` on a miss.
    ///
    /// Failed fetches are not cached.
    pub fn schools_or_fetch<F>(&self, fetch: F) -> Result<Cached<Vec<SchoolData>>, SourceError>
    where
        F: FnOnce() -> Result<Vec<SchoolData>, SourceError>,
    {
        if let Some(value) = self.schools.get(&()) {
            return Ok(Cached { value, hit: true });
        }

        let value = Arc::new(fetch()?);
        self.schools.insert((), value.clone());
        Ok(Cached { value, hit: false })
    }

    /// Cached peer cohort for `key`, loading it with `fetch` on a miss.
    pub fn cohort_or_fetch<F>(
        &self,
        key: &CohortKey,
        fetch: F,
    ) -> Result<Cached<Vec<SimilarProfileStats>>, SourceError>
    where
        F: FnOnce() -> Result<Vec<SimilarProfileStats>, SourceError>,
    {
        if let Some(value) = self.cohorts.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Cached { value, hit: true });
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = Arc::new(fetch()?);
        self.cohorts.insert(key.clone(), value.clone());
        Ok(Cached { value, hit: false })
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            cohort_entries: self.cohorts.entry_count(),
            cohort_hits: hits,
            cohort_misses: misses,
            cohort_hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
            school_snapshot_cached: self.schools.contains_key(&()),
        }
    }

    /// Drop both caches, e.g. after new submissions or a data refresh.
    pub fn invalidate_all(&self) {
        self.schools.invalidate_all();
        self.cohorts.invalidate_all();
    }
}

impl Default for CohortCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}
