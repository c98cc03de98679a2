//! Memoization cache for Reynolds / friction-factor evaluations.
//!
//! The cache is an explicit object handed to the calculations that want it;
//! nothing in the workspace keeps a global one. Entries are keyed by the exact
//! bit patterns of the inputs, so a hit always returns what the uncached
//! function would have produced.
//!
//! Eviction is least-recently-used with a fixed capacity. Lookups take only the
//! read lock (recency stamps are atomics), inserts take the write lock, and a
//! concurrent insert for the same key is last-write-wins, which is harmless
//! because results for identical keys are identical.

use crate::correlations;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// Default number of entries kept.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CacheKey {
    Reynolds([u64; 4]),
    Friction([u64; 3]),
}

#[derive(Debug)]
struct Entry {
    value: f64,
    last_used: AtomicU64,
}

/// Hit/miss/eviction counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug)]
pub struct CorrelationCache {
    capacity: usize,
    entries: RwLock<HashMap<CacheKey, Entry>>,
    clock: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Default for CorrelationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CorrelationCache {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Cached [`correlations::reynolds`].
    pub fn reynolds(&self, density: f64, velocity: f64, diameter: f64, viscosity: f64) -> f64 {
        let key = CacheKey::Reynolds([
            density.to_bits(),
            velocity.to_bits(),
            diameter.to_bits(),
            viscosity.to_bits(),
        ]);
        self.get_or_insert_with(key, || {
            correlations::reynolds(density, velocity, diameter, viscosity)
        })
    }

    /// Cached [`correlations::friction_factor`].
    pub fn friction_factor(&self, reynolds: f64, roughness: f64, diameter: f64) -> f64 {
        let key = CacheKey::Friction([
            reynolds.to_bits(),
            roughness.to_bits(),
            diameter.to_bits(),
        ]);
        self.get_or_insert_with(key, || {
            correlations::friction_factor(reynolds, roughness, diameter)
        })
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn get_or_insert_with(&self, key: CacheKey, compute: impl FnOnce() -> f64) -> f64 {
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = entries.get(&key) {
                entry.last_used.store(self.tick(), Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                return entry.value;
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute();

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key,
            Entry {
                value,
                last_used: AtomicU64::new(self.tick()),
            },
        );
        while entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.last_used.load(Ordering::Relaxed))
                .map(|(k, _)| *k);
            let Some(oldest) = oldest else { break };
            entries.remove(&oldest);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            trace!(?oldest, "evicted correlation cache entry");
        }
        value
    }
}

/// Reynolds number through an optional cache.
pub fn reynolds_with(
    cache: Option<&CorrelationCache>,
    density: f64,
    velocity: f64,
    diameter: f64,
    viscosity: f64,
) -> f64 {
    match cache {
        Some(c) => c.reynolds(density, velocity, diameter, viscosity),
        None => correlations::reynolds(density, velocity, diameter, viscosity),
    }
}

/// Friction factor through an optional cache.
pub fn friction_factor_with(
    cache: Option<&CorrelationCache>,
    reynolds: f64,
    roughness: f64,
    diameter: f64,
) -> f64 {
    match cache {
        Some(c) => c.friction_factor(reynolds, roughness, diameter),
        None => correlations::friction_factor(reynolds, roughness, diameter),
    }
}
