//! Memo table for twilight circumstances.
//!
//! Entries are keyed by date, location and the calculator settings that
//! shape the result, and expire after a fixed time to live (12 hours by
//! default). Two threads missing on the same key both recompute and the
//! later insert wins.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::twilight::TwilightCircumstances;
use crate::config::{TwilightSettings, VisibilityConfig};
use crate::core::domain::Location;

/// Cache key: local date, the exact coordinates of the site and the
/// settings a [`TwilightCalculator`](super::TwilightCalculator) solves with.
///
/// The refinement round schedule is left out: it only moves results within
/// the solver tolerance, which is part of the key. Calculators sharing a
/// cache are assumed to share one ephemeris.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TwilightKey {
    date: NaiveDate,
    latitude_bits: u64,
    longitude_bits: u64,
    sunset_altitude_bits: u64,
    resample_minutes: u32,
    tolerance_seconds: u32,
}

impl TwilightKey {
    pub fn new(date: NaiveDate, location: &Location, config: &VisibilityConfig) -> Self {
        Self {
            date,
            latitude_bits: location.latitude.value().to_bits(),
            longitude_bits: location.longitude.value().to_bits(),
            sunset_altitude_bits: config.twilight.sunset_altitude.to_bits(),
            resample_minutes: config.twilight.resample_minutes,
            tolerance_seconds: config.solver.tolerance_seconds,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Storage for computed twilight circumstances.
pub trait TwilightCache: Send + Sync {
    fn get(&self, key: &TwilightKey) -> Option<TwilightCircumstances>;
    fn insert(&self, key: TwilightKey, value: TwilightCircumstances);
}

/// Cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTwilightCache;

impl TwilightCache for NoopTwilightCache {
    fn get(&self, _key: &TwilightKey) -> Option<TwilightCircumstances> {
        None
    }

    fn insert(&self, _key: TwilightKey, _value: TwilightCircumstances) {}
}

#[derive(Debug, Clone)]
struct Entry {
    value: TwilightCircumstances,
    inserted_at: DateTime<Utc>,
}

/// In-memory cache with a time to live.
#[derive(Debug)]
pub struct MemoryTwilightCache {
    ttl: Duration,
    entries: RwLock<HashMap<TwilightKey, Entry>>,
}

impl Default for MemoryTwilightCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTwilightCache {
    /// Cache with the default 12 hour time to live.
    pub fn new() -> Self {
        Self::from_settings(&TwilightSettings::default())
    }

    pub fn from_settings(settings: &TwilightSettings) -> Self {
        Self::with_ttl(Duration::hours(i64::from(settings.cache_ttl_hours)))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Entry for `key` if it is younger than the time to live at `now`.
    pub fn get_at(&self, key: &TwilightKey, now: DateTime<Utc>) -> Option<TwilightCircumstances> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| now - entry.inserted_at < self.ttl)
            .map(|entry| entry.value)
    }

    /// Stores `value` and evicts every entry that has expired at `now`.
    pub fn insert_at(&self, key: TwilightKey, value: TwilightCircumstances, now: DateTime<Utc>) {
        let mut entries = self.entries.write();
        let removed = Self::evict_expired(&mut entries, self.ttl, now);
        if removed > 0 {
            log::trace!("evicted {} expired twilight entries", removed);
        }
        entries.insert(
            key,
            Entry {
                value,
                inserted_at: now,
            },
        );
    }

    fn evict_expired(
        entries: &mut HashMap<TwilightKey, Entry>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> usize {
        let before = entries.len();
        entries.retain(|_, entry| now - entry.inserted_at < ttl);
        before - entries.len()
    }

    /// Drops expired entries and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now())
    }

    pub fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let removed = Self::evict_expired(&mut self.entries.write(), self.ttl, now);
        if removed > 0 {
            log::debug!("purged {} expired twilight entries", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl TwilightCache for MemoryTwilightCache {
    fn get(&self, key: &TwilightKey) -> Option<TwilightCircumstances> {
        self.get_at(key, Utc::now())
    }

    fn insert(&self, key: TwilightKey, value: TwilightCircumstances) {
        self.insert_at(key, value, Utc::now());
    }
}

static SHARED_CACHE: OnceCell<MemoryTwilightCache> = OnceCell::new();

/// Process-wide cache for callers that do not manage their own.
pub fn shared_twilight_cache() -> &'static MemoryTwilightCache {
    SHARED_CACHE.get_or_init(MemoryTwilightCache::new)
}
