//! Lookup cache with fetch-on-miss and time-based invalidation.

use chrono::{DateTime, Duration, Utc};
use color_eyre::{eyre::eyre, Result};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use super::entry::CacheEntry;

/// Where a looked-up value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
  /// Fetched from the network on this call
  Network,
  /// Served from the cache with no network access
  Cache,
}

/// Result of a lookup, with provenance for diagnostics.
#[derive(Debug, Clone)]
pub struct LookupResult<V> {
  /// The actual value
  pub value: V,
  /// Where the value came from
  pub source: LookupSource,
  /// When the value was fetched from the network
  pub fetched_at: DateTime<Utc>,
}

/// In-memory cache mapping a numeric id to the last fetched record.
///
/// Values are served from memory while younger than `max_age` and refetched
/// through a caller-supplied fetch function otherwise. A failed fetch never
/// disturbs what is already cached. There is no request de-duplication: two
/// concurrent misses for the same key both fetch and the last store wins,
/// which is acceptable for the handful of records a screen shows at once.
pub struct LookupCache<K, V> {
  entries: Mutex<HashMap<K, CacheEntry<V>>>,
  max_age: Option<Duration>,
}

impl<K, V> LookupCache<K, V>
where
  K: Eq + Hash + Copy,
  V: Clone,
{
  /// Create a cache whose entries stay fresh for `max_age`.
  ///
  /// `None` disables expiry: entries then only leave the cache through
  /// `invalidate` or `clear`. Phone numbers use this mode, collection
  /// details use a finite age; both come from configuration.
  pub fn new(max_age: Option<Duration>) -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
      max_age,
    }
  }

  /// Look up `key`, falling back to `fetch` on miss or staleness.
  ///
  /// A fresh cached entry is returned without invoking `fetch`. Otherwise
  /// `fetch(key)` runs; on success its result is stored and returned, on
  /// failure the error propagates and the cache is left exactly as it was
  /// (a stale entry is not replaced with a failure marker).
  pub async fn get_with<F, Fut>(&self, key: K, fetch: F) -> Result<LookupResult<V>>
  where
    F: FnOnce(K) -> Fut,
    Fut: Future<Output = Result<V>>,
  {
    if let Some(hit) = self.lookup_fresh(&key)? {
      return Ok(hit);
    }
    self.fetch_and_store(key, fetch).await
  }

  /// Fetch `key` unconditionally, bypassing any fresh entry.
  ///
  /// Behaves like a miss: success overwrites the entry, failure propagates
  /// and leaves the prior entry (if any) intact.
  pub async fn refresh_with<F, Fut>(&self, key: K, fetch: F) -> Result<LookupResult<V>>
  where
    F: FnOnce(K) -> Fut,
    Fut: Future<Output = Result<V>>,
  {
    self.fetch_and_store(key, fetch).await
  }

  /// Cached-only read: the fresh entry's value, or `None`. Never fetches.
  ///
  /// Stale entries are treated as absent, so the freshness bound holds on
  /// this path too.
  pub fn peek(&self, key: &K) -> Result<Option<V>> {
    Ok(self.lookup_fresh(key)?.map(|hit| hit.value))
  }

  /// Remove the entry for `key`, reporting whether one was present.
  ///
  /// Called after a mutation known to change the underlying record.
  pub fn invalidate(&self, key: &K) -> Result<bool> {
    Ok(self.lock()?.remove(key).is_some())
  }

  /// Remove all entries (logout or explicit cache reset).
  pub fn clear(&self) -> Result<()> {
    self.lock()?.clear();
    Ok(())
  }

  /// Current entry count, including stale entries not yet refetched.
  /// Diagnostics and tests only.
  pub fn len(&self) -> Result<usize> {
    Ok(self.lock()?.len())
  }

  pub fn is_empty(&self) -> Result<bool> {
    Ok(self.lock()?.is_empty())
  }

  fn lookup_fresh(&self, key: &K) -> Result<Option<LookupResult<V>>> {
    let entries = self.lock()?;
    let hit = entries
      .get(key)
      .filter(|entry| entry.is_fresh(self.max_age))
      .map(|entry| LookupResult {
        value: entry.value.clone(),
        source: LookupSource::Cache,
        fetched_at: entry.fetched_at,
      });
    Ok(hit)
  }

  async fn fetch_and_store<F, Fut>(&self, key: K, fetch: F) -> Result<LookupResult<V>>
  where
    F: FnOnce(K) -> Fut,
    Fut: Future<Output = Result<V>>,
  {
    // The lock is never held across this await; concurrent fetches for the
    // same key are allowed and the last store wins.
    let value = fetch(key).await?;
    let entry = CacheEntry::new(value.clone());
    let fetched_at = entry.fetched_at;
    self.lock()?.insert(key, entry);
    Ok(LookupResult {
      value,
      source: LookupSource::Network,
      fetched_at,
    })
  }

  fn lock(&self) -> Result<MutexGuard<'_, HashMap<K, CacheEntry<V>>>> {
    self
      .entries
      .lock()
      .map_err(|e| eyre!("Cache lock poisoned: {}", e))
  }

  /// Age an entry artificially so tests can cross the staleness boundary
  /// without sleeping.
  #[cfg(test)]
  fn backdate(&self, key: &K, by: Duration) {
    let mut entries = self.entries.lock().unwrap();
    if let Some(entry) = entries.get_mut(key) {
      entry.fetched_at = entry.fetched_at - by;
    }
  }
}
