//! Cache entry bookkeeping.

use chrono::{DateTime, Duration, Utc};

/// A fetched value together with the instant it was fetched.
///
/// Entries are owned by the cache and replaced wholesale on refetch; the
/// fetch timestamp is never updated in place.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<V> {
  pub(crate) value: V,
  pub(crate) fetched_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
  pub(crate) fn new(value: V) -> Self {
    Self {
      value,
      fetched_at: Utc::now(),
    }
  }

  /// Whether the entry may still be served under `max_age`.
  ///
  /// `None` means entries never expire. An entry exactly `max_age` old
  /// already counts as stale.
  pub(crate) fn is_fresh(&self, max_age: Option<Duration>) -> bool {
    match max_age {
      None => true,
      Some(limit) => Utc::now() - self.fetched_at < limit,
    }
  }
}
