//! Session-scoped lookup caching.
//!
//! Each cache instance is owned by the session that created it and dies with
//! it; nothing here is global. A cache maps a numeric id to the last record
//! fetched for it and serves that record until it is older than the
//! configured maximum age, at which point the next lookup fetches again.

mod entry;
mod lookup;

pub use lookup::{LookupCache, LookupResult, LookupSource};
