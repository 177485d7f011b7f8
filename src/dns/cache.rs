//! Zone lookup caching.
//!
//! Resolving a zone name costs at least one paginated search round-trip,
//! and reconciliation workloads resolve the same handful of zones over
//! and over. Lookups are therefore cached per requested name with a
//! fixed time-to-live. Entries may serve answers that have gone stale on
//! the server within that window; callers accept at-most-stale-by-TTL as
//! part of the contract.
//!
//! The resolver does not care where cached answers live, only that it
//! can ask and store. The [`ZoneCache`] trait captures that contract so
//! tests and embedders can substitute their own storage.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Local};

use crate::rpc::protocol::ZoneId;

/// How long a cached zone id may be served before a fresh search is
/// required, in seconds.
pub const ZONE_CACHE_TTL_SECS: i64 = 600;

/// Cache contract consumed by the resolver: get-or-miss and put-with-TTL.
pub trait ZoneCache {
    fn get(&self, name: &str) -> Option<ZoneId>;
    fn put(&self, name: &str, id: ZoneId, ttl: Duration);
}

struct CacheEntry {
    id: ZoneId,
    ttl: Duration,
    timestamp: DateTime<Local>,
}

/// TTL-based in-memory cache, keyed by the literal requested name.
///
/// Expired entries are dropped lazily on access.
#[derive(Default)]
pub struct TtlZoneCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl TtlZoneCache {
    pub fn new() -> TtlZoneCache {
        TtlZoneCache {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl ZoneCache for TtlZoneCache {
    fn get(&self, name: &str) -> Option<ZoneId> {
        let entries = match self.entries.read() {
            Ok(entries) => entries,
            Err(_) => return None,
        };
        let entry = entries.get(name)?;
        let expires = entry.timestamp + entry.ttl;
        if expires < Local::now() {
            return None;
        }
        Some(entry.id.clone())
    }

    fn put(&self, name: &str, id: ZoneId, ttl: Duration) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                name.to_string(),
                CacheEntry {
                    id,
                    ttl,
                    timestamp: Local::now(),
                },
            );
        }
    }
}

/// Cache that never stores anything; every resolution pays the search.
pub struct NullCache;

impl ZoneCache for NullCache {
    fn get(&self, _name: &str) -> Option<ZoneId> {
        None
    }

    fn put(&self, _name: &str, _id: ZoneId, _ttl: Duration) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_within_ttl() {
        let cache = TtlZoneCache::new();
        cache.put("example.com", ZoneId::new("7"), Duration::seconds(600));

        assert_eq!(cache.get("example.com"), Some(ZoneId::new("7")));
        assert_eq!(cache.get("example.org"), None);
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let cache = TtlZoneCache::new();
        cache.put("example.com", ZoneId::new("7"), Duration::seconds(600));

        // age the entry past its ttl
        if let Ok(mut entries) = cache.entries.write() {
            if let Some(entry) = entries.get_mut("example.com") {
                entry.timestamp = Local::now() - Duration::seconds(601);
            }
        }

        assert_eq!(cache.get("example.com"), None);
    }

    #[test]
    fn test_put_replaces_and_restamps() {
        let cache = TtlZoneCache::new();
        cache.put("example.com", ZoneId::new("7"), Duration::seconds(600));
        cache.put("example.com", ZoneId::new("8"), Duration::seconds(600));

        assert_eq!(cache.get("example.com"), Some(ZoneId::new("8")));
    }

    #[test]
    fn test_null_cache_never_hits() {
        let cache = NullCache;
        cache.put("example.com", ZoneId::new("7"), Duration::seconds(600));
        assert_eq!(cache.get("example.com"), None);
    }
}
