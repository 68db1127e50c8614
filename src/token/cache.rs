//! Token Cache
//!
//! Single-slot cache for the one live token entry. Expiry is a read-time
//! policy check; there is no background eviction task, and the stale entry
//! is physically dropped on the next store.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, RwLock};

use crate::types::token::TokenEntry;

/// Minimum usable window in seconds from the moment an entry is stored,
/// so a refresh is never invalidated by its own read.
const MIN_USABLE_SECS: i64 = 1;

struct CachedEntry {
    entry: TokenEntry,
    valid_until: DateTime<Utc>,
}

/// Single-slot token cache. Cheap to clone; clones share the slot.
#[derive(Clone, Default)]
pub struct TokenCache {
    slot: Arc<RwLock<Option<CachedEntry>>>,
}

impl TokenCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the current entry only while it is live. An expired entry
    /// behaves as absent even if still physically resident.
    pub fn peek(&self) -> Option<TokenEntry> {
        let slot = self.slot.read().unwrap();
        slot.as_ref()
            .filter(|cached| Utc::now() < cached.valid_until)
            .map(|cached| cached.entry.clone())
    }

    /// Atomically replace the slot's content. Last write wins by completion
    /// order. An entry whose expiry is already near or past stays usable
    /// for the minimum window from now.
    pub fn store(&self, entry: TokenEntry) {
        let valid_until = entry
            .expires_at
            .max(Utc::now() + Duration::seconds(MIN_USABLE_SECS));
        *self.slot.write().unwrap() = Some(CachedEntry { entry, valid_until });
    }

    /// Drop the slot's content.
    pub fn clear(&self) {
        *self.slot.write().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(token: &str, ttl_secs: i64) -> TokenEntry {
        TokenEntry::new(token.to_string(), Utc::now() + Duration::seconds(ttl_secs))
    }

    #[test]
    fn test_empty_cache_peeks_none() {
        let cache = TokenCache::new();
        assert!(cache.peek().is_none());
    }

    #[test]
    fn test_store_then_peek() {
        let cache = TokenCache::new();
        cache.store(entry("AAA", 3600));

        let peeked = cache.peek().unwrap();
        assert_eq!(peeked.token, "AAA");
    }

    #[test]
    fn test_expired_entry_behaves_as_absent() {
        let cache = TokenCache::new();
        // plant an entry whose usable window is already over
        *cache.slot.write().unwrap() = Some(CachedEntry {
            entry: entry("AAA", -120),
            valid_until: Utc::now() - Duration::seconds(1),
        });
        assert!(cache.peek().is_none());
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let cache = TokenCache::new();
        *cache.slot.write().unwrap() = Some(CachedEntry {
            entry: entry("AAA", 0),
            valid_until: Utc::now() + Duration::seconds(5),
        });
        assert!(cache.peek().is_some());

        *cache.slot.write().unwrap() = Some(CachedEntry {
            entry: entry("AAA", 0),
            valid_until: Utc::now(),
        });
        assert!(cache.peek().is_none());
    }

    #[test]
    fn test_minimum_usable_window() {
        let cache = TokenCache::new();
        // computed lifetime already elapsed
        cache.store(entry("AAA", -30));
        let peeked = cache.peek();
        assert!(peeked.is_some(), "near-zero lifetime entry must be usable");
    }

    #[test]
    fn test_store_replaces_previous_entry() {
        let cache = TokenCache::new();
        cache.store(entry("AAA", 3600));
        cache.store(entry("BBB", 3600));

        assert_eq!(cache.peek().unwrap().token, "BBB");
    }

    #[test]
    fn test_clones_share_the_slot() {
        let cache = TokenCache::new();
        let clone = cache.clone();
        cache.store(entry("AAA", 3600));

        assert_eq!(clone.peek().unwrap().token, "AAA");
    }

    #[test]
    fn test_clear_empties_the_slot() {
        let cache = TokenCache::new();
        cache.store(entry("AAA", 3600));
        cache.clear();
        assert!(cache.peek().is_none());
    }
}
