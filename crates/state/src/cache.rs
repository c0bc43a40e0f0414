use crate::StoreError;
use event::{EnrichedWithdrawalEvent, EventKey};
use lru::LruCache;
use std::num::NonZeroUsize;

/// Bounded store for the lowest-severity bucket.
///
/// Insert beyond capacity evicts the least-recently-used entry. Eviction is
/// silent by design: the lifetime counter for this bucket lives in the store
/// and is never decremented here.
#[derive(Debug)]
pub struct RiskCache {
    entries: LruCache<EventKey, EnrichedWithdrawalEvent>,
}

impl RiskCache {
    pub fn new(capacity: usize) -> Result<Self, StoreError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(StoreError::ZeroCacheCapacity)?;
        Ok(Self {
            entries: LruCache::new(capacity),
        })
    }

    /// Insert or refresh an entry, evicting the LRU entry when full.
    pub fn insert(&mut self, key: EventKey, event: EnrichedWithdrawalEvent) {
        self.entries.put(key, event);
    }

    pub fn contains(&self, key: &EventKey) -> bool {
        self.entries.contains(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current residents, for snapshotting. Does not touch recency order.
    pub fn iter(&self) -> impl Iterator<Item = (&EventKey, &EnrichedWithdrawalEvent)> {
        self.entries.iter()
    }
}
