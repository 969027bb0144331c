use crate::address::Address;
use ahash::AHashMap;
use std::time::{Duration, Instant};
use tracing::trace;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    timestamp: Instant,
    value: V,
}

/// A bounded map from Darknode address to a value fetched from the registry.
///
/// An entry is trusted for `update_period` after it was last used; after
/// that the next lookup fetches it again. Every lookup touches the entry. When
/// the cache grows past `limit` the least recently touched entry is evicted.
#[derive(Debug, Clone)]
pub struct TtlCache<V> {
    entries: AHashMap<Address, CacheEntry<V>>,
    limit: usize,
    update_period: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(limit: usize, update_period: Duration) -> Self {
        TtlCache {
            entries: AHashMap::new(),
            limit,
            update_period,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn update_period(&self) -> Duration {
        self.update_period
    }

    /// The cached value for `address` if it is still fresh. Does not touch
    /// the entry.
    pub fn peek(&self, address: &Address) -> Option<&V> {
        self.entries
            .get(address)
            .filter(|entry| self.is_fresh(entry, Instant::now()))
            .map(|entry| &entry.value)
    }

    /// Return the value for `address`, calling `fetch` when the entry is
    /// missing or stale. A failed fetch leaves the cache untouched and is
    /// returned as is, stale values are never served in its place.
    pub fn refresh<E, F>(&mut self, address: &Address, fetch: F) -> Result<V, E>
    where
        F: FnOnce(&Address) -> Result<V, E>,
    {
        let now = Instant::now();
        let value = match self.entries.get(address) {
            Some(entry) if self.is_fresh(entry, now) => entry.value.clone(),
            _ => {
                trace!("cache miss for {}", address);
                fetch(address)?
            }
        };

        self.entries.insert(
            *address,
            CacheEntry {
                timestamp: now,
                value: value.clone(),
            },
        );
        self.evict();
        Ok(value)
    }

    pub fn remove(&mut self, address: &Address) -> Option<V> {
        self.entries.remove(address).map(|entry| entry.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.timestamp) <= self.update_period
    }

    fn evict(&mut self) {
        while self.entries.len() > self.limit {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.timestamp)
                .map(|(address, _)| *address);
            match oldest {
                Some(address) => {
                    trace!("evicting {} from cache", address);
                    self.entries.remove(&address);
                }
                None => break,
            }
        }
    }
}
