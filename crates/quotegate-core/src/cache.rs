//! In-memory quote cache with a fixed freshness horizon.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::{Quote, Symbol};

#[derive(Debug, Clone)]
struct CacheEntry {
    quote: Quote,
    fetched_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<Symbol, CacheEntry>,
    horizon: Duration,
}

impl CacheInner {
    fn fresh(&self, entry: &CacheEntry) -> bool {
        entry.fetched_at.elapsed() <= self.horizon
    }
}

/// Thread-safe quote store keyed by symbol.
///
/// Entries older than the freshness horizon are indistinguishable from
/// never-fetched symbols: `get` reports them absent and `set` overwrites
/// them. Size is unbounded; freshness is the only invalidation.
#[derive(Debug, Clone)]
pub struct QuoteCache {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
}

impl QuoteCache {
    pub fn new(horizon: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner {
                map: HashMap::new(),
                horizon,
            })),
        }
    }

    /// Return the cached quote if present and still fresh.
    pub async fn get(&self, symbol: &Symbol) -> Option<Quote> {
        let store = self.inner.read().await;
        store
            .map
            .get(symbol)
            .filter(|entry| store.fresh(entry))
            .map(|entry| entry.quote.clone())
    }

    /// Unconditionally overwrite the entry for this symbol with a freshly
    /// stamped one.
    pub async fn set(&self, symbol: Symbol, quote: Quote) {
        let mut store = self.inner.write().await;
        store.map.insert(
            symbol,
            CacheEntry {
                quote,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop expired entries. Reclaims memory only; observable behavior is
    /// unchanged since expired entries already read as absent.
    pub async fn purge_expired(&self) {
        let mut store = self.inner.write().await;
        let horizon = store.horizon;
        store
            .map
            .retain(|_, entry| entry.fetched_at.elapsed() <= horizon);
    }

    pub async fn clear(&self) {
        let mut store = self.inner.write().await;
        store.map.clear();
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UtcDateTime;

    fn quote(symbol: &Symbol, price: f64) -> Quote {
        Quote::new(
            symbol.clone(),
            price,
            None,
            None,
            None,
            None,
            None,
            None,
            "USD",
            UtcDateTime::parse("2024-06-03T14:30:00Z").expect("valid timestamp"),
        )
        .expect("valid quote")
    }

    #[tokio::test]
    async fn get_after_set_returns_same_record() {
        let cache = QuoteCache::new(Duration::from_secs(30));
        let symbol = Symbol::parse("AAPL").expect("valid symbol");

        assert!(cache.get(&symbol).await.is_none());

        cache.set(symbol.clone(), quote(&symbol, 187.5)).await;
        let cached = cache.get(&symbol).await.expect("entry should be fresh");
        assert_eq!(cached.price, 187.5);
    }

    #[tokio::test]
    async fn set_overwrites_existing_entry() {
        let cache = QuoteCache::new(Duration::from_secs(30));
        let symbol = Symbol::parse("MSFT").expect("valid symbol");

        cache.set(symbol.clone(), quote(&symbol, 410.0)).await;
        cache.set(symbol.clone(), quote(&symbol, 412.5)).await;

        let cached = cache.get(&symbol).await.expect("entry should be fresh");
        assert_eq!(cached.price, 412.5);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_at_the_horizon() {
        let cache = QuoteCache::new(Duration::from_secs(30));
        let symbol = Symbol::parse("NVDA").expect("valid symbol");

        cache.set(symbol.clone(), quote(&symbol, 120.0)).await;

        // Exactly at the horizon the entry is still served.
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(cache.get(&symbol).await.is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get(&symbol).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_only_expired_entries() {
        let cache = QuoteCache::new(Duration::from_secs(30));
        let old = Symbol::parse("AAPL").expect("valid symbol");
        let recent = Symbol::parse("MSFT").expect("valid symbol");

        cache.set(old.clone(), quote(&old, 1.0)).await;
        tokio::time::advance(Duration::from_secs(31)).await;
        cache.set(recent.clone(), quote(&recent, 2.0)).await;

        cache.purge_expired().await;
        assert_eq!(cache.len().await, 1);
        assert!(cache.get(&recent).await.is_some());
    }

    #[tokio::test]
    async fn clear_empties_the_store() {
        let cache = QuoteCache::new(Duration::from_secs(30));
        let symbol = Symbol::parse("AAPL").expect("valid symbol");

        cache.set(symbol.clone(), quote(&symbol, 1.0)).await;
        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
