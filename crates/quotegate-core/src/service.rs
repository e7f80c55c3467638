//! Lookup orchestration: validate, consult the cache, then collapse misses
//! into a single upstream fetch per symbol.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::QuoteCache;
use crate::single_flight::SingleFlight;
use crate::source::QuoteSource;
use crate::{LookupError, Quote, Symbol, SymbolMatch};

/// Tunables for the lookup service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// How long a cached quote is served before it reads as absent.
    pub freshness_horizon: Duration,
    /// Wall-clock bound on one upstream fetch. The only cancellation
    /// mechanism: a timed-out leader fails, clears its ticket, and
    /// followers observe the failure.
    pub fetch_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            freshness_horizon: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(5),
        }
    }
}

impl ServiceConfig {
    /// Read overrides from `QUOTEGATE_FRESHNESS_SECS` and
    /// `QUOTEGATE_FETCH_TIMEOUT_MS`; unset or unparsable values keep the
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(secs) = env_u64("QUOTEGATE_FRESHNESS_SECS") {
            config.freshness_horizon = Duration::from_secs(secs);
        }
        if let Some(ms) = env_u64("QUOTEGATE_FETCH_TIMEOUT_MS") {
            config.fetch_timeout = Duration::from_millis(ms);
        }
        config
    }
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok()?.trim().parse().ok()
}

/// Cached, deduplicated quote lookup front for one upstream provider.
///
/// Shared process-wide; every handle sees the same cache and ticket table.
#[derive(Clone)]
pub struct QuoteService {
    source: Arc<dyn QuoteSource>,
    cache: QuoteCache,
    flights: SingleFlight,
    fetch_timeout: Duration,
}

impl QuoteService {
    pub fn new(source: Arc<dyn QuoteSource>, config: ServiceConfig) -> Self {
        Self {
            source,
            cache: QuoteCache::new(config.freshness_horizon),
            flights: SingleFlight::new(),
            fetch_timeout: config.fetch_timeout,
        }
    }

    /// Resolve a raw symbol string to a quote.
    ///
    /// Empty or whitespace input fails with an invalid-symbol error before
    /// any cache or ticket-table access. A fresh cached quote is returned
    /// without upstream involvement. On a miss, concurrent callers for the
    /// same symbol share one upstream fetch; the outcome is cached only on
    /// success and failures propagate to every joined caller unchanged.
    pub async fn lookup(&self, raw_symbol: &str) -> Result<Quote, LookupError> {
        let symbol = Symbol::parse(raw_symbol)?;

        if let Some(quote) = self.cache.get(&symbol).await {
            debug!(symbol = %symbol, "serving cached quote");
            return Ok(quote);
        }

        let source = Arc::clone(&self.source);
        let cache = self.cache.clone();
        let fetch_timeout = self.fetch_timeout;
        let fetch_symbol = symbol.clone();

        let outcome = self
            .flights
            .run(&symbol, move || async move {
                let fetched =
                    match tokio::time::timeout(fetch_timeout, source.fetch_quote(&fetch_symbol))
                        .await
                    {
                        Ok(result) => result?,
                        Err(_) => {
                            return Err(LookupError::unavailable(format!(
                                "quote fetch for {fetch_symbol} timed out after {}ms",
                                fetch_timeout.as_millis()
                            )))
                        }
                    };
                cache.set(fetch_symbol, fetched.clone()).await;
                Ok(fetched)
            })
            .await;

        if let Err(error) = &outcome {
            warn!(symbol = %symbol, kind = error.code(), "quote lookup failed");
        }
        outcome
    }

    /// Free-text symbol suggestions. A blank query yields an empty result
    /// set without touching the upstream collaborator.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SymbolMatch>, LookupError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        self.source.search(trimmed, limit).await
    }

    pub fn cache(&self) -> &QuoteCache {
        &self.cache
    }

    pub fn source_id(&self) -> &'static str {
        self.source.id()
    }
}
