//! Behavior-driven tests for the cached, deduplicated lookup path.
//!
//! These tests verify HOW the lookup service behaves under cache hits,
//! misses, concurrent demand for one symbol, and upstream failure, using a
//! counting source double and the paused tokio clock.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quotegate_core::{
    LookupError, LookupErrorKind, Quote, QuoteService, QuoteSource, ServiceConfig, Symbol,
    SymbolMatch, UtcDateTime,
};

// =============================================================================
// Counting source double
// =============================================================================

struct CountingSource {
    delay: Duration,
    price: f64,
    failures: Mutex<VecDeque<LookupError>>,
    quote_calls: AtomicUsize,
    search_calls: AtomicUsize,
    fetched_symbols: Mutex<Vec<String>>,
    search_queries: Mutex<Vec<String>>,
}

impl CountingSource {
    fn new() -> Self {
        Self {
            delay: Duration::ZERO,
            price: 187.5,
            failures: Mutex::new(VecDeque::new()),
            quote_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            fetched_symbols: Mutex::new(Vec::new()),
            search_queries: Mutex::new(Vec::new()),
        }
    }

    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    fn push_failure(&self, error: LookupError) {
        self.failures
            .lock()
            .expect("failure queue lock is not poisoned")
            .push_back(error);
    }

    fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }

    fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn fetched_symbols(&self) -> Vec<String> {
        self.fetched_symbols
            .lock()
            .expect("symbol log lock is not poisoned")
            .clone()
    }

    fn search_queries(&self) -> Vec<String> {
        self.search_queries
            .lock()
            .expect("query log lock is not poisoned")
            .clone()
    }

    fn quote_for(&self, symbol: &Symbol) -> Quote {
        Quote::new(
            symbol.clone(),
            self.price,
            Some(0.5),
            Some(0.27),
            None,
            None,
            None,
            None,
            "USD",
            UtcDateTime::parse("2024-06-03T14:30:00Z").expect("fixture timestamp is valid"),
        )
        .expect("fixture quote is valid")
    }
}

impl QuoteSource for CountingSource {
    fn id(&self) -> &'static str {
        "counting"
    }

    fn fetch_quote<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Quote, LookupError>> + Send + 'a>> {
        Box::pin(async move {
            self.quote_calls.fetch_add(1, Ordering::SeqCst);
            self.fetched_symbols
                .lock()
                .expect("symbol log lock is not poisoned")
                .push(symbol.as_str().to_owned());

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let scripted_failure = self
                .failures
                .lock()
                .expect("failure queue lock is not poisoned")
                .pop_front();
            match scripted_failure {
                Some(error) => Err(error),
                None => Ok(self.quote_for(symbol)),
            }
        })
    }

    fn search<'a>(
        &'a self,
        query: &'a str,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SymbolMatch>, LookupError>> + Send + 'a>> {
        Box::pin(async move {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            self.search_queries
                .lock()
                .expect("query log lock is not poisoned")
                .push(query.to_owned());

            Ok(vec![SymbolMatch {
                symbol: String::from("AAPL"),
                description: String::from("Apple Inc"),
                kind: String::from("Common Stock"),
            }]
            .into_iter()
            .take(limit)
            .collect())
        })
    }
}

fn service_with(source: Arc<CountingSource>) -> QuoteService {
    QuoteService::new(
        source,
        ServiceConfig {
            freshness_horizon: Duration::from_secs(30),
            fetch_timeout: Duration::from_millis(500),
        },
    )
}

// =============================================================================
// Validation happens before any shared state
// =============================================================================

#[tokio::test]
async fn when_symbol_is_blank_lookup_fails_before_touching_the_adapter() {
    let source = Arc::new(CountingSource::new());
    let service = service_with(Arc::clone(&source));

    for raw in ["", "   ", "\t\n"] {
        let error = service.lookup(raw).await.expect_err("blank symbol must fail");
        assert_eq!(error.kind(), LookupErrorKind::InvalidSymbol);
        assert_eq!(error.status(), 400);
        assert!(!error.retryable());
    }

    assert_eq!(source.quote_calls(), 0);
    assert!(service.cache().is_empty().await);
}

// =============================================================================
// Cache behavior through the lookup path
// =============================================================================

#[tokio::test]
async fn lookup_normalizes_the_symbol_and_caches_the_result() {
    let source = Arc::new(CountingSource::new());
    let service = service_with(Arc::clone(&source));

    let first = service.lookup("aapl").await.expect("first lookup succeeds");
    assert_eq!(first.symbol.as_str(), "AAPL");
    assert_eq!(source.fetched_symbols(), vec![String::from("AAPL")]);

    // Immediate second lookup for the same symbol is served from cache.
    let second = service.lookup("AAPL").await.expect("second lookup succeeds");
    assert_eq!(second, first);
    assert_eq!(source.quote_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn expired_entries_trigger_a_fresh_fetch() {
    let source = Arc::new(CountingSource::new());
    let service = service_with(Arc::clone(&source));

    service.lookup("MSFT").await.expect("lookup succeeds");
    assert_eq!(source.quote_calls(), 1);

    tokio::time::advance(Duration::from_secs(31)).await;

    service.lookup("MSFT").await.expect("lookup succeeds");
    assert_eq!(source.quote_calls(), 2);
}

// =============================================================================
// Single-flight semantics through the lookup path
// =============================================================================

#[tokio::test(start_paused = true)]
async fn concurrent_cold_lookups_invoke_the_adapter_exactly_once() {
    let source = Arc::new(CountingSource::with_delay(Duration::from_millis(50)));
    let service = service_with(Arc::clone(&source));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move { service.lookup("NVDA").await }));
    }

    let mut prices = Vec::new();
    for handle in handles {
        let quote = handle
            .await
            .expect("task should not panic")
            .expect("lookup should succeed");
        prices.push(quote.price);
    }

    assert_eq!(source.quote_calls(), 1);
    assert!(prices.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test(start_paused = true)]
async fn leader_failure_reaches_every_joined_follower() {
    let source = Arc::new(CountingSource::with_delay(Duration::from_millis(20)));
    source.push_failure(LookupError::rate_limited("provider throttled"));
    let service = service_with(Arc::clone(&source));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let service = service.clone();
        handles.push(tokio::spawn(async move { service.lookup("TSLA").await }));
    }

    for handle in handles {
        let error = handle
            .await
            .expect("task should not panic")
            .expect_err("all callers should observe the leader's failure");
        assert_eq!(error.kind(), LookupErrorKind::RateLimited);
    }
    assert_eq!(source.quote_calls(), 1);

    // The ticket is gone; a later lookup starts an independent fetch rather
    // than replaying the failed one.
    let quote = service.lookup("TSLA").await.expect("fresh fetch succeeds");
    assert_eq!(quote.symbol.as_str(), "TSLA");
    assert_eq!(source.quote_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn timed_out_leader_fails_followers_instead_of_hanging() {
    let source = Arc::new(CountingSource::with_delay(Duration::from_secs(60)));
    let service = service_with(Arc::clone(&source));

    let leader = {
        let service = service.clone();
        tokio::spawn(async move { service.lookup("AMZN").await })
    };
    let follower = {
        let service = service.clone();
        tokio::spawn(async move { service.lookup("AMZN").await })
    };

    for handle in [leader, follower] {
        let error = handle
            .await
            .expect("task should not panic")
            .expect_err("timeout should surface as a failure");
        assert_eq!(error.kind(), LookupErrorKind::Upstream);
        assert!(error.retryable());
        assert!(error.message().contains("timed out"));
    }

    // The ticket cleared on timeout, so demand is serviceable again.
    assert_eq!(source.quote_calls(), 1);
    let _ = service.lookup("AMZN").await;
    assert_eq!(source.quote_calls(), 2);
}

// =============================================================================
// Failures are never cached
// =============================================================================

#[tokio::test]
async fn rate_limited_failures_map_to_429_and_leave_the_cache_empty() {
    let source = Arc::new(CountingSource::new());
    source.push_failure(LookupError::rate_limited("provider throttled"));
    let service = service_with(Arc::clone(&source));

    let error = service
        .lookup("GOOG")
        .await
        .expect_err("scripted failure should propagate");
    assert_eq!(error.kind(), LookupErrorKind::RateLimited);
    assert_eq!(error.status(), 429);
    assert!(error.retryable());
    assert!(service.cache().is_empty().await);

    // The next lookup goes back upstream instead of serving a cached error.
    service.lookup("GOOG").await.expect("second attempt succeeds");
    assert_eq!(source.quote_calls(), 2);
}

// =============================================================================
// Search boundary path
// =============================================================================

#[tokio::test]
async fn blank_search_returns_empty_without_calling_the_adapter() {
    let source = Arc::new(CountingSource::new());
    let service = service_with(Arc::clone(&source));

    let matches = service.search("   ", 10).await.expect("blank query is not an error");
    assert!(matches.is_empty());
    assert_eq!(source.search_calls(), 0);
}

#[tokio::test]
async fn search_forwards_the_trimmed_query() {
    let source = Arc::new(CountingSource::new());
    let service = service_with(Arc::clone(&source));

    let matches = service.search(" apple ", 10).await.expect("search succeeds");
    assert_eq!(matches.len(), 1);
    assert_eq!(source.search_queries(), vec![String::from("apple")]);
}
