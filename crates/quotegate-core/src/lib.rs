//! # Quotegate Core
//!
//! Data-access layer fronting a third-party quote provider with an
//! in-process cache and single-flight request deduplication.
//!
//! Lookup flow: validate and normalize the symbol, serve from the cache
//! while an entry is fresh, otherwise collapse concurrent misses into one
//! upstream fetch whose outcome — success or failure — reaches every caller
//! that joined it. Provider failures normalize to a small typed taxonomy
//! ([`LookupError`]) carrying the HTTP status the response layer maps each
//! kind to.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Finnhub) |
//! | [`cache`] | Freshness-bounded quote cache |
//! | [`circuit_breaker`] | Fail-fast guard for upstream calls |
//! | [`domain`] | Domain models (Symbol, Quote, SymbolMatch) |
//! | [`error`] | Error taxonomy and status mapping |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`service`] | Lookup orchestration |
//! | [`single_flight`] | Per-symbol fetch deduplication |
//! | [`source`] | Upstream provider trait |
//! | [`throttle`] | Client-side provider quota gate |
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quotegate_core::{FinnhubSource, QuoteService, ServiceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = Arc::new(FinnhubSource::from_env()?);
//!     let service = QuoteService::new(source, ServiceConfig::default());
//!
//!     let quote = service.lookup("aapl").await?;
//!     println!("AAPL: ${:.2}", quote.price);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cache;
pub mod circuit_breaker;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod service;
pub mod single_flight;
pub mod source;
pub mod throttle;

pub use adapters::FinnhubSource;
pub use cache::QuoteCache;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use domain::{validate_currency_code, Quote, Symbol, SymbolMatch, UtcDateTime};
pub use error::{LookupError, LookupErrorKind, ValidationError};
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};
pub use service::{QuoteService, ServiceConfig};
pub use single_flight::SingleFlight;
pub use source::QuoteSource;
pub use throttle::RateGate;
