//! Upstream provider contract consumed by the lookup service.

use std::future::Future;
use std::pin::Pin;

use crate::{LookupError, Quote, Symbol, SymbolMatch};

/// Upstream quote provider seam.
///
/// The lookup service treats every failure returned here as terminal for
/// that attempt; retry and backoff, if any, live behind this trait.
///
/// Implementations must be `Send + Sync`; one instance is shared across all
/// concurrent lookups.
pub trait QuoteSource: Send + Sync {
    /// Stable provider identifier used in logs and response metadata.
    fn id(&self) -> &'static str;

    /// Fetch the latest quote for one symbol.
    fn fetch_quote<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Quote, LookupError>> + Send + 'a>>;

    /// Free-text instrument search. Callers guarantee a non-blank query.
    fn search<'a>(
        &'a self,
        query: &'a str,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SymbolMatch>, LookupError>> + Send + 'a>>;
}
