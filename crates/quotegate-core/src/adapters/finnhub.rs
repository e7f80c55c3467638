//! Finnhub REST adapter (`/quote`, `/search`).
//!
//! Free-tier plans allow 60 calls per minute; the adapter gates requests
//! locally before spending quota on a guaranteed 429.

use std::env;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient};
use crate::source::QuoteSource;
use crate::throttle::RateGate;
use crate::{LookupError, Quote, Symbol, SymbolMatch, UtcDateTime};

const DEFAULT_BASE_URL: &str = "https://finnhub.io/api/v1";
const REQUEST_TIMEOUT_MS: u64 = 5_000;
const FREE_TIER_CALLS_PER_MINUTE: u32 = 60;

/// Finnhub-backed quote source.
pub struct FinnhubSource {
    http: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
    breaker: Arc<CircuitBreaker>,
    gate: RateGate,
}

impl FinnhubSource {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), api_key)
    }

    pub fn with_http_client(http: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: String::from(DEFAULT_BASE_URL),
            breaker: Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default())),
            gate: RateGate::per_minute(FREE_TIER_CALLS_PER_MINUTE),
        }
    }

    /// Build from `QUOTEGATE_FINNHUB_API_KEY`, falling back to
    /// `FINNHUB_API_KEY`.
    pub fn from_env() -> Result<Self, LookupError> {
        let api_key = env::var("QUOTEGATE_FINNHUB_API_KEY")
            .or_else(|_| env::var("FINNHUB_API_KEY"))
            .map_err(|_| {
                LookupError::upstream_auth(
                    "finnhub api key is not configured; set QUOTEGATE_FINNHUB_API_KEY",
                )
            })?;
        Ok(Self::new(api_key))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn with_rate_gate(mut self, gate: RateGate) -> Self {
        self.gate = gate;
        self
    }

    async fn execute(&self, url: String) -> Result<String, LookupError> {
        if let Err(wait) = self.gate.try_acquire() {
            return Err(LookupError::rate_limited(format!(
                "provider quota exhausted; retry in {}ms",
                wait.as_millis()
            )));
        }

        if !self.breaker.allow_request() {
            return Err(LookupError::unavailable(
                "finnhub circuit breaker is open; skipping upstream call",
            ));
        }

        debug!(url = %redact_token(&url), "calling finnhub");
        let request = HttpRequest::get(url).with_timeout_ms(REQUEST_TIMEOUT_MS);
        let response = self.http.execute(request).await.map_err(|error| {
            self.breaker.record_failure();
            if error.retryable() {
                LookupError::unavailable(format!("finnhub transport error: {}", error.message()))
            } else {
                LookupError::internal(format!("finnhub transport error: {}", error.message()))
            }
        })?;

        if response.is_success() {
            self.breaker.record_success();
            return Ok(response.body);
        }

        match response.status {
            401 | 403 => {
                self.breaker.record_failure();
                Err(LookupError::upstream_auth(format!(
                    "finnhub rejected credentials (status {})",
                    response.status
                )))
            }
            429 => Err(LookupError::rate_limited(
                "finnhub throttled the request (status 429)",
            )),
            status => {
                self.breaker.record_failure();
                warn!(status, "finnhub returned an error status");
                Err(LookupError::unavailable(format!(
                    "finnhub returned status {status}"
                )))
            }
        }
    }

    fn parse_quote(&self, symbol: &Symbol, body: &str) -> Result<Quote, LookupError> {
        let payload: FinnhubQuote = serde_json::from_str(body).map_err(|e| {
            LookupError::internal(format!("failed to parse finnhub quote response: {e}"))
        })?;

        // Finnhub answers unknown tickers with an all-zero payload rather
        // than an error status.
        let price = match payload.current_price {
            Some(price) if price > 0.0 => price,
            _ => {
                return Err(LookupError::invalid_symbol(format!(
                    "no quote data for symbol '{symbol}'"
                )))
            }
        };

        let as_of = match payload.timestamp {
            Some(seconds) if seconds > 0 => {
                UtcDateTime::from_unix_timestamp(seconds).unwrap_or_else(|_| UtcDateTime::now())
            }
            _ => UtcDateTime::now(),
        };

        Quote::new(
            symbol.clone(),
            price,
            payload.change,
            payload.percent_change,
            payload.open,
            payload.day_high,
            payload.day_low,
            payload.previous_close,
            "USD",
            as_of,
        )
        .map_err(|e| LookupError::internal(format!("finnhub quote failed validation: {e}")))
    }
}

impl QuoteSource for FinnhubSource {
    fn id(&self) -> &'static str {
        "finnhub"
    }

    fn fetch_quote<'a>(
        &'a self,
        symbol: &'a Symbol,
    ) -> Pin<Box<dyn Future<Output = Result<Quote, LookupError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!(
                "{}/quote?symbol={}&token={}",
                self.base_url,
                urlencoding::encode(symbol.as_str()),
                urlencoding::encode(&self.api_key)
            );
            let body = self.execute(url).await?;
            self.parse_quote(symbol, &body)
        })
    }

    fn search<'a>(
        &'a self,
        query: &'a str,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SymbolMatch>, LookupError>> + Send + 'a>> {
        Box::pin(async move {
            let url = format!(
                "{}/search?q={}&token={}",
                self.base_url,
                urlencoding::encode(query),
                urlencoding::encode(&self.api_key)
            );
            let body = self.execute(url).await?;

            let payload: FinnhubSearch = serde_json::from_str(&body).map_err(|e| {
                LookupError::internal(format!("failed to parse finnhub search response: {e}"))
            })?;

            Ok(payload
                .result
                .into_iter()
                .map(|item| SymbolMatch {
                    symbol: item.display_symbol,
                    description: item.description,
                    kind: item.security_type,
                })
                .take(limit)
                .collect())
        })
    }
}

/// Keep api tokens out of log output.
fn redact_token(url: &str) -> String {
    match url.split_once("token=") {
        Some((prefix, _)) => format!("{prefix}token=***"),
        None => url.to_owned(),
    }
}

#[derive(Debug, Clone, Deserialize)]
struct FinnhubQuote {
    #[serde(rename = "c")]
    current_price: Option<f64>,
    #[serde(rename = "d")]
    change: Option<f64>,
    #[serde(rename = "dp")]
    percent_change: Option<f64>,
    #[serde(rename = "o")]
    open: Option<f64>,
    #[serde(rename = "h")]
    day_high: Option<f64>,
    #[serde(rename = "l")]
    day_low: Option<f64>,
    #[serde(rename = "pc")]
    previous_close: Option<f64>,
    #[serde(rename = "t")]
    timestamp: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
struct FinnhubSearch {
    #[serde(default)]
    result: Vec<FinnhubSearchItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinnhubSearchItem {
    description: String,
    display_symbol: String,
    #[serde(rename = "type")]
    security_type: String,
}
