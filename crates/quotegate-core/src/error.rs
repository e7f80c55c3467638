use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Validation errors raised by domain type constructors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("unix timestamp {value} is out of range")]
    TimestampOutOfRange { value: i64 },

    #[error("currency must be a 3-letter ISO code: '{value}'")]
    InvalidCurrency { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("day high must be >= day low")]
    InvalidDayRange,
}

/// Classification of lookup failures, one variant per response category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupErrorKind {
    /// The caller supplied an empty, malformed, or unknown symbol.
    InvalidSymbol,
    /// The provider quota is exhausted, locally or upstream.
    RateLimited,
    /// The provider rejected our credentials.
    UpstreamAuth,
    /// Any other upstream failure (transport, 5xx, malformed payload).
    Upstream,
}

/// Structured lookup error carried from the provider boundary to the caller.
///
/// Failures are never cached; a leader's error is cloned verbatim to every
/// follower that joined its flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupError {
    kind: LookupErrorKind,
    message: String,
    retryable: bool,
}

impl LookupError {
    pub fn invalid_symbol(message: impl Into<String>) -> Self {
        Self {
            kind: LookupErrorKind::InvalidSymbol,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: LookupErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn upstream_auth(message: impl Into<String>) -> Self {
        Self {
            kind: LookupErrorKind::UpstreamAuth,
            message: message.into(),
            retryable: false,
        }
    }

    /// Transient upstream failure worth retrying after a pause.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: LookupErrorKind::Upstream,
            message: message.into(),
            retryable: true,
        }
    }

    /// Terminal upstream failure (bad payload, invariant violation).
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: LookupErrorKind::Upstream,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> LookupErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    /// HTTP status the response layer maps this failure to.
    pub const fn status(&self) -> u16 {
        match self.kind {
            LookupErrorKind::InvalidSymbol => 400,
            LookupErrorKind::RateLimited => 429,
            LookupErrorKind::UpstreamAuth => 401,
            LookupErrorKind::Upstream => 500,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            LookupErrorKind::InvalidSymbol => "lookup.invalid_symbol",
            LookupErrorKind::RateLimited => "lookup.rate_limited",
            LookupErrorKind::UpstreamAuth => "lookup.upstream_auth",
            LookupErrorKind::Upstream => "lookup.upstream",
        }
    }
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for LookupError {}

impl From<ValidationError> for LookupError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::EmptySymbol
            | ValidationError::SymbolTooLong { .. }
            | ValidationError::SymbolInvalidChar { .. } => Self::invalid_symbol(error.to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}
