use serde::{Deserialize, Serialize};

use crate::{Symbol, UtcDateTime, ValidationError};

/// Normalized quote snapshot as returned by the provider adapter.
///
/// The lookup layer stores and forwards these without interpreting the
/// price fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub price: f64,
    pub change: Option<f64>,
    pub percent_change: Option<f64>,
    pub open: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub previous_close: Option<f64>,
    pub currency: String,
    pub as_of: UtcDateTime,
}

impl Quote {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        symbol: Symbol,
        price: f64,
        change: Option<f64>,
        percent_change: Option<f64>,
        open: Option<f64>,
        day_high: Option<f64>,
        day_low: Option<f64>,
        previous_close: Option<f64>,
        currency: impl AsRef<str>,
        as_of: UtcDateTime,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("price", price)?;
        validate_optional_finite("change", change)?;
        validate_optional_finite("percent_change", percent_change)?;
        validate_optional_non_negative("open", open)?;
        validate_optional_non_negative("day_high", day_high)?;
        validate_optional_non_negative("day_low", day_low)?;
        validate_optional_non_negative("previous_close", previous_close)?;

        if let (Some(high), Some(low)) = (day_high, day_low) {
            if high < low {
                return Err(ValidationError::InvalidDayRange);
            }
        }

        Ok(Self {
            symbol,
            price,
            change,
            percent_change,
            open,
            day_high,
            day_low,
            previous_close,
            currency: validate_currency_code(currency.as_ref())?,
            as_of,
        })
    }
}

/// One entry of a symbol-suggestion result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub description: String,
    pub kind: String,
}

/// Validate and normalize currency to an uppercase 3-letter code.
pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn validate_optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        validate_non_negative(field, value)?;
    }
    Ok(())
}

fn validate_optional_finite(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field });
        }
    }
    Ok(())
}
