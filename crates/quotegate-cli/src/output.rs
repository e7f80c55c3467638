use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use quotegate_core::{LookupError, UtcDateTime};

use crate::error::CliError;

/// Metadata attached to every successful response.
#[derive(Debug, Serialize)]
pub struct EnvelopeMeta {
    pub request_id: String,
    pub generated_at: UtcDateTime,
    pub provider: &'static str,
    pub latency_ms: u64,
}

/// Response envelope for machine-readable output.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub meta: EnvelopeMeta,
    pub data: Value,
}

impl Envelope {
    pub fn new(data: Value, provider: &'static str, latency_ms: u64) -> Self {
        Self {
            meta: EnvelopeMeta {
                request_id: Uuid::new_v4().to_string(),
                generated_at: UtcDateTime::now(),
                provider,
                latency_ms,
            },
            data,
        }
    }
}

pub fn render(envelope: &Envelope, pretty: bool) -> Result<(), CliError> {
    let rendered = if pretty {
        serde_json::to_string_pretty(envelope)?
    } else {
        serde_json::to_string(envelope)?
    };
    println!("{rendered}");
    Ok(())
}

/// Render a lookup failure as a structured error object.
///
/// Internal cache and in-flight state never appear here; only the typed
/// taxonomy does.
pub fn render_lookup_error(error: &LookupError) {
    let body = serde_json::json!({
        "error": {
            "code": error.code(),
            "message": error.message(),
            "retryable": error.retryable(),
            "status": error.status(),
        }
    });
    println!("{body}");
}
