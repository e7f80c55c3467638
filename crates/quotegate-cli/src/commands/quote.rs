use serde::Serialize;
use serde_json::Value;

use quotegate_core::{Quote, QuoteService};

use crate::cli::QuoteArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct QuoteResponseData {
    quotes: Vec<Quote>,
}

pub async fn run(args: &QuoteArgs, service: &QuoteService) -> Result<Value, CliError> {
    let mut quotes = Vec::with_capacity(args.symbols.len());
    for raw in &args.symbols {
        quotes.push(service.lookup(raw).await?);
    }

    Ok(serde_json::to_value(QuoteResponseData { quotes })?)
}
