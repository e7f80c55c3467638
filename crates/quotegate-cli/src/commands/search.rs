use serde::Serialize;
use serde_json::Value;

use quotegate_core::{QuoteService, SymbolMatch};

use crate::cli::SearchArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct SearchResponseData {
    query: String,
    matches: Vec<SymbolMatch>,
}

pub async fn run(args: &SearchArgs, service: &QuoteService) -> Result<Value, CliError> {
    let matches = service.search(&args.query, args.limit).await?;

    Ok(serde_json::to_value(SearchResponseData {
        query: args.query.clone(),
        matches,
    })?)
}
