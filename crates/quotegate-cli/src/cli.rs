//! CLI argument definitions for quotegate.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Resolve quote(s) through the cached lookup path |
//! | `search` | Free-text symbol suggestions |
//!
//! # Examples
//!
//! ```bash
//! quotegate quote AAPL
//! quotegate quote aapl msft --pretty
//! quotegate search apple --limit 5
//! ```

use clap::{Args, Parser, Subcommand};

/// Cached, deduplicated quote lookup CLI.
///
/// Fronts the Finnhub quote API with an in-process cache and single-flight
/// request deduplication. Requires QUOTEGATE_FINNHUB_API_KEY (or
/// FINNHUB_API_KEY) in the environment.
#[derive(Debug, Parser)]
#[command(name = "quotegate", author, version, about)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Override the cache freshness horizon in seconds.
    #[arg(long, global = true)]
    pub freshness_secs: Option<u64>,

    /// Override the upstream fetch timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch latest quote(s) for one or more symbols.
    ///
    /// Symbols are trimmed and uppercased before lookup; repeated symbols
    /// within one invocation hit the in-process cache.
    Quote(QuoteArgs),

    /// Search for instruments by symbol or name.
    Search(SearchArgs),
}

/// Arguments for the `quote` command.
#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// One or more market symbols (e.g., AAPL, MSFT, BRK.B).
    #[arg(required = true, num_args = 1..)]
    pub symbols: Vec<String>,
}

/// Arguments for the `search` command.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Free-form search query (symbol or company name).
    pub query: String,

    /// Maximum number of results to return.
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}
