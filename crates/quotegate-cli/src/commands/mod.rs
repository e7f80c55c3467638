mod quote;
mod search;

use std::sync::Arc;
use std::time::{Duration, Instant};

use quotegate_core::{FinnhubSource, QuoteService, ServiceConfig};

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::Envelope;

pub async fn run(cli: &Cli) -> Result<Envelope, CliError> {
    let mut config = ServiceConfig::from_env();
    if let Some(secs) = cli.freshness_secs {
        config.freshness_horizon = Duration::from_secs(secs);
    }
    if let Some(ms) = cli.timeout_ms {
        config.fetch_timeout = Duration::from_millis(ms);
    }

    let source = Arc::new(FinnhubSource::from_env()?);
    let service = QuoteService::new(source, config);

    let started = Instant::now();
    let data = match &cli.command {
        Command::Quote(args) => quote::run(args, &service).await?,
        Command::Search(args) => search::run(args, &service).await?,
    };
    let latency_ms = started.elapsed().as_millis() as u64;

    Ok(Envelope::new(data, service.source_id(), latency_ms))
}
