mod facts;
mod forecast;
mod input;
mod search;
mod value;

use std::time::Instant;

use serde_json::Value;
use valuecast_core::{CacheMode, FactsClientConfig, SecFactsClient};

use crate::cli::{Cli, Command};
use crate::envelope::{Envelope, SCHEMA_VERSION};
use crate::error::CliError;
use crate::metadata::Metadata;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub cache_hit: bool,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            cache_hit: false,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let started = Instant::now();
    let client = SecFactsClient::with_reqwest(facts_config(cli));

    let command_result = match &cli.command {
        Command::Search(args) => search::run(args, &client).await?,
        Command::Facts(args) => facts::run(args, &client).await?,
        Command::Forecast(args) => forecast::run(args, &client).await?,
        Command::Value(args) => value::run(args, &client).await?,
    };

    let CommandResult {
        data,
        warnings,
        cache_hit,
    } = command_result;

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut metadata = Metadata::new(latency_ms, cache_hit);
    for warning in warnings {
        metadata.push_warning(warning);
    }

    Ok(Envelope::new(metadata.into_envelope_meta(SCHEMA_VERSION), data))
}

/// Environment first, then explicit flags.
fn facts_config(cli: &Cli) -> FactsClientConfig {
    let mut config = FactsClientConfig::default().with_env();
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = dir.clone();
    }
    if cli.refresh {
        config.cache_mode = CacheMode::Refresh;
    }
    config.offline = cli.offline;
    config
}
