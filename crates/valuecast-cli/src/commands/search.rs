use serde::Serialize;
use valuecast_core::{CompanyProfile, SecFactsClient};

use crate::cli::SearchArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct SearchResponseData {
    query: String,
    results: Vec<CompanyProfile>,
}

pub async fn run(args: &SearchArgs, client: &SecFactsClient) -> Result<CommandResult, CliError> {
    if args.limit == 0 {
        return Err(CliError::Command(String::from(
            "--limit must be greater than zero",
        )));
    }

    let query = args.query.trim();
    if query.is_empty() {
        return Err(CliError::Command(String::from("query must not be empty")));
    }

    let fetched = client.search(query, args.limit).await?;
    let mut warnings = Vec::new();
    if fetched.value.is_empty() {
        warnings.push(format!("no tickers match '{query}'"));
    }

    let data = serde_json::to_value(SearchResponseData {
        query: query.to_owned(),
        results: fetched.value,
    })?;
    Ok(CommandResult::ok(data)
        .with_warnings(warnings)
        .with_cache_hit(fetched.cache_hit))
}
