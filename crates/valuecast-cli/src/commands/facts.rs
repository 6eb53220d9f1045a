use std::collections::BTreeMap;

use serde::Serialize;
use valuecast_core::{summarize_driver_families, CanonicalRow, DriverTable, SecFactsClient, Symbol};

use crate::cli::FactsArgs;
use crate::error::CliError;

use super::input;
use super::CommandResult;

#[derive(Debug, Serialize)]
struct Coverage {
    years: Vec<i32>,
    missing_statements: Vec<&'static str>,
    driver_families: BTreeMap<&'static str, usize>,
}

#[derive(Debug, Serialize)]
struct FactsResponseData {
    company: BTreeMap<String, String>,
    coverage: Coverage,
    rows: Vec<CanonicalRow>,
}

pub async fn run(args: &FactsArgs, client: &SecFactsClient) -> Result<CommandResult, CliError> {
    if args.years == 0 {
        return Err(CliError::Command(String::from(
            "--years must be greater than zero",
        )));
    }

    let ticker = Symbol::parse(&args.ticker)?;
    let historicals = input::from_sec(&ticker, args.years, client).await?;

    let mut years: Vec<i32> = historicals.rows.iter().map(|row| row.year).collect();
    years.sort_unstable();
    years.dedup();
    let driver_families = summarize_driver_families(&DriverTable::default(), &historicals.rows)
        .into_iter()
        .map(|(family, count)| (family.as_str(), count))
        .collect();

    let warnings = historicals.warnings();
    let data = serde_json::to_value(FactsResponseData {
        coverage: Coverage {
            years,
            missing_statements: historicals.missing.iter().map(|statement| statement.code()).collect(),
            driver_families,
        },
        company: historicals.summary,
        rows: historicals.rows,
    })?;
    Ok(CommandResult::ok(data)
        .with_warnings(warnings)
        .with_cache_hit(historicals.cache_hit))
}
