use serde::Serialize;
use tracing::info;
use valuecast_core::{
    build_recommendations, forecast::CASH, Assumption, AssumptionSet, CanonicalRow,
    AdvisoryProfile, ForecastResult, HistoryMetrics, Plug, Recommendations, SecFactsClient,
    REVENUE_GROWTH,
};

use crate::cli::{ForecastArgs, ProfileArgs};
use crate::error::CliError;

use super::input::{self, Historicals};
use super::CommandResult;

#[derive(Debug, Serialize)]
struct ForecastResponseData<'a> {
    forecast_years: &'a [i32],
    assumptions_used: &'a std::collections::BTreeMap<String, Vec<f64>>,
    plugs: &'a [Plug],
    rows: &'a [CanonicalRow],
}

/// Historicals, the forecast built on them and its diagnostics.
pub struct ForecastRun {
    pub historicals: Historicals,
    pub forecast_years: Vec<i32>,
    pub recommendations: Recommendations,
    pub result: ForecastResult,
    pub warnings: Vec<String>,
}

pub async fn run(args: &ForecastArgs, client: &SecFactsClient) -> Result<CommandResult, CliError> {
    let run = prepare(args, client).await?;
    let data = serde_json::to_value(ForecastResponseData {
        forecast_years: &run.forecast_years,
        assumptions_used: &run.result.assumptions_used,
        plugs: &run.result.diagnostics.plugs,
        rows: &run.result.rows,
    })?;
    let cache_hit = run.historicals.cache_hit;
    Ok(CommandResult::ok(data)
        .with_warnings(run.warnings)
        .with_cache_hit(cache_hit))
}

pub fn advisory_profile(args: &ProfileArgs) -> AdvisoryProfile {
    AdvisoryProfile {
        sector: args.sector.clone(),
        business_model: args.business_model.clone(),
        size: args.size.clone(),
        stage: args.stage.clone(),
        notes: args.notes.clone(),
    }
}

/// Loads history and forecasts it. Growth comes from `--growth` when
/// given, otherwise from the baseline recommendations.
pub async fn prepare(args: &ForecastArgs, client: &SecFactsClient) -> Result<ForecastRun, CliError> {
    let historicals = input::load(&args.input, args.history_years, client).await?;
    let last_year = historicals
        .last_year()
        .ok_or_else(|| CliError::Command(String::from("historicals carry no fiscal year")))?;
    let forecast_years: Vec<i32> = (1..=i32::from(args.forecast_years))
        .map(|offset| last_year + offset)
        .collect();

    let recommendations = build_recommendations(
        &advisory_profile(&args.profile),
        &HistoryMetrics::from_rows(&historicals.rows),
    );
    let assumptions = match args.growth {
        Some(growth) => AssumptionSet::new().with(
            Assumption::flat(REVENUE_GROWTH, growth, forecast_years.len())
                .with_rationale("set on the command line"),
        ),
        None => recommendations.to_assumptions(forecast_years.len()),
    };

    let result = valuecast_core::forecast(&historicals.rows, &forecast_years, &assumptions)?;
    info!(
        rows = result.rows.len(),
        plugs = result.diagnostics.plugs.len(),
        "forecast complete"
    );

    let mut warnings = historicals.warnings();
    warnings.extend(forecast_warnings(&result));
    Ok(ForecastRun {
        historicals,
        forecast_years,
        recommendations,
        result,
        warnings,
    })
}

fn forecast_warnings(result: &ForecastResult) -> Vec<String> {
    let mut warnings: Vec<String> = result
        .diagnostics
        .plugs
        .iter()
        .map(|plug| format!("balance sheet plug of {:.2} to {} in {}", plug.amount, plug.line_item, plug.year))
        .collect();
    warnings.extend(
        result
            .rows
            .iter()
            .filter(|row| row.line_item == CASH && row.value < 0.0)
            .map(|row| format!("negative cash of {:.2} in {}", row.value, row.year)),
    );
    let non_finite = result.non_finite_rows().count();
    if non_finite > 0 {
        warnings.push(format!("{non_finite} forecast rows are not finite"));
    }
    warnings
}
