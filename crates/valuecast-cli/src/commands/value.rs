use serde::Serialize;
use tracing::{info, warn};
use valuecast_core::{
    comps::DEFAULT_MULTIPLE_TYPE, comps_valuation, dcf_sensitivity, dcf_valuation, build_ufcf,
    terminal_value_exit_multiple, terminal_value_perpetuity, ufcf::ufcf_series, CompInput,
    CompsResult, DcfInputs, DcfResult, EnhancerConfig, NoopEnhancer, OpenAiEnhancer,
    RecommendationEnhancer, Recommendations, SecFactsClient, SensitivityGrid, TerminalMethod,
    UfcfRow, UtcDateTime,
};
use valuecast_report::{
    assumptions_table, bundle::{VALUATION_COMPS, VALUATION_DCF, VALUATION_UFCF}, comps_table,
    dcf_table, diagnostics_table, sensitivity_table, source_trace_table, statement_tables,
    ufcf_table, CsvWorkbookSink, ReportBundle, ReportManifest, ReportSink, XlsxWorkbookSink,
};

use crate::cli::{ReportFormat, ValueArgs};
use crate::error::CliError;

use super::forecast::{self, ForecastRun};
use super::CommandResult;

/// Terminal EBITDA proxy: final-year UFCF scaled by this factor.
const TERMINAL_EBITDA_FACTOR: f64 = 1.3;
const DEFAULT_PEER: (&str, f64) = ("PEER1", 10.0);
const WACC_SPREAD: f64 = 0.02;
const MULTIPLE_SPREAD: f64 = 2.0;
const GROWTH_SPREAD: f64 = 0.01;

#[derive(Debug, Serialize)]
struct ValueResponseData<'a> {
    company: &'a std::collections::BTreeMap<String, String>,
    forecast_years: &'a [i32],
    ufcf: &'a [UfcfRow],
    ebitda_terminal: f64,
    terminal_value: f64,
    dcf: DcfResult,
    comps: &'a CompsResult,
    sensitivity: &'a SensitivityGrid,
    recommendations: &'a Recommendations,
    enhancer: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a ReportManifest>,
}

pub async fn run(args: &ValueArgs, client: &SecFactsClient) -> Result<CommandResult, CliError> {
    let ForecastRun {
        historicals,
        forecast_years,
        recommendations,
        result,
        mut warnings,
    } = forecast::prepare(&args.forecast, client).await?;

    let (enhancer, enhancer_warning) = select_enhancer(args.enhance);
    warnings.extend(enhancer_warning);
    let recommendations = enhancer.enhance(recommendations).await;

    let ufcf = build_ufcf(&result.rows, args.tax_rate)?;
    let series = ufcf_series(&ufcf);
    let last_ufcf = series.last().copied().unwrap_or(0.0);
    let ebitda_terminal = last_ufcf * TERMINAL_EBITDA_FACTOR;

    let method = TerminalMethod::from(args.terminal_method);
    let (terminal_base, terminal_parameter, spread) = match method {
        TerminalMethod::ExitMultiple => (ebitda_terminal, args.exit_multiple, MULTIPLE_SPREAD),
        TerminalMethod::Perpetuity => (last_ufcf, args.terminal_growth, GROWTH_SPREAD),
    };
    let terminal_value = match method {
        TerminalMethod::ExitMultiple => terminal_value_exit_multiple(ebitda_terminal, args.exit_multiple),
        TerminalMethod::Perpetuity => terminal_value_perpetuity(last_ufcf, args.wacc, args.terminal_growth),
    };
    if !terminal_value.is_finite() {
        warnings.push(String::from(
            "terminal value is undefined (perpetuity growth must stay below WACC)",
        ));
    }

    let inputs = DcfInputs {
        ufcf: series,
        wacc: args.wacc,
        terminal_method: method,
        terminal_value,
        debt: args.debt,
        cash: args.cash,
        shares: args.shares,
    };
    let dcf = dcf_valuation(&inputs);
    if !dcf.share_price.is_finite() {
        warnings.push(String::from("share price is not finite"));
    }
    info!(enterprise_value = dcf.enterprise_value, share_price = dcf.share_price, "dcf complete");

    let comps = comps_valuation(ebitda_terminal, peers(args));

    // The grid varies the terminal parameter, so its base is the
    // pre-multiple figure rather than the terminal value itself.
    let sensitivity_base = DcfInputs {
        terminal_value: terminal_base,
        ..inputs.clone()
    };
    let sensitivity = dcf_sensitivity(
        &sensitivity_base,
        (args.wacc - WACC_SPREAD, args.wacc + WACC_SPREAD),
        (terminal_parameter - spread, terminal_parameter + spread),
        args.grid_size,
        method,
        args.metric.into(),
    )?;

    let report = match &args.report {
        Some(path) => {
            let bundle = ReportBundle {
                generated_at: UtcDateTime::now(),
                company_summary: historicals.summary.clone(),
                statements: statement_tables(&historicals.rows, &result.rows),
                assumptions: assumptions_table(&recommendations)?,
                valuation_tables: vec![
                    (VALUATION_DCF.to_owned(), dcf_table(&dcf)?),
                    (VALUATION_COMPS.to_owned(), comps_table(&comps)),
                    (VALUATION_UFCF.to_owned(), ufcf_table(&ufcf)?),
                ],
                sensitivity: sensitivity_table(&sensitivity),
                diagnostics: diagnostics_table(
                    &result.diagnostics.plugs,
                    &historicals.missing,
                    &warnings,
                    &narrative(&recommendations),
                ),
                source_trace: source_trace_table(&historicals.source_trace),
            };
            let sink: Box<dyn ReportSink> = match args.report_format {
                ReportFormat::Xlsx => Box::new(XlsxWorkbookSink::new(path)),
                ReportFormat::Csv => Box::new(CsvWorkbookSink::new(path)),
            };
            Some(sink.write(&bundle)?)
        }
        None => None,
    };

    let data = serde_json::to_value(ValueResponseData {
        company: &historicals.summary,
        forecast_years: &forecast_years,
        ufcf: &ufcf,
        ebitda_terminal,
        terminal_value,
        dcf,
        comps: &comps,
        sensitivity: &sensitivity,
        recommendations: &recommendations,
        enhancer: enhancer.name(),
        report: report.as_ref(),
    })?;
    Ok(CommandResult::ok(data)
        .with_warnings(warnings)
        .with_cache_hit(historicals.cache_hit))
}

/// A missing API key downgrades to the no-op enhancer with a warning.
fn select_enhancer(requested: bool) -> (Box<dyn RecommendationEnhancer>, Option<String>) {
    if !requested {
        return (Box::new(NoopEnhancer), None);
    }
    let config = EnhancerConfig::from_env();
    if config.has_credentials() {
        (Box::new(OpenAiEnhancer::with_reqwest(config)), None)
    } else {
        warn!("enhancement requested without OPENAI_API_KEY");
        (
            Box::new(NoopEnhancer),
            Some(String::from("--enhance ignored: OPENAI_API_KEY is not set")),
        )
    }
}

fn peers(args: &ValueArgs) -> Vec<CompInput> {
    if args.peers.is_empty() {
        let (name, multiple) = DEFAULT_PEER;
        return vec![CompInput::new(name, DEFAULT_MULTIPLE_TYPE, multiple)];
    }
    args.peers
        .iter()
        .map(|(name, multiple)| CompInput::new(name.clone(), DEFAULT_MULTIPLE_TYPE, *multiple))
        .collect()
}

/// Method choice, drivers and risks as plain sentences for the report.
fn narrative(recommendations: &Recommendations) -> Vec<String> {
    let method = &recommendations.valuation_method_recommendation;
    let mut lines = vec![format!(
        "Recommended method: {} ({})",
        method.method,
        method.reasons.join("; ")
    )];
    lines.extend(
        recommendations
            .key_value_drivers
            .iter()
            .map(|driver| format!("Key driver: {driver}")),
    );
    lines.extend(recommendations.risks.iter().map(|risk| format!("Risk: {risk}")));
    lines.push(format!(
        "Plausibility score: {}/100",
        recommendations.plausibility_score
    ));
    lines.extend(recommendations.plausibility_reasons.iter().cloned());
    lines
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use valuecast_core::{build_recommendations, AdvisoryProfile, HistoryMetrics};

    use super::*;
    use crate::cli::{Cli, Command};

    fn value_args(extra: &[&str]) -> ValueArgs {
        let argv = ["valuecast", "value", "--sample"].iter().chain(extra);
        match Cli::try_parse_from(argv).expect("parses").command {
            Command::Value(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn default_peer_is_used_without_flags() {
        let peers = peers(&value_args(&[]));
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].peer, "PEER1");
        assert_eq!(peers[0].multiple, 10.0);
    }

    #[test]
    fn explicit_peers_replace_the_default() {
        let peers = peers(&value_args(&["--peer", "AAA=8", "--peer", "BBB=12.5"]));
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[1].multiple, 12.5);
        assert_eq!(peers[1].multiple_type, DEFAULT_MULTIPLE_TYPE);
    }

    #[test]
    fn narrative_lists_method_then_score() {
        let recommendations = build_recommendations(
            &AdvisoryProfile {
                stage: String::from("Mature"),
                ..AdvisoryProfile::default()
            },
            &HistoryMetrics::default(),
        );
        let lines = narrative(&recommendations);

        assert!(lines[0].starts_with("Recommended method:"));
        assert!(lines.iter().any(|line| line.starts_with("Plausibility score:")));
    }

    #[test]
    fn enhancer_defaults_to_noop() {
        let (enhancer, warning) = select_enhancer(false);
        assert_eq!(enhancer.name(), "noop");
        assert!(warning.is_none());
    }
}
