//! Loading historical statements from the three supported inputs.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};
use valuecast_core::{
    facts::{latest_fiscal_years, retain_annual, select_facts_for_years},
    flatten_company_facts, generate_synthetic_statements, load_historicals, missing_statements,
    CanonicalRow, SecFactsClient, Statement, Symbol, TagMap, UtcDateTime,
};

use crate::cli::InputArgs;
use crate::error::CliError;

/// Sample history spans this many years ending last calendar year.
const SAMPLE_YEARS: i32 = 3;

/// Historical rows plus where they came from.
#[derive(Debug, Clone)]
pub struct Historicals {
    pub rows: Vec<CanonicalRow>,
    /// Mapped rows before duplicate resolution, for tracing values to tags.
    pub source_trace: Vec<CanonicalRow>,
    pub summary: BTreeMap<String, String>,
    pub missing: BTreeSet<Statement>,
    pub cache_hit: bool,
}

impl Historicals {
    pub fn last_year(&self) -> Option<i32> {
        self.rows.iter().map(|row| row.year).max()
    }

    pub fn warnings(&self) -> Vec<String> {
        if self.missing.is_empty() {
            return Vec::new();
        }
        let codes: Vec<&str> = self.missing.iter().map(|statement| statement.code()).collect();
        vec![format!("missing statements: {}", codes.join(", "))]
    }
}

pub async fn load(
    input: &InputArgs,
    history_years: usize,
    client: &SecFactsClient,
) -> Result<Historicals, CliError> {
    let historicals = if let Some(ticker) = &input.ticker {
        from_sec(&Symbol::parse(ticker)?, history_years, client).await?
    } else if let Some(path) = &input.upload {
        let rows = load_historicals(path)?;
        summarize(rows.clone(), rows, [("ticker", "Uploaded"), ("name", "Custom"), ("source", "User CSV")], false)
    } else {
        let last = UtcDateTime::now().year() - 1;
        let years: Vec<i32> = (last - SAMPLE_YEARS + 1..=last).collect();
        let rows = generate_synthetic_statements(&years);
        summarize(rows, Vec::new(), [("ticker", "SAMPLE"), ("name", "Synthetic"), ("source", "Generated sample")], false)
    };

    if historicals.rows.is_empty() {
        return Err(CliError::Command(String::from("no historical rows loaded")));
    }
    for statement in &historicals.missing {
        warn!(statement = statement.code(), "statement has no historical rows");
    }
    Ok(historicals)
}

/// Annual facts for the latest `history_years`, mapped and deduplicated.
pub async fn from_sec(
    ticker: &Symbol,
    history_years: usize,
    client: &SecFactsClient,
) -> Result<Historicals, CliError> {
    let fetched = client.facts_by_ticker(ticker).await?;
    let annual = retain_annual(flatten_company_facts(&fetched.facts));
    let years = latest_fiscal_years(&annual, history_years);
    let selected = select_facts_for_years(&annual, &years);

    let tags = TagMap::default();
    let mapped = tags.normalize(&selected);
    let rows = tags.resolve_duplicates(&mapped);
    debug!(ticker = %ticker, facts = selected.len(), rows = rows.len(), "loaded SEC historicals");

    let profile = fetched.profile;
    let mut historicals = summarize(
        rows,
        mapped,
        [("ticker", profile.ticker.as_str()), ("name", profile.title.as_str()), ("source", "SEC Company Facts")],
        fetched.cache_hit,
    );
    historicals.summary.insert(String::from("cik"), profile.cik);
    Ok(historicals)
}

fn summarize<const N: usize>(
    rows: Vec<CanonicalRow>,
    source_trace: Vec<CanonicalRow>,
    summary: [(&str, &str); N],
    cache_hit: bool,
) -> Historicals {
    Historicals {
        missing: missing_statements(&rows),
        rows,
        source_trace,
        summary: summary
            .into_iter()
            .map(|(key, value)| (key.to_owned(), value.to_owned()))
            .collect(),
        cache_hit,
    }
}
