use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Assumption key holding the per-year revenue growth path.
pub const REVENUE_GROWTH: &str = "revenue_growth";

/// Financial statement a line item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Statement {
    #[serde(rename = "IS")]
    Income,
    #[serde(rename = "BS")]
    Balance,
    #[serde(rename = "CF")]
    CashFlow,
}

impl Statement {
    pub const ALL: [Statement; 3] = [Self::Income, Self::Balance, Self::CashFlow];

    pub const fn code(self) -> &'static str {
        match self {
            Self::Income => "IS",
            Self::Balance => "BS",
            Self::CashFlow => "CF",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Income => "Income Statement",
            Self::Balance => "Balance Sheet",
            Self::CashFlow => "Cash Flow",
        }
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Statement {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "IS" => Ok(Self::Income),
            "BS" => Ok(Self::Balance),
            "CF" => Ok(Self::CashFlow),
            _ => Err(ValidationError::InvalidStatement {
                value: value.to_owned(),
            }),
        }
    }
}

/// Extrapolation bucket a line item is projected with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DriverFamily {
    RevenueDriven,
    MarginDriven,
    WorkingCapital,
    Fixed,
    Financing,
    CashFlow,
    Total,
    Other,
}

impl DriverFamily {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RevenueDriven => "revenue-driven",
            Self::MarginDriven => "margin-driven",
            Self::WorkingCapital => "working-capital",
            Self::Fixed => "fixed",
            Self::Financing => "financing",
            Self::CashFlow => "cash-flow",
            Self::Total => "total",
            Self::Other => "other",
        }
    }
}

impl Display for DriverFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation in canonical long format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    pub statement: Statement,
    pub line_item: String,
    pub year: i32,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_taxonomy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forecast_method: Option<String>,
}

impl CanonicalRow {
    pub fn new(statement: Statement, line_item: impl Into<String>, year: i32, value: f64) -> Self {
        Self {
            statement,
            line_item: line_item.into(),
            year,
            value,
            source_tag: None,
            source_taxonomy: None,
            forecast_method: None,
        }
    }

    pub fn with_source(mut self, tag: impl Into<String>, taxonomy: impl Into<String>) -> Self {
        self.source_tag = Some(tag.into());
        self.source_taxonomy = Some(taxonomy.into());
        self
    }

    pub fn with_forecast_method(mut self, method: impl Into<String>) -> Self {
        self.forecast_method = Some(method.into());
        self
    }
}

/// Per-forecast-year assumption path, consumed positionally by year index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumption {
    pub name: String,
    pub path: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl Assumption {
    pub fn new(name: impl Into<String>, path: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            path,
            rationale: None,
        }
    }

    /// Same value for each of `years` forecast years.
    pub fn flat(name: impl Into<String>, value: f64, years: usize) -> Self {
        Self::new(name, vec![value; years])
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }
}

/// Named assumptions for one forecast run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssumptionSet(BTreeMap<String, Assumption>);

impl AssumptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, assumption: Assumption) -> Self {
        self.insert(assumption);
        self
    }

    pub fn insert(&mut self, assumption: Assumption) {
        self.0.insert(assumption.name.clone(), assumption);
    }

    pub fn get(&self, name: &str) -> Option<&Assumption> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assumption> {
        self.0.values()
    }
}

/// Forced balance-sheet adjustment recorded by the reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plug {
    pub year: i32,
    pub amount: f64,
    pub line_item: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastDiagnostics {
    pub plugs: Vec<Plug>,
}

/// Output of one forecast invocation. Rows cover forecast years only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub rows: Vec<CanonicalRow>,
    pub assumptions_used: BTreeMap<String, Vec<f64>>,
    pub diagnostics: ForecastDiagnostics,
}

impl ForecastResult {
    /// Rows whose value is NaN, i.e. ratios that divided by zero upstream.
    pub fn non_finite_rows(&self) -> impl Iterator<Item = &CanonicalRow> {
        self.rows.iter().filter(|row| !row.value.is_finite())
    }
}

/// Flattened externally tagged fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFact {
    pub taxonomy: String,
    pub tag: String,
    pub unit: String,
    pub value: Option<f64>,
    pub fy: Option<i32>,
    pub fp: Option<String>,
    pub form: Option<String>,
    pub filed: Option<String>,
    pub end: Option<String>,
    pub start: Option<String>,
    pub accn: Option<String>,
    pub frame: Option<String>,
}

impl RawFact {
    /// Minimal fact with only the fields the normalizer reads.
    pub fn new(
        taxonomy: impl Into<String>,
        tag: impl Into<String>,
        unit: impl Into<String>,
        value: Option<f64>,
        fy: Option<i32>,
    ) -> Self {
        Self {
            taxonomy: taxonomy.into(),
            tag: tag.into(),
            unit: unit.into(),
            value,
            fy,
            fp: None,
            form: None,
            filed: None,
            end: None,
            start: None,
            accn: None,
            frame: None,
        }
    }

    pub fn with_period(mut self, fp: impl Into<String>) -> Self {
        self.fp = Some(fp.into());
        self
    }
}

/// Registrant identity resolved from a ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub cik: String,
    pub ticker: String,
    pub title: String,
}
