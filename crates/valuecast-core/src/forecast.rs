//! Per-family line-item projection and balance-sheet reconciliation.
//!
//! Each historical line item is projected independently by its
//! [`DriverFamily`]: ratio-to-revenue for revenue/margin/working-capital
//! items, the historical median for fixed items, and the latest value for
//! everything else. Revenue itself compounds the latest historical value by
//! the growth path. Afterwards [`reconcile_balance_sheet`] forces
//! `assets = liabilities + equity` per year with a single cash plug.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::classify::DriverTable;
use crate::domain::{
    AssumptionSet, CanonicalRow, DriverFamily, ForecastDiagnostics, ForecastResult, Plug,
    Statement, REVENUE_GROWTH,
};
use crate::parse::safe_divide;
use crate::stats::{nan_mean, nan_median};
use crate::ValidationError;

pub const REVENUE: &str = "Revenue";
pub const TOTAL_ASSETS: &str = "Total assets";
pub const TOTAL_LIABILITIES: &str = "Total liabilities";
pub const TOTAL_EQUITY: &str = "Total equity";
pub const CASH: &str = "Cash and equivalents";

/// `forecast_method` recorded on rows synthesized by the reconciler.
pub const PLUG_METHOD: &str = "plug";

/// Growth applied each year when no revenue growth path is supplied.
pub const DEFAULT_REVENUE_GROWTH: f64 = 0.05;

/// Gaps at or below this magnitude are treated as balanced.
pub const BALANCE_TOLERANCE: f64 = 1e-2;

/// Historical values for one line item, years ascending.
#[derive(Debug, Clone)]
struct LineSeries {
    statement: Statement,
    values: BTreeMap<i32, f64>,
}

impl LineSeries {
    fn latest(&self) -> Option<f64> {
        self.values.values().rev().copied().find(|value| !value.is_nan())
    }

    fn median(&self) -> f64 {
        nan_median(self.values.values().copied())
    }

    /// Median of `item / revenue` over years where revenue is present.
    fn ratio_to(&self, revenue: Option<&LineSeries>) -> f64 {
        let Some(revenue) = revenue else {
            return f64::NAN;
        };
        nan_median(revenue.values.iter().filter_map(|(year, base)| {
            if base.is_nan() {
                return None;
            }
            self.values.get(year).map(|value| safe_divide(*value, *base))
        }))
    }
}

/// Runs forecasts against a fixed classification table.
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    table: DriverTable,
}

impl ForecastEngine {
    pub fn new(table: DriverTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &DriverTable {
        &self.table
    }

    /// Projects every historical line item over `forecast_years`.
    ///
    /// Missing revenue history anchors growth at zero. Ratios that divide by
    /// zero yield NaN rows rather than errors.
    pub fn forecast(
        &self,
        historical: &[CanonicalRow],
        forecast_years: &[i32],
        assumptions: &AssumptionSet,
    ) -> Result<ForecastResult, ValidationError> {
        if forecast_years.is_empty() {
            return Err(ValidationError::EmptyForecastYears);
        }

        let pivot = pivot_history(historical);
        let revenue_hist = pivot.get(REVENUE);
        let anchor = revenue_hist.and_then(LineSeries::latest).unwrap_or(0.0);
        let growth_path = growth_path(assumptions, forecast_years.len());
        let revenue_fcst = build_revenue_path(anchor, &growth_path);
        debug!(
            line_items = pivot.len(),
            anchor,
            years = forecast_years.len(),
            "projecting line items"
        );

        let mut rows = Vec::with_capacity(pivot.len() * forecast_years.len());
        for (line_item, series) in &pivot {
            let family = self.table.classify(line_item);
            let projection = if line_item == REVENUE {
                Projection::PerYear(&revenue_fcst)
            } else {
                match family {
                    DriverFamily::RevenueDriven
                    | DriverFamily::MarginDriven
                    | DriverFamily::WorkingCapital => {
                        Projection::Scaled(series.ratio_to(revenue_hist), &revenue_fcst)
                    }
                    DriverFamily::Fixed => Projection::Flat(series.median()),
                    DriverFamily::Financing
                    | DriverFamily::CashFlow
                    | DriverFamily::Total
                    | DriverFamily::Other => Projection::Flat(series.latest().unwrap_or(0.0)),
                }
            };

            for (index, year) in forecast_years.iter().enumerate() {
                rows.push(
                    CanonicalRow::new(series.statement, line_item.clone(), *year, projection.at(index))
                        .with_forecast_method(family.as_str()),
                );
            }
        }

        let plugs = reconcile_balance_sheet(&mut rows);

        Ok(ForecastResult {
            rows,
            assumptions_used: BTreeMap::from([(REVENUE_GROWTH.to_owned(), growth_path)]),
            diagnostics: ForecastDiagnostics { plugs },
        })
    }
}

enum Projection<'a> {
    PerYear(&'a [f64]),
    Scaled(f64, &'a [f64]),
    Flat(f64),
}

impl Projection<'_> {
    fn at(&self, index: usize) -> f64 {
        match self {
            Self::PerYear(path) => path[index],
            Self::Scaled(ratio, revenue) => ratio * revenue[index],
            Self::Flat(value) => *value,
        }
    }
}

/// Forecasts with the built-in classification table.
pub fn forecast(
    historical: &[CanonicalRow],
    forecast_years: &[i32],
    assumptions: &AssumptionSet,
) -> Result<ForecastResult, ValidationError> {
    ForecastEngine::default().forecast(historical, forecast_years, assumptions)
}

/// Compounds `anchor` forward: `revenue[t] = revenue[t-1] * (1 + growth[t])`.
pub fn build_revenue_path(anchor: f64, growth_rates: &[f64]) -> Vec<f64> {
    growth_rates
        .iter()
        .scan(anchor, |current, growth| {
            *current *= 1.0 + growth;
            Some(*current)
        })
        .collect()
}

/// Growth path sized to the horizon: defaults to a flat 5%, a short path
/// repeats its last rate, a long one is truncated.
fn growth_path(assumptions: &AssumptionSet, years: usize) -> Vec<f64> {
    let supplied = assumptions
        .get(REVENUE_GROWTH)
        .map(|assumption| assumption.path.as_slice())
        .filter(|path| !path.is_empty());
    match supplied {
        None => vec![DEFAULT_REVENUE_GROWTH; years],
        Some(path) => {
            let last = path[path.len() - 1];
            (0..years)
                .map(|index| path.get(index).copied().unwrap_or(last))
                .collect()
        }
    }
}

fn pivot_history(rows: &[CanonicalRow]) -> BTreeMap<String, LineSeries> {
    let mut collected: BTreeMap<String, (Statement, BTreeMap<i32, Vec<f64>>)> = BTreeMap::new();
    for row in rows {
        collected
            .entry(row.line_item.clone())
            .or_insert_with(|| (row.statement, BTreeMap::new()))
            .1
            .entry(row.year)
            .or_default()
            .push(row.value);
    }

    collected
        .into_iter()
        .map(|(line_item, (statement, years))| {
            let values = years
                .into_iter()
                .map(|(year, samples)| (year, nan_mean(samples)))
                .collect();
            (line_item, LineSeries { statement, values })
        })
        .collect()
}

/// `Total assets - (Total liabilities + Total equity)` over balance-sheet
/// rows of `year`; absent totals count as zero.
pub fn balance_gap(rows: &[CanonicalRow], year: i32) -> f64 {
    let total = |line_item: &str| -> f64 {
        rows.iter()
            .filter(|row| {
                row.statement == Statement::Balance && row.year == year && row.line_item == line_item
            })
            .map(|row| row.value)
            .filter(|value| !value.is_nan())
            .sum()
    };
    total(TOTAL_ASSETS) - (total(TOTAL_LIABILITIES) + total(TOTAL_EQUITY))
}

/// Single-pass, per-year cash plug.
///
/// For each balance-sheet year whose gap exceeds [`BALANCE_TOLERANCE`], the
/// gap is added to that year's cash row, or a new cash row carrying the gap
/// is appended. Every adjustment is returned in year order.
///
/// The totals rows are never rewritten, so [`balance_gap`] measured after
/// the plug still equals the gap that was plugged.
pub fn reconcile_balance_sheet(rows: &mut Vec<CanonicalRow>) -> Vec<Plug> {
    let years: BTreeSet<i32> = rows
        .iter()
        .filter(|row| row.statement == Statement::Balance)
        .map(|row| row.year)
        .collect();

    let mut plugs = Vec::new();
    for year in years {
        let gap = balance_gap(rows, year);
        if gap.abs() <= BALANCE_TOLERANCE {
            continue;
        }

        match rows
            .iter_mut()
            .find(|row| row.year == year && row.line_item == CASH)
        {
            Some(cash) => {
                cash.value += gap;
                if cash.value < 0.0 {
                    warn!(year, cash = cash.value, "cash plug leaves negative cash balance");
                }
            }
            None => rows.push(
                CanonicalRow::new(Statement::Balance, CASH, year, gap)
                    .with_forecast_method(PLUG_METHOD),
            ),
        }
        warn!(year, amount = gap, "balance sheet plugged through cash");
        plugs.push(Plug {
            year,
            amount: gap,
            line_item: CASH.to_owned(),
        });
    }
    plugs
}
