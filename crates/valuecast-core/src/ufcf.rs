//! Unlevered free cash flow from projected income and cash-flow rows.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{CanonicalRow, Statement};
use crate::stats::nan_mean;
use crate::ValidationError;

pub const OPERATING_INCOME: &str = "Operating income";
pub const DEPRECIATION_AMORTIZATION: &str = "D&A";
pub const CAPEX: &str = "Capex";

const FALLBACK_EBIT_MARGIN: f64 = 0.15;
const FALLBACK_DA_RATIO: f64 = 0.05;
const FALLBACK_CAPEX_RATIO: f64 = 0.04;

/// One forecast year of the free-cash-flow bridge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UfcfRow {
    pub year: i32,
    #[serde(rename = "NOPAT")]
    pub nopat: f64,
    #[serde(rename = "D&A")]
    pub depreciation_amortization: f64,
    #[serde(rename = "Capex")]
    pub capex: f64,
    #[serde(rename = "Delta NWC")]
    pub delta_nwc: f64,
    #[serde(rename = "UFCF")]
    pub ufcf: f64,
}

type Pivot = BTreeMap<String, BTreeMap<i32, f64>>;

fn pivot(rows: &[CanonicalRow], statement: Statement) -> Pivot {
    let mut samples: BTreeMap<String, BTreeMap<i32, Vec<f64>>> = BTreeMap::new();
    for row in rows.iter().filter(|row| row.statement == statement) {
        samples
            .entry(row.line_item.clone())
            .or_default()
            .entry(row.year)
            .or_default()
            .push(row.value);
    }
    samples
        .into_iter()
        .map(|(line_item, years)| {
            let values = years
                .into_iter()
                .map(|(year, values)| (year, nan_mean(values)))
                .collect();
            (line_item, values)
        })
        .collect()
}

fn ensure_axis(line_item: &str, series: &BTreeMap<i32, f64>, axis: &BTreeSet<i32>) -> Result<(), ValidationError> {
    let found: BTreeSet<i32> = series.keys().copied().collect();
    if &found == axis {
        return Ok(());
    }
    Err(ValidationError::MisalignedYears {
        line_item: line_item.to_owned(),
        expected: axis.iter().copied().collect(),
        found: found.into_iter().collect(),
    })
}

/// Builds the per-year bridge `UFCF = NOPAT + D&A - Capex - ΔNWC`.
///
/// The year axis is the set of income-statement years. Operating income, D&A
/// and capex must cover that axis when reported; when absent they fall back to
/// 15%, 5% and 4% of revenue. Working
/// capital change is held at zero.
pub fn build_ufcf(rows: &[CanonicalRow], tax_rate: f64) -> Result<Vec<UfcfRow>, ValidationError> {
    if tax_rate.is_nan() {
        return Err(ValidationError::NonFiniteValue { field: "tax_rate" });
    }
    if !(0.0..=1.0).contains(&tax_rate) {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate",
            value: tax_rate,
            min: 0.0,
            max: 1.0,
        });
    }

    let income = pivot(rows, Statement::Income);
    let cash_flow = pivot(rows, Statement::CashFlow);
    let axis: BTreeSet<i32> = income.values().flat_map(|series| series.keys().copied()).collect();

    let ebit = income.get(OPERATING_INCOME);
    let da = cash_flow.get(DEPRECIATION_AMORTIZATION);
    let capex = cash_flow.get(CAPEX);
    for (line_item, series) in [(OPERATING_INCOME, ebit), (DEPRECIATION_AMORTIZATION, da), (CAPEX, capex)] {
        if let Some(series) = series {
            ensure_axis(line_item, series, &axis)?;
        }
    }

    let revenue = income.get(crate::forecast::REVENUE);
    let lookup = |series: Option<&BTreeMap<i32, f64>>, year: i32| series.and_then(|s| s.get(&year)).copied();

    Ok(axis
        .into_iter()
        .map(|year| {
            let revenue = lookup(revenue, year).unwrap_or(0.0);
            let ebit = lookup(ebit, year).unwrap_or(revenue * FALLBACK_EBIT_MARGIN);
            let nopat = ebit * (1.0 - tax_rate);
            let depreciation_amortization = lookup(da, year).unwrap_or(revenue * FALLBACK_DA_RATIO);
            let capex = lookup(capex, year).unwrap_or(revenue * FALLBACK_CAPEX_RATIO);
            let delta_nwc = 0.0;
            UfcfRow {
                year,
                nopat,
                depreciation_amortization,
                capex,
                delta_nwc,
                ufcf: nopat + depreciation_amortization - capex - delta_nwc,
            }
        })
        .collect())
}

/// The UFCF column of a bridge, in year order.
pub fn ufcf_series(rows: &[UfcfRow]) -> Vec<f64> {
    rows.iter().map(|row| row.ufcf).collect()
}
