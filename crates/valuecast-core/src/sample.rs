//! Synthetic statements for demos and tests.

use crate::domain::{CanonicalRow, Statement};

const BASE_REVENUE: f64 = 1000.0;
const REVENUE_GROWTH: f64 = 1.05;

const RATIOS: &[(Statement, &str, f64)] = &[
    (Statement::Income, "Revenue", 1.0),
    (Statement::Income, "Cost of revenue", 0.4),
    (Statement::Income, "Operating income", 0.2),
    (Statement::Income, "Net income", 0.15),
    (Statement::Balance, "Total assets", 1.2),
    (Statement::Balance, "Total liabilities", 0.6),
    (Statement::Balance, "Total equity", 0.6),
    (Statement::CashFlow, "D&A", 0.05),
    (Statement::CashFlow, "Capex", 0.04),
];

/// Nine rows per year; revenue grows 5% a year from 1000 (first year 1050)
/// and every other line is a fixed share of it. The balance sheet balances.
pub fn generate_synthetic_statements(years: &[i32]) -> Vec<CanonicalRow> {
    let mut revenue = BASE_REVENUE;
    let mut rows = Vec::with_capacity(years.len() * RATIOS.len());
    for year in years {
        revenue *= REVENUE_GROWTH;
        rows.extend(
            RATIOS
                .iter()
                .map(|(statement, line_item, ratio)| CanonicalRow::new(*statement, *line_item, *year, revenue * ratio)),
        );
    }
    rows
}
