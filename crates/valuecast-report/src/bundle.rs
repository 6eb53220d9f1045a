//! Assembly of typed report sections into named sheets.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use valuecast_core::{
    CanonicalRow, CompsResult, DcfResult, Plug, Recommendations, SensitivityGrid, Statement,
    UfcfRow, UtcDateTime,
};

use crate::table::{Cell, Table};
use crate::ReportError;

pub const MODEL_VERSION: &str = "1.0";

pub const COMPANY_SUMMARY: &str = "Company Summary";
pub const ASSUMPTIONS: &str = "Drivers & Assumptions";
pub const VALUATION_DCF: &str = "Valuation – DCF";
pub const VALUATION_COMPS: &str = "Valuation – Comps";
pub const VALUATION_UFCF: &str = "Valuation – UFCF";
pub const SENSITIVITY: &str = "Sensitivity";
pub const DIAGNOSTICS: &str = "Diagnostics & Narrative";
pub const SOURCE_TRACE: &str = "Source Trace";

/// Presentation hints carried with every sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SheetLayout {
    pub freeze_rows: u32,
    pub freeze_columns: u16,
    pub column_width: u32,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            freeze_rows: 1,
            freeze_columns: 1,
            column_width: 18,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub layout: SheetLayout,
    pub table: Table,
}

impl Sheet {
    pub fn new(name: impl Into<String>, table: Table) -> Result<Self, ReportError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ReportError::EmptySheetName);
        }
        Ok(Self {
            name,
            layout: SheetLayout::default(),
            table,
        })
    }
}

/// Everything one valuation run exports, already in table form.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportBundle {
    pub generated_at: UtcDateTime,
    pub company_summary: BTreeMap<String, String>,
    pub statements: Vec<(String, Table)>,
    pub assumptions: Table,
    pub valuation_tables: Vec<(String, Table)>,
    pub sensitivity: Table,
    pub diagnostics: Table,
    pub source_trace: Table,
}

impl ReportBundle {
    /// Sheets in workbook order, each with the default layout.
    pub fn sheets(&self) -> Result<Vec<Sheet>, ReportError> {
        let mut summary_columns: Vec<String> = self.company_summary.keys().cloned().collect();
        summary_columns.extend(["timestamp".to_owned(), "model_version".to_owned()]);
        let mut summary_row: Vec<Cell> = self
            .company_summary
            .values()
            .map(|value| Cell::from(value.as_str()))
            .collect();
        summary_row.push(Cell::from(self.generated_at.format_rfc3339()));
        summary_row.push(Cell::from(MODEL_VERSION));

        let mut sheets = vec![Sheet::new(
            COMPANY_SUMMARY,
            Table::new(summary_columns).with_row(summary_row),
        )?];
        for (name, table) in &self.statements {
            sheets.push(Sheet::new(name.clone(), table.clone())?);
        }
        sheets.push(Sheet::new(ASSUMPTIONS, self.assumptions.clone())?);
        for (name, table) in &self.valuation_tables {
            sheets.push(Sheet::new(name.clone(), table.clone())?);
        }
        sheets.push(Sheet::new(SENSITIVITY, self.sensitivity.clone())?);
        sheets.push(Sheet::new(DIAGNOSTICS, self.diagnostics.clone())?);
        sheets.push(Sheet::new(SOURCE_TRACE, self.source_trace.clone())?);
        Ok(sheets)
    }
}

fn row_cells(row: &CanonicalRow) -> Vec<Cell> {
    vec![
        Cell::from(row.statement.code()),
        Cell::from(row.line_item.as_str()),
        Cell::from(row.year),
        Cell::from(row.value),
        Cell::from(row.forecast_method.clone()),
    ]
}

/// One sheet per statement (titled), historical rows first then forecast.
pub fn statement_tables(historical: &[CanonicalRow], forecast: &[CanonicalRow]) -> Vec<(String, Table)> {
    Statement::ALL
        .into_iter()
        .map(|statement| {
            let mut table = Table::new(["statement", "line_item", "year", "value", "forecast_method"]);
            for row in historical.iter().chain(forecast).filter(|row| row.statement == statement) {
                table.push_row(row_cells(row));
            }
            (statement.title().to_owned(), table)
        })
        .collect()
}

/// Serializable records rendered one row each.
pub fn records_table<T: Serialize>(records: &[T]) -> Result<Table, ReportError> {
    let values = records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Table::from_json_records(&values))
}

pub fn assumptions_table(recommendations: &Recommendations) -> Result<Table, ReportError> {
    records_table(std::slice::from_ref(recommendations))
}

pub fn dcf_table(result: &DcfResult) -> Result<Table, ReportError> {
    records_table(std::slice::from_ref(result))
}

pub fn ufcf_table(rows: &[UfcfRow]) -> Result<Table, ReportError> {
    records_table(rows)
}

/// Peer statistics plus the implied value and multiple label.
pub fn comps_table(result: &CompsResult) -> Table {
    Table::new(["multiple_type", "implied_value", "median", "mean", "min", "max"]).with_row([
        Cell::from(result.multiple_type.as_str()),
        Cell::from(result.implied_value),
        Cell::from(result.stats.median),
        Cell::from(result.stats.mean),
        Cell::from(result.stats.min),
        Cell::from(result.stats.max),
    ])
}

/// First column is the discount rate; one column per terminal parameter.
pub fn sensitivity_table(grid: &SensitivityGrid) -> Table {
    let mut columns = vec!["wacc".to_owned()];
    columns.extend(grid.y_values.iter().map(|value| format!("{value:.4}")));
    let mut table = Table::new(columns);
    for (wacc, cells) in grid.x_values.iter().zip(&grid.grid) {
        table.push_row(std::iter::once(Cell::from(*wacc)).chain(cells.iter().copied().map(Cell::from)));
    }
    table
}

/// Plugs, coverage gaps, warnings and narrative lines, one per row.
pub fn diagnostics_table(
    plugs: &[Plug],
    missing: &BTreeSet<Statement>,
    warnings: &[String],
    narrative: &[String],
) -> Table {
    let mut table = Table::new(["kind", "year", "amount", "line_item", "detail"]);
    for plug in plugs {
        table.push_row([
            Cell::from("plug"),
            Cell::from(plug.year),
            Cell::from(plug.amount),
            Cell::from(plug.line_item.as_str()),
            Cell::Empty,
        ]);
    }
    for statement in missing {
        table.push_row([
            Cell::from("missing_statement"),
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::from(statement.title()),
        ]);
    }
    for (kind, lines) in [("warning", warnings), ("narrative", narrative)] {
        for line in lines {
            table.push_row([Cell::from(kind), Cell::Empty, Cell::Empty, Cell::Empty, Cell::from(line.as_str())]);
        }
    }
    table
}

/// Normalized rows with the tag and taxonomy they came from.
pub fn source_trace_table(rows: &[CanonicalRow]) -> Table {
    let mut table = Table::new(["statement", "line_item", "year", "value", "source_tag", "source_taxonomy"]);
    for row in rows {
        table.push_row([
            Cell::from(row.statement.code()),
            Cell::from(row.line_item.as_str()),
            Cell::from(row.year),
            Cell::from(row.value),
            Cell::from(row.source_tag.clone()),
            Cell::from(row.source_taxonomy.clone()),
        ]);
    }
    table
}
