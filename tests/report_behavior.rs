//! Behavior-driven tests for report export
//!
//! These tests verify HOW one forecast run is assembled into sheets and
//! handed to the workbook and CSV sinks.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use tempfile::TempDir;
use valuecast_core::{forecast, generate_synthetic_statements, AssumptionSet, UtcDateTime};
use valuecast_report::{
    diagnostics_table, source_trace_table, statement_tables, CsvWorkbookSink, ReportBundle,
    ReportSink, SheetLayout, Table, XlsxWorkbookSink,
};

fn sample_bundle() -> ReportBundle {
    let history = generate_synthetic_statements(&[2021, 2022, 2023]);
    let result = forecast(&history, &[2024, 2025], &AssumptionSet::new()).expect("forecast");
    ReportBundle {
        generated_at: UtcDateTime::from_unix_seconds(0).expect("epoch"),
        company_summary: BTreeMap::from([(String::from("ticker"), String::from("SAMPLE"))]),
        statements: statement_tables(&history, &result.rows),
        assumptions: Table::default(),
        valuation_tables: Vec::new(),
        sensitivity: Table::default(),
        diagnostics: diagnostics_table(&result.diagnostics.plugs, &BTreeSet::new(), &[], &[]),
        source_trace: source_trace_table(&history),
    }
}

// =============================================================================
// Report: Workbook Sink
// =============================================================================

#[test]
fn when_report_is_exported_as_workbook_system_writes_one_xlsx_file() {
    // Given: A bundle built from a forecast of synthetic history
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("sample.xlsx");

    // When: It is written through the workbook sink
    let manifest = XlsxWorkbookSink::new(&path).write(&sample_bundle()).expect("written");

    // Then: A single zip-packaged workbook holds every sheet with the fixed layout
    assert_eq!(&fs::read(&path).expect("workbook")[..2], b"PK");
    assert_eq!(fs::read_dir(dir.path()).expect("listing").count(), 1);
    assert_eq!(manifest.sheets.len(), 8);
    assert_eq!(manifest.sheets[1].name, "Income Statement");
    assert!(manifest.sheets.iter().all(|sheet| sheet.layout == SheetLayout::default()));
    assert_eq!(SheetLayout::default().column_width, 18);
}

// =============================================================================
// Report: CSV Sink
// =============================================================================

#[test]
fn when_report_is_exported_as_csv_system_writes_a_sheet_per_file() {
    // Given: The same bundle
    let dir = TempDir::new().expect("tempdir");

    // When: It is written through the CSV sink
    let manifest = CsvWorkbookSink::new(dir.path()).write(&sample_bundle()).expect("written");

    // Then: Each sheet is its own file, headed by its column names
    assert_eq!(manifest.sheets.len(), 8);
    let income = fs::read_to_string(dir.path().join(&manifest.sheets[1].file)).expect("income sheet");
    assert!(income.starts_with("statement,line_item,year,value,forecast_method\n"));
    assert!(dir.path().join("workbook.json").exists());
}
