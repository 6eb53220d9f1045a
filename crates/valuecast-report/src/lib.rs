//! # Valuecast Report
//!
//! Turns the results of one valuation run into named sheets and hands them
//! to a [`ReportSink`]. Sheets carry a frozen header row and first column
//! and a fixed column width of 18.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bundle`] | Sheet assembly from core result types |
//! | [`sink`] | Sink trait and CSV workbook writer |
//! | [`xlsx`] | Single-file workbook writer |
//! | [`table`] | Typed cells and tables |

pub mod bundle;
mod error;
pub mod sink;
pub mod table;
pub mod xlsx;

pub use bundle::{
    assumptions_table, comps_table, dcf_table, diagnostics_table, records_table,
    sensitivity_table, source_trace_table, statement_tables, ufcf_table, ReportBundle, Sheet,
    SheetLayout, MODEL_VERSION,
};
pub use error::ReportError;
pub use sink::{CsvWorkbookSink, ReportManifest, ReportSink, SheetEntry};
pub use table::{Cell, Table};
pub use xlsx::XlsxWorkbookSink;
