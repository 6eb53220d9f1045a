use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::bundle::{ReportBundle, SheetLayout, MODEL_VERSION};
use crate::ReportError;

pub const MANIFEST_FILE: &str = "workbook.json";

/// Destination for a finished report. Sinks only serialize; nothing flows back.
pub trait ReportSink {
    fn write(&self, bundle: &ReportBundle) -> Result<ReportManifest, ReportError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetEntry {
    pub name: String,
    pub file: String,
    pub rows: usize,
    pub columns: usize,
    pub layout: SheetLayout,
}

/// Index of written sheets, saved next to them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportManifest {
    pub model_version: String,
    pub generated_at: String,
    /// Directory of CSV sheets, or the workbook file.
    pub location: PathBuf,
    pub sheets: Vec<SheetEntry>,
}

/// Writes each sheet as a CSV file plus a `workbook.json` manifest. CSV has
/// no panes or widths, so the layout is only recorded in the manifest.
#[derive(Debug, Clone)]
pub struct CsvWorkbookSink {
    dir: PathBuf,
}

impl CsvWorkbookSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// `"Valuation – DCF"` → `"valuation-dcf"`.
pub fn sheet_file_stem(name: &str) -> String {
    let lowered: String = name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch.to_ascii_lowercase() } else { ' ' })
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join("-")
}

impl ReportSink for CsvWorkbookSink {
    fn write(&self, bundle: &ReportBundle) -> Result<ReportManifest, ReportError> {
        fs::create_dir_all(&self.dir)?;
        let mut entries = Vec::new();

        for (position, sheet) in bundle.sheets()?.into_iter().enumerate() {
            let file = format!("{:02}-{}.csv", position + 1, sheet_file_stem(&sheet.name));
            let mut writer = csv::Writer::from_path(self.dir.join(&file))?;
            writer.write_record(&sheet.table.columns)?;
            for row in &sheet.table.rows {
                writer.write_record(row.iter().map(ToString::to_string))?;
            }
            writer.flush()?;

            entries.push(SheetEntry {
                name: sheet.name,
                file,
                rows: sheet.table.rows.len(),
                columns: sheet.table.columns.len(),
                layout: sheet.layout,
            });
        }

        let manifest = ReportManifest {
            model_version: MODEL_VERSION.to_owned(),
            generated_at: bundle.generated_at.format_rfc3339(),
            location: self.dir.clone(),
            sheets: entries,
        };
        fs::write(
            self.dir.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?,
        )?;
        info!(dir = %self.dir.display(), sheets = manifest.sheets.len(), "report written");
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use valuecast_core::UtcDateTime;

    use super::*;
    use crate::table::{Cell, Table};

    #[test]
    fn stems_are_ascii_slugs() {
        assert_eq!(sheet_file_stem("Valuation – DCF"), "valuation-dcf");
        assert_eq!(sheet_file_stem("Drivers & Assumptions"), "drivers-assumptions");
    }

    #[test]
    fn writes_one_csv_per_sheet_and_a_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bundle = ReportBundle {
            generated_at: UtcDateTime::from_unix_seconds(0).expect("epoch"),
            company_summary: BTreeMap::from([("ticker".to_owned(), "SAMPLE".to_owned())]),
            statements: Vec::new(),
            assumptions: Table::new(["name", "value"]).with_row([Cell::from("wacc"), Cell::from(0.1)]),
            valuation_tables: Vec::new(),
            sensitivity: Table::default(),
            diagnostics: Table::default(),
            source_trace: Table::default(),
        };

        let manifest = CsvWorkbookSink::new(dir.path().join("out")).write(&bundle).expect("written");

        assert_eq!(manifest.sheets.len(), 5);
        assert_eq!(manifest.sheets[1].file, "02-drivers-assumptions.csv");
        let csv = fs::read_to_string(dir.path().join("out").join("02-drivers-assumptions.csv")).expect("csv");
        assert_eq!(csv, "name,value\nwacc,0.1\n");
        let json: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("out").join(MANIFEST_FILE)).expect("manifest"),
        )
        .expect("json");
        assert_eq!(json["sheets"][0]["layout"]["column_width"], 18);
    }
}
