//! Single-file `.xlsx` workbook sink.

use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Color, ColNum, Format, FormatBorder, RowNum, Workbook, Worksheet};
use tracing::info;

use crate::bundle::{ReportBundle, Sheet, MODEL_VERSION};
use crate::sink::{ReportManifest, ReportSink, SheetEntry};
use crate::table::Cell;
use crate::ReportError;

/// Last column (zero-based) that receives the fixed width.
const LAST_SIZED_COLUMN: ColNum = 30;
const HEADER_FILL: u32 = 0xD9E1F2;

/// Writes every sheet into one workbook file, applying each sheet's
/// frozen panes and column width.
#[derive(Debug, Clone)]
pub struct XlsxWorkbookSink {
    path: PathBuf,
}

impl XlsxWorkbookSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_border(FormatBorder::Thin)
}

fn row_index(sheet: &Sheet, index: usize) -> Result<RowNum, ReportError> {
    RowNum::try_from(index).map_err(|_| ReportError::SheetTooLarge {
        sheet: sheet.name.clone(),
    })
}

fn column_index(sheet: &Sheet, index: usize) -> Result<ColNum, ReportError> {
    ColNum::try_from(index).map_err(|_| ReportError::SheetTooLarge {
        sheet: sheet.name.clone(),
    })
}

fn write_cell(worksheet: &mut Worksheet, row: RowNum, column: ColNum, cell: &Cell) -> Result<(), ReportError> {
    match cell {
        Cell::Empty => {}
        Cell::Text(text) => {
            worksheet.write_string(row, column, text)?;
        }
        Cell::Integer(value) => {
            worksheet.write_number(row, column, *value as f64)?;
        }
        Cell::Number(value) if value.is_finite() => {
            worksheet.write_number(row, column, *value)?;
        }
        // Excel has no NaN or infinity; keep the marker readable.
        Cell::Number(_) => {
            worksheet.write_string(row, column, cell.to_string())?;
        }
    }
    Ok(())
}

fn write_sheet(workbook: &mut Workbook, sheet: &Sheet, header: &Format) -> Result<(), ReportError> {
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&sheet.name)?;

    for (index, title) in sheet.table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, column_index(sheet, index)?, title, header)?;
    }
    for (offset, cells) in sheet.table.rows.iter().enumerate() {
        let row = row_index(sheet, offset + 1)?;
        for (index, cell) in cells.iter().enumerate() {
            write_cell(worksheet, row, column_index(sheet, index)?, cell)?;
        }
    }

    worksheet.set_freeze_panes(sheet.layout.freeze_rows, sheet.layout.freeze_columns)?;
    for column in 0..=LAST_SIZED_COLUMN {
        worksheet.set_column_width(column, f64::from(sheet.layout.column_width))?;
    }
    Ok(())
}

impl ReportSink for XlsxWorkbookSink {
    fn write(&self, bundle: &ReportBundle) -> Result<ReportManifest, ReportError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let header = header_format();
        let mut workbook = Workbook::new();
        let mut entries = Vec::new();
        for sheet in bundle.sheets()? {
            write_sheet(&mut workbook, &sheet, &header)?;
            entries.push(SheetEntry {
                file: file.clone(),
                rows: sheet.table.rows.len(),
                columns: sheet.table.columns.len(),
                layout: sheet.layout,
                name: sheet.name,
            });
        }
        workbook.save(&self.path)?;

        info!(path = %self.path.display(), sheets = entries.len(), "workbook written");
        Ok(ReportManifest {
            model_version: MODEL_VERSION.to_owned(),
            generated_at: bundle.generated_at.format_rfc3339(),
            location: self.path.clone(),
            sheets: entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use valuecast_core::UtcDateTime;

    use super::*;
    use crate::table::Table;

    fn bundle() -> ReportBundle {
        ReportBundle {
            generated_at: UtcDateTime::from_unix_seconds(0).expect("epoch"),
            company_summary: BTreeMap::from([("ticker".to_owned(), "SAMPLE".to_owned())]),
            statements: Vec::new(),
            assumptions: Table::new(["name", "value"])
                .with_row([Cell::from("wacc"), Cell::from(0.1)])
                .with_row([Cell::from("terminal"), Cell::from(f64::NAN)]),
            valuation_tables: Vec::new(),
            sensitivity: Table::default(),
            diagnostics: Table::default(),
            source_trace: Table::default(),
        }
    }

    #[test]
    fn writes_one_workbook_file_with_every_sheet() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("report.xlsx");

        let manifest = XlsxWorkbookSink::new(&path).write(&bundle()).expect("written");

        let bytes = fs::read(&path).expect("workbook");
        assert_eq!(&bytes[..2], b"PK");
        assert_eq!(manifest.location, path);
        assert_eq!(manifest.sheets.len(), 5);
        assert!(manifest.sheets.iter().all(|sheet| sheet.file == "report.xlsx"));
        assert_eq!(manifest.sheets[1].rows, 2);
    }

    #[test]
    fn oversized_column_index_is_reported() {
        let sheet = Sheet::new("Wide", Table::default()).expect("sheet");
        assert!(matches!(
            column_index(&sheet, usize::from(u16::MAX) + 1),
            Err(ReportError::SheetTooLarge { .. })
        ));
        assert_eq!(column_index(&sheet, 3).expect("fits"), 3);
    }
}
