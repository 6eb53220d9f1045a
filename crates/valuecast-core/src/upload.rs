//! User-supplied historicals in `statement,line_item,year,value` CSV form.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{CanonicalRow, Statement};
use crate::parse::{clean_label, parse_numeric};
use crate::CoreError;

#[derive(Debug, Deserialize)]
struct UploadRecord {
    statement: String,
    line_item: String,
    year: String,
    value: String,
}

/// Reads historicals from any CSV source with a header row.
///
/// A row whose year or value cannot be parsed is skipped; an unknown
/// statement code is an error.
pub fn read_historicals<R: Read>(reader: R) -> Result<Vec<CanonicalRow>, CoreError> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    let mut skipped = 0_usize;

    for record in csv.deserialize::<UploadRecord>() {
        let record = record?;
        let statement: Statement = record.statement.parse()?;
        let year = parse_numeric(&record.year)
            .filter(|year| year.fract() == 0.0)
            .map(|year| year as i32);
        let value = parse_numeric(&record.value);
        let (Some(year), Some(value)) = (year, value) else {
            skipped += 1;
            continue;
        };
        rows.push(CanonicalRow::new(statement, clean_label(&record.line_item), year, value));
    }

    if skipped > 0 {
        warn!(skipped, "dropped uploaded rows without a numeric year or value");
    }
    debug!(rows = rows.len(), "loaded uploaded historicals");
    Ok(rows)
}

pub fn load_historicals(path: &Path) -> Result<Vec<CanonicalRow>, CoreError> {
    let file = std::fs::File::open(path)?;
    read_historicals(file)
}
