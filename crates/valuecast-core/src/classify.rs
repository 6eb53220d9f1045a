//! Line-item → driver-family lookup.
//!
//! The assignment is configuration, not logic: the built-in entries live in
//! [`DEFAULT_DRIVER_FAMILIES`] and a replacement table can be loaded from a
//! JSON object of `{"<line item>": "<family>"}`.

use std::collections::BTreeMap;

use crate::domain::{CanonicalRow, DriverFamily};
use crate::{CoreError, ValidationError};

/// Built-in line-item assignments.
pub const DEFAULT_DRIVER_FAMILIES: &[(&str, DriverFamily)] = &[
    ("Revenue", DriverFamily::RevenueDriven),
    ("Cost of revenue", DriverFamily::MarginDriven),
    ("Gross profit", DriverFamily::MarginDriven),
    ("Operating income", DriverFamily::MarginDriven),
    ("Net income", DriverFamily::MarginDriven),
    ("Cash and equivalents", DriverFamily::WorkingCapital),
    ("Inventory", DriverFamily::WorkingCapital),
    ("Accounts receivable", DriverFamily::WorkingCapital),
    ("Accounts payable", DriverFamily::WorkingCapital),
    ("PP&E", DriverFamily::Fixed),
    ("Long-term debt", DriverFamily::Financing),
    ("Total assets", DriverFamily::Total),
    ("Total liabilities", DriverFamily::Total),
    ("Total equity", DriverFamily::Total),
    ("Net cash from ops", DriverFamily::CashFlow),
    ("Capex", DriverFamily::Fixed),
    ("D&A", DriverFamily::Fixed),
];

/// Immutable line-item classification table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverTable {
    entries: BTreeMap<String, DriverFamily>,
}

impl Default for DriverTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_DRIVER_FAMILIES
                .iter()
                .map(|(label, family)| ((*label).to_owned(), *family))
                .collect(),
        }
    }
}

impl DriverTable {
    /// Builds a table, rejecting labels that appear more than once.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (S, DriverFamily)>,
        S: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (label, family) in entries {
            let label = label.into();
            if map.insert(label.clone(), family).is_some() {
                return Err(ValidationError::DuplicateTableEntry {
                    table: "driver family",
                    key: label,
                });
            }
        }
        Ok(Self { entries: map })
    }

    /// Parses a JSON object mapping line-item labels to family names.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let entries: BTreeMap<String, DriverFamily> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }

    /// Total lookup; labels absent from the table are [`DriverFamily::Other`].
    pub fn classify(&self, line_item: &str) -> DriverFamily {
        self.entries
            .get(line_item)
            .copied()
            .unwrap_or(DriverFamily::Other)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Classifies against the built-in table.
pub fn classify_line_item(line_item: &str) -> DriverFamily {
    DEFAULT_DRIVER_FAMILIES
        .iter()
        .find(|(label, _)| *label == line_item)
        .map_or(DriverFamily::Other, |(_, family)| *family)
}

/// Row count per driver family.
pub fn summarize_driver_families(
    table: &DriverTable,
    rows: &[CanonicalRow],
) -> BTreeMap<DriverFamily, usize> {
    let mut counts = BTreeMap::new();
    for row in rows {
        *counts.entry(table.classify(&row.line_item)).or_insert(0) += 1;
    }
    counts
}
