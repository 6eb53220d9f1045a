//! Tagged facts → canonical long-format statement rows.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::domain::{CanonicalRow, RawFact, Statement};
use crate::stats::nan_mean;
use crate::ValidationError;

/// Recognized source tags, in priority order within each line item.
pub const STATEMENT_TAGS: &[(Statement, &str, &str)] = &[
    (Statement::Income, "Revenues", "Revenue"),
    (
        Statement::Income,
        "RevenueFromContractWithCustomerExcludingAssessedTax",
        "Revenue",
    ),
    (Statement::Income, "CostOfRevenue", "Cost of revenue"),
    (Statement::Income, "GrossProfit", "Gross profit"),
    (Statement::Income, "OperatingIncomeLoss", "Operating income"),
    (Statement::Income, "NetIncomeLoss", "Net income"),
    (Statement::Balance, "Assets", "Total assets"),
    (Statement::Balance, "Liabilities", "Total liabilities"),
    (Statement::Balance, "StockholdersEquity", "Total equity"),
    (
        Statement::Balance,
        "CashAndCashEquivalentsAtCarryingValue",
        "Cash and equivalents",
    ),
    (Statement::Balance, "InventoryNet", "Inventory"),
    (
        Statement::Balance,
        "AccountsReceivableNetCurrent",
        "Accounts receivable",
    ),
    (Statement::Balance, "AccountsPayableCurrent", "Accounts payable"),
    (Statement::Balance, "PropertyPlantAndEquipmentNet", "PP&E"),
    (Statement::Balance, "LongTermDebtNoncurrent", "Long-term debt"),
    (
        Statement::CashFlow,
        "NetCashProvidedByUsedInOperatingActivities",
        "Net cash from ops",
    ),
    (
        Statement::CashFlow,
        "PaymentsToAcquirePropertyPlantAndEquipment",
        "Capex",
    ),
    (
        Statement::CashFlow,
        "DepreciationDepletionAndAmortization",
        "D&A",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct TagTarget {
    statement: Statement,
    line_item: String,
    priority: usize,
}

/// Validated tag → (statement, line item) mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMap {
    ordered: Vec<(String, TagTarget)>,
    by_tag: HashMap<String, usize>,
}

impl Default for TagMap {
    fn default() -> Self {
        let mut map = Self {
            ordered: Vec::with_capacity(STATEMENT_TAGS.len()),
            by_tag: HashMap::with_capacity(STATEMENT_TAGS.len()),
        };
        for (statement, tag, line_item) in STATEMENT_TAGS {
            map.push(*statement, tag, line_item);
        }
        map
    }
}

impl TagMap {
    /// Builds a mapping; a tag listed twice is rejected.
    pub fn from_entries<'a, I>(entries: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (Statement, &'a str, &'a str)>,
    {
        let mut map = Self {
            ordered: Vec::new(),
            by_tag: HashMap::new(),
        };
        for (statement, tag, line_item) in entries {
            if map.by_tag.contains_key(tag) {
                return Err(ValidationError::DuplicateTableEntry {
                    table: "statement tag",
                    key: tag.to_owned(),
                });
            }
            map.push(statement, tag, line_item);
        }
        Ok(map)
    }

    fn push(&mut self, statement: Statement, tag: &str, line_item: &str) {
        let priority = self.ordered.len();
        self.by_tag.insert(tag.to_owned(), priority);
        self.ordered.push((
            tag.to_owned(),
            TagTarget {
                statement,
                line_item: line_item.to_owned(),
                priority,
            },
        ));
    }

    fn target(&self, tag: &str) -> Option<&TagTarget> {
        self.by_tag.get(tag).map(|index| &self.ordered[*index].1)
    }

    /// Maps facts to rows, one per matching fact.
    ///
    /// Unmapped tags and facts without a fiscal year are dropped. A fact
    /// without a value becomes a NaN row.
    pub fn normalize(&self, facts: &[RawFact]) -> Vec<CanonicalRow> {
        let mut rows = Vec::new();
        for (tag, target) in &self.ordered {
            rows.extend(
                facts
                    .iter()
                    .filter(|fact| &fact.tag == tag)
                    .filter_map(|fact| {
                        let year = fact.fy?;
                        Some(
                            CanonicalRow::new(
                                target.statement,
                                target.line_item.clone(),
                                year,
                                fact.value.unwrap_or(f64::NAN),
                            )
                            .with_source(fact.tag.clone(), fact.taxonomy.clone()),
                        )
                    }),
            );
        }
        debug!(facts = facts.len(), rows = rows.len(), "normalized tagged facts");
        rows
    }

    /// Collapses rows sharing `(statement, line_item, year)`.
    ///
    /// Rows from the highest-priority tag win; their values are averaged,
    /// ignoring NaN.
    pub fn resolve_duplicates(&self, rows: &[CanonicalRow]) -> Vec<CanonicalRow> {
        let mut groups: BTreeMap<(Statement, String, i32), Vec<&CanonicalRow>> = BTreeMap::new();
        for row in rows {
            groups
                .entry((row.statement, row.line_item.clone(), row.year))
                .or_default()
                .push(row);
        }

        groups
            .into_values()
            .filter_map(|group| {
                let best = group.iter().map(|row| self.priority(row)).min()?;
                let winners: Vec<&CanonicalRow> = group
                    .into_iter()
                    .filter(|row| self.priority(row) == best)
                    .collect();
                let first = *winners.first()?;
                let mut resolved = first.clone();
                resolved.value = nan_mean(winners.iter().map(|row| row.value));
                Some(resolved)
            })
            .collect()
    }

    fn priority(&self, row: &CanonicalRow) -> usize {
        row.source_tag
            .as_deref()
            .and_then(|tag| self.target(tag))
            .map_or(usize::MAX, |target| target.priority)
    }
}

/// Normalizes with the built-in tag mapping.
pub fn normalize(facts: &[RawFact]) -> Vec<CanonicalRow> {
    TagMap::default().normalize(facts)
}

/// Statements that have no rows at all.
pub fn missing_statements(rows: &[CanonicalRow]) -> BTreeSet<Statement> {
    let present: BTreeSet<Statement> = rows.iter().map(|row| row.statement).collect();
    Statement::ALL
        .into_iter()
        .filter(|statement| !present.contains(statement))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(tag: &str, value: f64, fy: Option<i32>) -> RawFact {
        RawFact::new("us-gaap", tag, "USD", Some(value), fy)
    }

    #[test]
    fn single_revenue_fact_yields_one_income_row() {
        let rows = normalize(&[fact("Revenues", 1000.0, Some(2023))]);

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.statement, Statement::Income);
        assert_eq!(row.line_item, "Revenue");
        assert_eq!(row.year, 2023);
        assert_eq!(row.value, 1000.0);
        assert_eq!(row.source_tag.as_deref(), Some("Revenues"));
        assert_eq!(row.source_taxonomy.as_deref(), Some("us-gaap"));
    }

    #[test]
    fn unmapped_tags_and_yearless_facts_are_dropped() {
        let rows = normalize(&[
            fact("SomeCustomTag", 5.0, Some(2023)),
            fact("Assets", 10.0, None),
            fact("Assets", 12.0, Some(2022)),
        ]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line_item, "Total assets");
        assert_eq!(rows[0].year, 2022);
    }

    #[test]
    fn missing_statements_reports_empty_coverage() {
        let rows = normalize(&[fact("Revenues", 1.0, Some(2023))]);
        let missing = missing_statements(&rows);
        assert_eq!(
            missing,
            BTreeSet::from([Statement::Balance, Statement::CashFlow])
        );
        assert_eq!(missing_statements(&[]).len(), 3);
    }

    #[test]
    fn duplicates_prefer_higher_priority_tag_and_average_its_values() {
        let rows = normalize(&[
            fact("RevenueFromContractWithCustomerExcludingAssessedTax", 999.0, Some(2023)),
            fact("Revenues", 1000.0, Some(2023)),
            fact("Revenues", 1010.0, Some(2023)),
            fact("Revenues", 900.0, Some(2022)),
        ]);
        assert_eq!(rows.len(), 4);

        let resolved = TagMap::default().resolve_duplicates(&rows);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].year, 2022);
        assert_eq!(resolved[1].year, 2023);
        assert_eq!(resolved[1].value, 1005.0);
        assert_eq!(resolved[1].source_tag.as_deref(), Some("Revenues"));
    }

    #[test]
    fn duplicate_tags_are_rejected() {
        let err = TagMap::from_entries([
            (Statement::Income, "Revenues", "Revenue"),
            (Statement::Income, "Revenues", "Sales"),
        ])
        .expect_err("duplicate tag");
        assert!(matches!(err, ValidationError::DuplicateTableEntry { .. }));
        assert!(TagMap::from_entries(STATEMENT_TAGS.iter().copied()).is_ok());
    }
}
