//! Nested company-facts payload and its flattened table form.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::RawFact;

/// Company-facts document: taxonomy → tag → unit → observations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyFacts {
    #[serde(default)]
    pub cik: Option<u64>,
    #[serde(default, rename = "entityName")]
    pub entity_name: Option<String>,
    #[serde(default)]
    pub facts: BTreeMap<String, BTreeMap<String, TagFacts>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagFacts {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub units: BTreeMap<String, Vec<FactRecord>>,
}

/// Single reported value as it appears in the upstream document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    #[serde(default)]
    pub val: Option<f64>,
    #[serde(default)]
    pub fy: Option<i32>,
    #[serde(default)]
    pub fp: Option<String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub filed: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub accn: Option<String>,
    #[serde(default)]
    pub frame: Option<String>,
}

/// Flattens the nested document into one [`RawFact`] per observation.
pub fn flatten_company_facts(facts: &CompanyFacts) -> Vec<RawFact> {
    let mut records = Vec::new();
    for (taxonomy, tags) in &facts.facts {
        for (tag, detail) in tags {
            for (unit, items) in &detail.units {
                records.extend(items.iter().map(|item| RawFact {
                    taxonomy: taxonomy.clone(),
                    tag: tag.clone(),
                    unit: unit.clone(),
                    value: item.val,
                    fy: item.fy,
                    fp: item.fp.clone(),
                    form: item.form.clone(),
                    filed: item.filed.clone(),
                    end: item.end.clone(),
                    start: item.start.clone(),
                    accn: item.accn.clone(),
                    frame: item.frame.clone(),
                }));
            }
        }
    }
    records
}

/// The `count` most recent fiscal years present, ascending.
pub fn latest_fiscal_years(facts: &[RawFact], count: usize) -> Vec<i32> {
    let years: BTreeSet<i32> = facts.iter().filter_map(|fact| fact.fy).collect();
    let skip = years.len().saturating_sub(count);
    years.into_iter().skip(skip).collect()
}

pub fn select_facts_for_years(facts: &[RawFact], years: &[i32]) -> Vec<RawFact> {
    facts
        .iter()
        .filter(|fact| fact.fy.is_some_and(|fy| years.contains(&fy)))
        .cloned()
        .collect()
}

/// Keeps full-year observations (`fp == "FY"`) only.
pub fn retain_annual(facts: Vec<RawFact>) -> Vec<RawFact> {
    facts
        .into_iter()
        .filter(|fact| fact.fp.as_deref() == Some("FY"))
        .collect()
}
