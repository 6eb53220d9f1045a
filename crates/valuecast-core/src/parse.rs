//! Lenient numeric and label parsing for uploaded or scraped statement data.

use std::sync::LazyLock;

use regex::Regex;

/// Parses a cell into a number. Thousands separators are stripped; blanks and
/// dash placeholders are treated as missing.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();
    if matches!(cleaned, "" | "-" | "—") {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"20[0-9]{2}").expect("year pattern is valid"));

/// First `20xx` year embedded in a column label such as `"FY2023"`.
pub fn detect_year(label: &str) -> Option<i32> {
    YEAR_PATTERN
        .find(label)
        .and_then(|found| found.as_str().parse().ok())
}

/// Applies the magnitude implied by a unit label (`"USD thousands"` → ×1000).
pub fn scale_value(value: f64, unit: &str) -> f64 {
    let unit = unit.to_ascii_lowercase();
    let scale = if unit.contains("billion") {
        1_000_000_000.0
    } else if unit.contains("million") {
        1_000_000.0
    } else if unit.contains("thousand") {
        1_000.0
    } else {
        1.0
    };
    value * scale
}

/// Division that yields NaN instead of infinity for a zero denominator.
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

/// Trims and collapses internal whitespace runs to a single space.
pub fn clean_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ")
}
