//! Rule-table assumption recommendations and the enhancement seam.
//!
//! [`build_recommendations`] is pure: a coarse company profile plus a
//! trailing gross margin map to baseline growth, margin and WACC ranges.
//! Post-processing goes through [`RecommendationEnhancer`], whose contract
//! is infallible: an implementation that cannot improve the payload must
//! hand it back untouched.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::domain::{Assumption, AssumptionSet, CanonicalRow, REVENUE_GROWTH};
use crate::forecast::REVENUE;

pub const GROSS_MARGIN: &str = "gross_margin";
pub const WACC: &str = "wacc";

pub const DEFAULT_GROSS_MARGIN: f64 = 0.45;

const GROWTH_MATURE: f64 = 0.06;
const GROWTH_HIGH: f64 = 0.12;
const GROWTH_TURNAROUND: f64 = 0.04;
const GROWTH_BAND: f64 = 0.03;
const MARGIN_BAND: f64 = 0.10;
const MARGIN_FLOOR: f64 = 0.10;
const MARGIN_CAP: f64 = 0.90;
const WACC_LARGE: f64 = 0.09;
const WACC_DEFAULT: f64 = 0.11;
const WACC_BAND: f64 = 0.02;
const PLAUSIBILITY_SCORE: u8 = 72;

/// Coarse, user-described company profile. Empty fields are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisoryProfile {
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub business_model: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryMetrics {
    pub gross_margin: f64,
}

impl Default for HistoryMetrics {
    fn default() -> Self {
        Self {
            gross_margin: DEFAULT_GROSS_MARGIN,
        }
    }
}

impl HistoryMetrics {
    /// Trailing gross margin from the latest year with usable inputs.
    ///
    /// Prefers `Gross profit / Revenue`, then `1 - Cost of revenue / Revenue`,
    /// then [`DEFAULT_GROSS_MARGIN`].
    pub fn from_rows(rows: &[CanonicalRow]) -> Self {
        let series = |line_item: &str| -> BTreeMap<i32, f64> {
            rows.iter()
                .filter(|row| row.line_item == line_item && row.value.is_finite())
                .map(|row| (row.year, row.value))
                .collect()
        };
        let revenue = series(REVENUE);
        let latest_ratio = |numerator: &BTreeMap<i32, f64>| {
            revenue
                .iter()
                .rev()
                .filter(|(_, base)| **base != 0.0)
                .find_map(|(year, base)| numerator.get(year).map(|value| value / base))
        };

        let gross_margin = latest_ratio(&series("Gross profit"))
            .or_else(|| latest_ratio(&series("Cost of revenue")).map(|ratio| 1.0 - ratio))
            .unwrap_or(DEFAULT_GROSS_MARGIN);
        Self { gross_margin }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub value: f64,
    pub range: [f64; 2],
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRecommendation {
    pub method: String,
    pub reasons: Vec<String>,
}

/// Advisory payload; the field names are its wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub recommended_assumptions: BTreeMap<String, Recommendation>,
    pub valuation_method_recommendation: MethodRecommendation,
    pub key_value_drivers: Vec<String>,
    pub risks: Vec<String>,
    pub plausibility_score: u8,
    pub plausibility_reasons: Vec<String>,
}

impl Recommendations {
    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.recommended_assumptions.get(name).map(|rec| rec.value)
    }

    /// Recommended growth as a flat path over `years` forecast years.
    pub fn to_assumptions(&self, years: usize) -> AssumptionSet {
        let mut set = AssumptionSet::new();
        if let Some(growth) = self.recommended_assumptions.get(REVENUE_GROWTH) {
            set.insert(
                Assumption::flat(REVENUE_GROWTH, growth.value, years)
                    .with_rationale(growth.rationale.clone()),
            );
        }
        set
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

pub fn build_recommendations(profile: &AdvisoryProfile, history: &HistoryMetrics) -> Recommendations {
    let stage = profile.stage.to_lowercase();
    let growth = if stage.contains("high") {
        GROWTH_HIGH
    } else if stage.contains("turnaround") {
        GROWTH_TURNAROUND
    } else {
        GROWTH_MATURE
    };

    let margin = history.gross_margin;
    let wacc = match profile.size.to_lowercase().as_str() {
        "large" | "mega" => WACC_LARGE,
        _ => WACC_DEFAULT,
    };

    let recommended_assumptions = BTreeMap::from([
        (
            REVENUE_GROWTH.to_owned(),
            Recommendation {
                value: growth,
                range: [growth - GROWTH_BAND, growth + GROWTH_BAND],
                rationale: "Growth reflects stage and historical trend.".to_owned(),
            },
        ),
        (
            GROSS_MARGIN.to_owned(),
            Recommendation {
                value: margin,
                range: [
                    MARGIN_FLOOR.max(margin - MARGIN_BAND),
                    MARGIN_CAP.min(margin + MARGIN_BAND),
                ],
                rationale: "Margin anchored to history with profile adjustment.".to_owned(),
            },
        ),
        (
            WACC.to_owned(),
            Recommendation {
                value: wacc,
                range: [wacc - WACC_BAND, wacc + WACC_BAND],
                rationale: "WACC based on size and stability.".to_owned(),
            },
        ),
    ]);

    Recommendations {
        recommended_assumptions,
        valuation_method_recommendation: MethodRecommendation {
            method: "Both".to_owned(),
            reasons: strings(&["Blend DCF and comps for balanced view."]),
        },
        key_value_drivers: strings(&[
            "Revenue growth trajectory",
            "Margin expansion",
            "Reinvestment intensity",
        ]),
        risks: strings(&["Macro slowdown", "Execution risk"]),
        plausibility_score: PLAUSIBILITY_SCORE,
        plausibility_reasons: strings(&["Assumptions in line with recent history."]),
    }
}

/// Optional post-filter over a recommendations payload.
pub trait RecommendationEnhancer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns an enhanced payload, or `payload` itself on any failure.
    fn enhance<'a>(
        &'a self,
        payload: Recommendations,
    ) -> Pin<Box<dyn Future<Output = Recommendations> + Send + 'a>>;
}

/// Pass-through enhancer used when no enhancement backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnhancer;

impl RecommendationEnhancer for NoopEnhancer {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn enhance<'a>(
        &'a self,
        payload: Recommendations,
    ) -> Pin<Box<dyn Future<Output = Recommendations> + Send + 'a>> {
        Box::pin(async move { payload })
    }
}
