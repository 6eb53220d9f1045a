//! # Domain Models
//!
//! Canonical value types shared by every stage of the valuation pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CanonicalRow`] | One `(statement, line_item, year, value)` observation |
//! | [`Statement`] | Income statement, balance sheet or cash flow |
//! | [`DriverFamily`] | Extrapolation bucket for a line item |
//! | [`Assumption`] | Per-year assumption path with optional rationale |
//! | [`ForecastResult`] | Projected rows plus reconciliation diagnostics |
//! | [`RawFact`] | Flattened externally tagged fact |
//! | [`CompanyProfile`] | CIK, ticker and registrant name |
//! | [`Symbol`] | Validated ticker symbol |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! All types are plain values: cheap to clone, no shared mutable state.

mod models;
mod symbol;
mod timestamp;

pub use models::{
    Assumption, AssumptionSet, CanonicalRow, CompanyProfile, DriverFamily, ForecastDiagnostics,
    ForecastResult, Plug, RawFact, Statement, REVENUE_GROWTH,
};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
