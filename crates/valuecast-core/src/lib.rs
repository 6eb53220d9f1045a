//! # Valuecast Core
//!
//! Forecasting, reconciliation and valuation engines for the valuecast
//! toolkit, plus the network collaborators that feed them.
//!
//! ## Overview
//!
//! - **Normalization** of externally tagged facts into canonical long-format rows
//! - **Forecasting** per driver family, followed by a single-pass balance-sheet plug
//! - **Valuation**: UFCF bridge, DCF with two terminal conventions, peer multiples
//! - **Sensitivity** surfaces over (discount rate, terminal parameter)
//! - **Advisory** baseline assumptions with an optional, fail-safe enhancer
//! - **Facts retrieval** with an on-disk cache, minimum call spacing and bounded retry
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | SEC facts client, generative-text enhancer |
//! | [`advisory`] | Rule-table recommendations and the enhancer seam |
//! | [`cache`] | On-disk response cache |
//! | [`classify`] | Line-item → driver-family table |
//! | [`comps`] | Comparable-multiples valuation |
//! | [`dcf`] | Discounted cash flow valuation and terminal values |
//! | [`domain`] | Canonical value types |
//! | [`error`] | Core error types |
//! | [`facts`] | Company-facts document and flattening |
//! | [`forecast`] | Forecast engine and balance reconciler |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`normalize`] | Tag → statement mapping |
//! | [`parse`] | Lenient numeric parsing helpers |
//! | [`retry`] | Bounded exponential backoff |
//! | [`sample`] | Synthetic statements |
//! | [`sensitivity`] | DCF sensitivity grid |
//! | [`stats`] | NaN-aware statistics |
//! | [`throttling`] | Minimum-interval rate limiter |
//! | [`ufcf`] | Unlevered free cash flow bridge |
//! | [`upload`] | CSV historicals loader |
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌─────────────────┐
//! │ Facts client │──▶│ Normalizer │──▶│ Forecast engine │
//! └──────────────┘   └────────────┘   │  + reconciler   │
//!                                     └────────┬────────┘
//!                                              ▼
//!                    ┌──────────┐     ┌─────────────────┐
//!                    │  Comps   │◀────│   UFCF → DCF    │──▶ Sensitivity
//!                    └──────────┘     └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use valuecast_core::{forecast, generate_synthetic_statements, AssumptionSet};
//!
//! let history = generate_synthetic_statements(&[2021, 2022, 2023]);
//! let result = forecast(&history, &[2024, 2025], &AssumptionSet::new()).unwrap();
//! assert!(result.diagnostics.plugs.is_empty());
//! ```
//!
//! ## Error Handling
//!
//! Caller mistakes are [`ValidationError`]s and collaborator failures are
//! [`SourceError`]s. Data-quality gaps are never errors: they surface as NaN
//! values, plugs and missing-statement sets next to the primary result.

pub mod adapters;
pub mod advisory;
pub mod cache;
pub mod classify;
pub mod comps;
pub mod dcf;
pub mod domain;
pub mod error;
pub mod facts;
pub mod forecast;
pub mod http_client;
pub mod normalize;
pub mod parse;
pub mod retry;
pub mod sample;
pub mod sensitivity;
pub mod stats;
pub mod throttling;
pub mod ufcf;
pub mod upload;

// Adapters
pub use adapters::{
    CompanyFactsFetch, EnhancerConfig, FactsClientConfig, Fetched, OpenAiEnhancer,
    SecFactsClient, TickerIndex,
};

// Advisory
pub use advisory::{
    build_recommendations, AdvisoryProfile, HistoryMetrics, NoopEnhancer, Recommendation,
    RecommendationEnhancer, Recommendations,
};

// Caching
pub use cache::{CacheMode, FactsCache};

// Classification
pub use classify::{classify_line_item, summarize_driver_families, DriverTable};

// Valuation
pub use comps::{comps_valuation, CompInput, CompsResult, PeerStats};
pub use dcf::{
    dcf_valuation, discount_factor, terminal_value_exit_multiple, terminal_value_perpetuity,
    DcfInputs, DcfResult, TerminalMethod,
};
pub use sensitivity::{dcf_sensitivity, SensitivityGrid, SensitivityMetric};
pub use ufcf::{build_ufcf, UfcfRow};

// Domain models
pub use domain::{
    Assumption, AssumptionSet, CanonicalRow, CompanyProfile, DriverFamily, ForecastDiagnostics,
    ForecastResult, Plug, RawFact, Statement, Symbol, UtcDateTime, REVENUE_GROWTH,
};

// Error types
pub use error::{CoreError, SourceError, SourceErrorKind, ValidationError};

// Ingestion
pub use facts::{flatten_company_facts, CompanyFacts};
pub use forecast::{forecast, reconcile_balance_sheet, ForecastEngine};
pub use normalize::{missing_statements, normalize, TagMap};
pub use sample::generate_synthetic_statements;
pub use upload::{load_historicals, read_historicals};

// Transport
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
    ScriptedHttpClient,
};
pub use retry::{Backoff, RetryConfig};
pub use throttling::MinIntervalLimiter;
