//! Comparable-company multiples.

use serde::{Deserialize, Serialize};

use crate::stats::{mean, median, min_max};

/// Multiple label used when no peers are supplied.
pub const DEFAULT_MULTIPLE_TYPE: &str = "EV/EBITDA";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompInput {
    pub peer: String,
    pub multiple_type: String,
    pub multiple: f64,
}

impl CompInput {
    pub fn new(peer: impl Into<String>, multiple_type: impl Into<String>, multiple: f64) -> Self {
        Self {
            peer: peer.into(),
            multiple_type: multiple_type.into(),
            multiple,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerStats {
    pub median: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompsResult {
    pub implied_value: f64,
    pub multiple_type: String,
    pub peers: Vec<CompInput>,
    pub stats: PeerStats,
}

/// Summary over usable multiples. Zero and NaN multiples are skipped; with
/// nothing left every statistic is zero.
pub fn summarize_peers(peers: &[CompInput]) -> PeerStats {
    let values: Vec<f64> = peers
        .iter()
        .map(|peer| peer.multiple)
        .filter(|multiple| *multiple != 0.0 && !multiple.is_nan())
        .collect();

    let (Some(median), Some(mean), Some((min, max))) =
        (median(&values), mean(&values), min_max(&values))
    else {
        return PeerStats::default();
    };
    PeerStats { median, mean, min, max }
}

pub fn compute_implied_value(metric: f64, multiple: f64) -> f64 {
    metric * multiple
}

/// Applies the peer median multiple to `metric`.
pub fn comps_valuation(metric: f64, peers: Vec<CompInput>) -> CompsResult {
    let stats = summarize_peers(&peers);
    let multiple_type = peers
        .first()
        .map_or_else(|| DEFAULT_MULTIPLE_TYPE.to_owned(), |peer| peer.multiple_type.clone());
    CompsResult {
        implied_value: compute_implied_value(metric, stats.median),
        multiple_type,
        peers,
        stats,
    }
}
