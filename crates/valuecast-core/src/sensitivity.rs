//! Two-dimensional DCF sensitivity over (discount rate, terminal parameter).

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dcf::{
    dcf_valuation, terminal_value_exit_multiple, terminal_value_perpetuity, DcfInputs, DcfResult,
    TerminalMethod,
};
use crate::ValidationError;

/// [`DcfResult`] field stored in each grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityMetric {
    EnterpriseValue,
    EquityValue,
    #[default]
    SharePrice,
    PvUfcf,
    PvTerminal,
}

impl SensitivityMetric {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnterpriseValue => "enterprise_value",
            Self::EquityValue => "equity_value",
            Self::SharePrice => "share_price",
            Self::PvUfcf => "pv_ufcf",
            Self::PvTerminal => "pv_terminal",
        }
    }

    pub fn read(self, result: &DcfResult) -> f64 {
        match self {
            Self::EnterpriseValue => result.enterprise_value,
            Self::EquityValue => result.equity_value,
            Self::SharePrice => result.share_price,
            Self::PvUfcf => result.pv_ufcf,
            Self::PvTerminal => result.pv_terminal,
        }
    }
}

impl Display for SensitivityMetric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensitivityMetric {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "enterprise_value" => Ok(Self::EnterpriseValue),
            "equity_value" => Ok(Self::EquityValue),
            "share_price" => Ok(Self::SharePrice),
            "pv_ufcf" => Ok(Self::PvUfcf),
            "pv_terminal" => Ok(Self::PvTerminal),
            _ => Err(ValidationError::InvalidMetric {
                value: value.to_owned(),
            }),
        }
    }
}

/// `grid[i][j]` holds the metric at `x_values[i]` (wacc) and `y_values[j]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityGrid {
    pub x_values: Vec<f64>,
    pub y_values: Vec<f64>,
    pub grid: Vec<Vec<f64>>,
}

impl SensitivityGrid {
    pub fn shape(&self) -> (usize, usize) {
        (self.grid.len(), self.grid.first().map_or(0, Vec::len))
    }
}

/// `size` evenly spaced points from `min` to `max`, both endpoints included.
pub fn linspace(min: f64, max: f64, size: usize) -> Vec<f64> {
    match size {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (size - 1) as f64;
            (0..size)
                .map(|index| if index == size - 1 { max } else { min + step * index as f64 })
                .collect()
        }
    }
}

/// Validated axis: finite bounds and at least two points.
pub fn build_grid(field: &'static str, range: (f64, f64), size: usize) -> Result<Vec<f64>, ValidationError> {
    if size < 2 {
        return Err(ValidationError::GridTooSmall { size });
    }
    if !range.0.is_finite() || !range.1.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(linspace(range.0, range.1, size))
}

/// Re-runs a full DCF for every (wacc, terminal parameter) pair.
///
/// The base terminal value is reused as the EBITDA-like base for exit
/// multiples and as next-period UFCF for perpetuity growth.
pub fn dcf_sensitivity(
    base: &DcfInputs,
    wacc_range: (f64, f64),
    terminal_range: (f64, f64),
    size: usize,
    terminal_method: TerminalMethod,
    metric: SensitivityMetric,
) -> Result<SensitivityGrid, ValidationError> {
    let x_values = build_grid("wacc_range", wacc_range, size)?;
    let y_values = build_grid("terminal_range", terminal_range, size)?;
    debug!(size, method = %terminal_method, metric = %metric, "building sensitivity grid");

    let grid = x_values
        .iter()
        .map(|wacc| {
            y_values
                .iter()
                .map(|parameter| {
                    let terminal_value = match terminal_method {
                        TerminalMethod::ExitMultiple => {
                            terminal_value_exit_multiple(base.terminal_value, *parameter)
                        }
                        TerminalMethod::Perpetuity => {
                            terminal_value_perpetuity(base.terminal_value, *wacc, *parameter)
                        }
                    };
                    let inputs = DcfInputs {
                        ufcf: base.ufcf.clone(),
                        wacc: *wacc,
                        terminal_method,
                        terminal_value,
                        debt: base.debt,
                        cash: base.cash,
                        shares: base.shares,
                    };
                    metric.read(&dcf_valuation(&inputs))
                })
                .collect()
        })
        .collect();

    Ok(SensitivityGrid {
        x_values,
        y_values,
        grid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> DcfInputs {
        DcfInputs {
            ufcf: vec![100.0, 110.0, 120.0],
            wacc: 0.1,
            terminal_method: TerminalMethod::ExitMultiple,
            terminal_value: 150.0,
            debt: 0.0,
            cash: 0.0,
            shares: 10.0,
        }
    }

    #[test]
    fn linspace_includes_both_endpoints() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(2.0, 2.0, 3), vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn grid_shape_matches_size() {
        let grid = dcf_sensitivity(
            &base(),
            (0.08, 0.12),
            (8.0, 12.0),
            5,
            TerminalMethod::ExitMultiple,
            SensitivityMetric::SharePrice,
        )
        .expect("valid grid");

        assert_eq!(grid.x_values.len(), 5);
        assert_eq!(grid.y_values.len(), 5);
        assert_eq!(grid.shape(), (5, 5));
    }

    #[test]
    fn each_cell_is_an_independent_valuation() {
        let grid = dcf_sensitivity(
            &base(),
            (0.08, 0.12),
            (8.0, 12.0),
            3,
            TerminalMethod::ExitMultiple,
            SensitivityMetric::EnterpriseValue,
        )
        .expect("valid grid");

        let mut expected_inputs = base();
        expected_inputs.wacc = 0.10;
        expected_inputs.terminal_value = 150.0 * 10.0;
        let expected = dcf_valuation(&expected_inputs).enterprise_value;
        assert!((grid.grid[1][1] - expected).abs() < 1e-9);
        // higher discount rate, lower value
        assert!(grid.grid[0][1] > grid.grid[2][1]);
        // higher multiple, higher value
        assert!(grid.grid[1][2] > grid.grid[1][0]);
    }

    #[test]
    fn perpetuity_cells_are_nan_where_growth_meets_wacc() {
        let grid = dcf_sensitivity(
            &base(),
            (0.05, 0.10),
            (0.02, 0.10),
            2,
            TerminalMethod::Perpetuity,
            SensitivityMetric::SharePrice,
        )
        .expect("valid grid");

        assert!(grid.grid[0][0].is_finite());
        assert!(grid.grid[0][1].is_nan());
        assert!(grid.grid[1][1].is_nan());
    }

    #[test]
    fn rejects_degenerate_grids() {
        let err = dcf_sensitivity(
            &base(),
            (0.08, 0.12),
            (8.0, 12.0),
            1,
            TerminalMethod::ExitMultiple,
            SensitivityMetric::SharePrice,
        )
        .expect_err("size below two");
        assert_eq!(err, ValidationError::GridTooSmall { size: 1 });

        assert!(build_grid("wacc_range", (f64::NAN, 0.1), 3).is_err());
        assert!("price".parse::<SensitivityMetric>().is_err());
    }
}
