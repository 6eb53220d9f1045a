//! Discounted cash flow valuation.
//!
//! Terminal-value conventions are free functions so callers (and the
//! sensitivity grid) compute the terminal value before building
//! [`DcfInputs`]. The engine itself only discounts.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalMethod {
    #[default]
    ExitMultiple,
    Perpetuity,
}

impl TerminalMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExitMultiple => "exit_multiple",
            Self::Perpetuity => "perpetuity",
        }
    }
}

impl Display for TerminalMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TerminalMethod {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "exit_multiple" => Ok(Self::ExitMultiple),
            "perpetuity" => Ok(Self::Perpetuity),
            _ => Err(ValidationError::InvalidTerminalMethod {
                value: value.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfInputs {
    pub ufcf: Vec<f64>,
    pub wacc: f64,
    pub terminal_method: TerminalMethod,
    pub terminal_value: f64,
    pub debt: f64,
    pub cash: f64,
    pub shares: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcfResult {
    pub enterprise_value: f64,
    pub equity_value: f64,
    pub share_price: f64,
    pub pv_ufcf: f64,
    pub pv_terminal: f64,
}

/// `1 / (1 + rate)^period`, with the first forecast year at period 1.
pub fn discount_factor(rate: f64, period: i32) -> f64 {
    1.0 / (1.0 + rate).powi(period)
}

pub fn pv_cashflows(cashflows: &[f64], rate: f64) -> f64 {
    cashflows
        .iter()
        .zip(1..)
        .map(|(cashflow, period)| cashflow * discount_factor(rate, period))
        .sum()
}

/// Values the explicit horizon plus a terminal value landing at its end.
///
/// Zero shares yield a zero share price instead of dividing.
pub fn dcf_valuation(inputs: &DcfInputs) -> DcfResult {
    let horizon = i32::try_from(inputs.ufcf.len()).unwrap_or(i32::MAX);
    let pv_ufcf = pv_cashflows(&inputs.ufcf, inputs.wacc);
    let pv_terminal = inputs.terminal_value * discount_factor(inputs.wacc, horizon);
    let enterprise_value = pv_ufcf + pv_terminal;
    let equity_value = enterprise_value - inputs.debt + inputs.cash;
    let share_price = if inputs.shares == 0.0 {
        0.0
    } else {
        equity_value / inputs.shares
    };
    DcfResult {
        enterprise_value,
        equity_value,
        share_price,
        pv_ufcf,
        pv_terminal,
    }
}

pub fn terminal_value_exit_multiple(ebitda: f64, multiple: f64) -> f64 {
    ebitda * multiple
}

/// Gordon growth value; NaN once growth meets or exceeds the discount rate.
pub fn terminal_value_perpetuity(ufcf_next: f64, wacc: f64, growth: f64) -> f64 {
    if wacc <= growth {
        return f64::NAN;
    }
    ufcf_next / (wacc - growth)
}
