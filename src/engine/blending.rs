//! Remaining-life rate blending used for `ftp_rate`
//!
//! Kept separate from the engines so the convention can be swapped without
//! touching the amortization formulas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FtpError;

/// Weight sums at or below this magnitude are treated as zero
pub const WEIGHT_EPSILON: f64 = 1e-12;

/// How market rates over the remaining life are combined into one FTP rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateBlending {
    /// Arithmetic weighted mean: `Σ w_k r_k / Σ w_k`
    #[default]
    Simple,
    /// Weighted geometric mean of growth factors: `Π (1 + r_k)^(w_k / Σ w) - 1`
    Compounded,
}

impl RateBlending {
    /// Blend `rates` with `weights`; `None` when the weights sum to zero.
    ///
    /// The compounded convention yields NaN when a growth factor `1 + r` is
    /// not positive; callers treat non-finite output as not computable.
    pub fn blend(&self, rates: &[f64], weights: &[f64]) -> Option<f64> {
        debug_assert_eq!(rates.len(), weights.len());
        let total: f64 = weights.iter().sum();
        if total.abs() <= WEIGHT_EPSILON {
            return None;
        }

        let blended = match self {
            RateBlending::Simple => {
                rates.iter().zip(weights).map(|(r, w)| r * w).sum::<f64>() / total
            }
            RateBlending::Compounded => {
                let log_growth: f64 = rates
                    .iter()
                    .zip(weights)
                    .map(|(r, w)| w * (1.0 + r).ln())
                    .sum();
                (log_growth / total).exp() - 1.0
            }
        };
        Some(blended)
    }

    /// Foreign selector: `0` = simple, `1` = compounded
    pub fn from_selector(selector: i32) -> Result<Self, FtpError> {
        match selector {
            0 => Ok(RateBlending::Simple),
            1 => Ok(RateBlending::Compounded),
            other => Err(FtpError::InvalidMethod(format!(
                "unknown blending selector {other} (expected 0=simple, 1=compounded)"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RateBlending::Simple => "simple",
            RateBlending::Compounded => "compounded",
        }
    }
}

impl fmt::Display for RateBlending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateBlending {
    type Err = FtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(RateBlending::Simple),
            "compounded" | "compound" => Ok(RateBlending::Compounded),
            other => Err(FtpError::InvalidMethod(format!(
                "unknown blending '{other}' (use 'simple' or 'compounded')"
            ))),
        }
    }
}
