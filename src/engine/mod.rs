//! FTP computation engine
//!
//! Both methods share the amortization, rate and interest formulas in
//! [`common`]; only the variable-stock routine differs:
//!
//! - **Stock**: anti-diagonal alignment against the previous cohort
//! - **Flux**: profile decrements clamped at zero
//!
//! Every output is `n x (m-1)`, column-aligned with the rate matrix.

mod blending;
mod common;
mod flux;
mod stock;

pub use blending::{RateBlending, WEIGHT_EPSILON};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FtpError, Result};
use crate::inputs::FtpInputs;
use crate::matrix::Matrix;

/// Periods per year used to turn an annual FTP rate into period interest
pub const DEFAULT_PERIODS_PER_YEAR: u32 = 12;

/// FTP computation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Stock,
    Flux,
}

impl Method {
    /// Foreign selector: `0` = stock, `1` = flux
    pub fn from_selector(selector: i32) -> Result<Self> {
        match selector {
            0 => Ok(Method::Stock),
            1 => Ok(Method::Flux),
            other => Err(FtpError::InvalidMethod(format!(
                "unknown method {other} (expected 0=stock, 1=flux)"
            ))),
        }
    }

    pub fn selector(&self) -> i32 {
        match self {
            Method::Stock => 0,
            Method::Flux => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Stock => "stock",
            Method::Flux => "flux",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = FtpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stock" => Ok(Method::Stock),
            "flux" => Ok(Method::Flux),
            other => Err(FtpError::InvalidMethod(format!(
                "unknown method '{other}' (use 'stock' or 'flux')"
            ))),
        }
    }
}

/// Configuration for a computation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Convention for blending remaining-life market rates into `ftp_rate`
    pub blending: RateBlending,

    /// Divisor applied to `ftp_rate * stock_instal` (12 for monthly interest)
    pub periods_per_year: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            blending: RateBlending::Simple,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
        }
    }
}

/// Identifies one of the seven output matrices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    StockAmort,
    StockInstal,
    VarstockAmort,
    VarstockInstal,
    FtpRate,
    FtpInt,
    MarketRate,
}

impl OutputKind {
    /// All outputs in canonical order
    pub const ALL: [OutputKind; 7] = [
        OutputKind::StockAmort,
        OutputKind::StockInstal,
        OutputKind::VarstockAmort,
        OutputKind::VarstockInstal,
        OutputKind::FtpRate,
        OutputKind::FtpInt,
        OutputKind::MarketRate,
    ];

    /// Output at `index` in canonical order
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputKind::StockAmort => "stock_amort",
            OutputKind::StockInstal => "stock_instal",
            OutputKind::VarstockAmort => "varstock_amort",
            OutputKind::VarstockInstal => "varstock_instal",
            OutputKind::FtpRate => "ftp_rate",
            OutputKind::FtpInt => "ftp_int",
            OutputKind::MarketRate => "market_rate",
        }
    }
}

/// The seven result matrices of one computation, all `n x (m-1)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtpOutputs {
    /// Remaining principal at the end of each period
    pub stock_amort: Matrix,
    /// Principal leaving the stock during each period
    pub stock_instal: Matrix,
    /// Stock attributable to the position's own volume
    pub varstock_amort: Matrix,
    /// Period run-off of the variable stock
    pub varstock_instal: Matrix,
    /// Remaining-life blended transfer rate
    pub ftp_rate: Matrix,
    /// Transfer interest per period
    pub ftp_int: Matrix,
    /// Market rate per period
    pub market_rate: Matrix,
}

impl FtpOutputs {
    pub fn get(&self, kind: OutputKind) -> &Matrix {
        match kind {
            OutputKind::StockAmort => &self.stock_amort,
            OutputKind::StockInstal => &self.stock_instal,
            OutputKind::VarstockAmort => &self.varstock_amort,
            OutputKind::VarstockInstal => &self.varstock_instal,
            OutputKind::FtpRate => &self.ftp_rate,
            OutputKind::FtpInt => &self.ftp_int,
            OutputKind::MarketRate => &self.market_rate,
        }
    }

    /// Shared shape of every output
    pub fn dims(&self) -> (usize, usize) {
        self.stock_amort.dims()
    }

    /// `(kind, matrix)` pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (OutputKind, &Matrix)> {
        OutputKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

/// Run one method over a book.
///
/// Fails with `DimensionMismatch` when [`FtpInputs::validate`] rejects the
/// inputs, and with `NotComputable` on non-finite inputs or a zero
/// `periods_per_year`.
pub fn compute(inputs: &FtpInputs, method: Method, config: &EngineConfig) -> Result<FtpOutputs> {
    inputs.validate()?;
    check_computable(inputs, config)?;

    let (n, periods) = (inputs.positions(), inputs.periods());
    log::debug!("computing {method} method over {n} positions x {periods} periods");

    let stock_amort = common::stock_amort(&inputs.outstanding, &inputs.profiles)?;
    let stock_instal = common::run_off(&stock_amort, &inputs.outstanding)?;
    let market_rate = common::market_rate(&inputs.rates);
    let ftp_rate = common::ftp_rate(&inputs.profiles, &inputs.rates, config.blending)?;
    let ftp_int = common::ftp_int(&ftp_rate, &stock_instal, config.periods_per_year)?;

    let (varstock_amort, varstock_instal) = match method {
        Method::Stock => stock::variable_stock(&stock_amort, &inputs.outstanding)?,
        Method::Flux => flux::variable_stock(&inputs.profiles, &inputs.outstanding)?,
    };

    log::info!("{method} computation complete ({n}x{periods})");

    Ok(FtpOutputs {
        stock_amort,
        stock_instal,
        varstock_amort,
        varstock_instal,
        ftp_rate,
        ftp_int,
        market_rate,
    })
}

fn check_computable(inputs: &FtpInputs, config: &EngineConfig) -> Result<()> {
    if config.periods_per_year == 0 {
        return Err(FtpError::NotComputable {
            row: 0,
            col: 0,
            reason: "periods_per_year must be positive".into(),
        });
    }
    for (name, m) in [
        ("outstanding", &inputs.outstanding),
        ("profiles", &inputs.profiles),
        ("rates", &inputs.rates),
    ] {
        if let Some((row, col)) = m.first_non_finite() {
            return Err(FtpError::NotComputable {
                row,
                col,
                reason: format!("'{name}' holds a non-finite value"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Three cohorts sharing one repricing curve
    fn reference_book() -> FtpInputs {
        FtpInputs::new(
            Matrix::column(vec![1000.0, 1200.0, 1350.0]),
            Matrix::from_rows(vec![vec![1.00, 0.50, 0.20, 0.05]; 3]).unwrap(),
            Matrix::from_rows(vec![
                vec![0.01300, 0.01400, 0.01600],
                vec![0.01360, 0.01460, 0.01660],
                vec![0.01430, 0.01530, 0.01730],
            ])
            .unwrap(),
        )
    }

    fn run(method: Method) -> FtpOutputs {
        compute(&reference_book(), method, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_reference_scenario_stock() {
        let out = run(Method::Stock);
        assert_eq!(out.dims(), (3, 3));
        assert_eq!(out.stock_amort.row(0), &[500.0, 200.0, 50.0]);
        assert_eq!(out.stock_instal.row(0), &[500.0, 300.0, 150.0]);
    }

    #[test]
    fn test_all_outputs_match_rate_shape() {
        for method in [Method::Stock, Method::Flux] {
            let out = run(method);
            for (kind, m) in out.iter() {
                assert_eq!(m.dims(), (3, 3), "{} has wrong shape", kind.name());
            }
        }
    }

    #[test]
    fn test_last_period_amort_is_direct_product() {
        let book = reference_book();
        for method in [Method::Stock, Method::Flux] {
            let out = compute(&book, method, &EngineConfig::default()).unwrap();
            for i in 0..3 {
                assert_eq!(
                    out.stock_amort[(i, 2)],
                    book.outstanding[(i, 0)] * book.profiles[(i, 3)]
                );
            }
        }
    }

    #[test]
    fn test_instalments_telescope_to_amortized_principal() {
        let book = reference_book();
        for method in [Method::Stock, Method::Flux] {
            let out = compute(&book, method, &EngineConfig::default()).unwrap();
            for i in 0..3 {
                let total: f64 = out.stock_instal.row(i).iter().sum();
                assert_relative_eq!(
                    total,
                    book.outstanding[(i, 0)] - out.stock_amort[(i, 2)],
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn test_shared_formulas_identical_across_methods() {
        let stock = run(Method::Stock);
        let flux = run(Method::Flux);
        for kind in [
            OutputKind::StockAmort,
            OutputKind::StockInstal,
            OutputKind::FtpRate,
            OutputKind::FtpInt,
            OutputKind::MarketRate,
        ] {
            assert_eq!(stock.get(kind), flux.get(kind), "{} differs", kind.name());
        }
        assert_ne!(stock.varstock_amort, flux.varstock_amort);
    }

    #[test]
    fn test_ftp_rate_and_interest_reference_values() {
        let out = run(Method::Stock);
        assert_relative_eq!(out.ftp_rate[(0, 0)], 0.0131 / 0.95, epsilon = 1e-12);
        assert_relative_eq!(out.ftp_rate[(0, 1)], 0.0066 / 0.45, epsilon = 1e-12);
        assert_relative_eq!(out.ftp_rate[(0, 2)], 0.016, epsilon = 1e-12);
        assert_relative_eq!(out.ftp_int[(0, 0)], out.ftp_rate[(0, 0)] * 500.0 / 12.0, epsilon = 1e-12);
        assert_relative_eq!(out.ftp_int[(0, 2)], 0.016 * 150.0 / 12.0, epsilon = 1e-12);
        assert_eq!(out.market_rate, reference_book().rates);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let a = run(Method::Flux);
        let b = run(Method::Flux);
        for ((_, x), (_, y)) in a.iter().zip(b.iter()) {
            let bits_x: Vec<u64> = x.as_slice().iter().map(|v| v.to_bits()).collect();
            let bits_y: Vec<u64> = y.as_slice().iter().map(|v| v.to_bits()).collect();
            assert_eq!(bits_x, bits_y);
        }
    }

    #[test]
    fn test_periods_per_year_scales_interest() {
        let config = EngineConfig {
            periods_per_year: 4,
            ..EngineConfig::default()
        };
        let quarterly = compute(&reference_book(), Method::Stock, &config).unwrap();
        let monthly = run(Method::Stock);
        assert_relative_eq!(quarterly.ftp_int[(1, 1)], monthly.ftp_int[(1, 1)] * 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_input_is_not_computable() {
        let mut book = reference_book();
        book.rates[(2, 1)] = f64::NAN;
        let err = compute(&book, Method::Stock, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, FtpError::NotComputable { row: 2, col: 1, .. }));
    }

    #[test]
    fn test_unvalidated_book_is_rejected() {
        let mut book = reference_book();
        book.outstanding = Matrix::column(vec![1000.0, 1200.0]);
        let err = compute(&book, Method::Stock, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, FtpError::DimensionMismatch { check: "row count", .. }));
    }

    #[test]
    fn test_zero_periods_per_year_is_not_computable() {
        let config = EngineConfig {
            periods_per_year: 0,
            ..EngineConfig::default()
        };
        let err = compute(&reference_book(), Method::Flux, &config).unwrap_err();
        assert!(matches!(err, FtpError::NotComputable { .. }));
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!(Method::from_selector(0).unwrap(), Method::Stock);
        assert_eq!(Method::from_selector(1).unwrap(), Method::Flux);
        assert!(matches!(Method::from_selector(99), Err(FtpError::InvalidMethod(_))));
        assert_eq!(" FLUX ".parse::<Method>().unwrap(), Method::Flux);
        assert!("average".parse::<Method>().is_err());
        assert_eq!(OutputKind::from_index(6), Some(OutputKind::MarketRate));
        assert_eq!(OutputKind::from_index(7), None);
    }
}
