//! Input book for one FTP computation and its dimensional validation

pub mod loader;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FtpError, Result};
use crate::matrix::Matrix;

pub use loader::{load_matrix, load_matrix_from_reader};

/// File names expected by [`FtpInputs::from_csv_dir`]
pub const OUTSTANDING_FILE: &str = "outstanding.csv";
pub const PROFILES_FILE: &str = "profiles.csv";
pub const RATES_FILE: &str = "rates.csv";

/// The three input matrices of a computation
///
/// - `outstanding`: `n x 1` principal per position
/// - `profiles`: `n x m` repricing curve per position (column 0 is 100%)
/// - `rates`: `n x (m-1)` market rate at each period boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FtpInputs {
    pub outstanding: Matrix,
    pub profiles: Matrix,
    pub rates: Matrix,
}

impl FtpInputs {
    pub fn new(outstanding: Matrix, profiles: Matrix, rates: Matrix) -> Self {
        Self {
            outstanding,
            profiles,
            rates,
        }
    }

    /// Load `outstanding.csv`, `profiles.csv` and `rates.csv` from a directory
    pub fn from_csv_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            outstanding: load_matrix(dir.join(OUTSTANDING_FILE))?,
            profiles: load_matrix(dir.join(PROFILES_FILE))?,
            rates: load_matrix(dir.join(RATES_FILE))?,
        })
    }

    /// Check dimensional consistency; see [`validate`]
    pub fn validate(&self) -> Result<()> {
        validate(&self.outstanding, &self.profiles, &self.rates)
    }

    /// Number of positions `n`
    pub fn positions(&self) -> usize {
        self.outstanding.rows()
    }

    /// Number of periods `m - 1`, the width of every output
    pub fn periods(&self) -> usize {
        self.rates.cols()
    }
}

/// Dimensional checks, applied in order; the first failure is reported.
///
/// 1. all three matrices non-empty
/// 2. `outstanding` has exactly one column
/// 3. all three share the same row count
/// 4. `profiles.cols == rates.cols + 1`
/// 5. `profiles.cols >= 2`
pub fn validate(outstanding: &Matrix, profiles: &Matrix, rates: &Matrix) -> Result<()> {
    for (name, m) in [
        ("outstanding", outstanding),
        ("profiles", profiles),
        ("rates", rates),
    ] {
        if m.is_empty() {
            return Err(FtpError::dimension(
                "non-empty",
                format!("'{name}' is {}x{}", m.rows(), m.cols()),
            ));
        }
    }

    if outstanding.cols() != 1 {
        return Err(FtpError::dimension(
            "outstanding columns",
            format!("'outstanding' must have 1 column, got {}", outstanding.cols()),
        ));
    }

    let n = outstanding.rows();
    if profiles.rows() != n || rates.rows() != n {
        return Err(FtpError::dimension(
            "row count",
            format!(
                "outstanding has {n} rows, profiles {}, rates {}",
                profiles.rows(),
                rates.rows()
            ),
        ));
    }

    if profiles.cols() != rates.cols() + 1 {
        return Err(FtpError::dimension(
            "profile/rate columns",
            format!(
                "'rates' must have one fewer column than 'profiles' (rate_cols={}, profile_cols={})",
                rates.cols(),
                profiles.cols()
            ),
        ));
    }

    if profiles.cols() < 2 {
        return Err(FtpError::dimension(
            "period count",
            format!("'profiles' needs at least 2 columns, got {}", profiles.cols()),
        ));
    }

    Ok(())
}
