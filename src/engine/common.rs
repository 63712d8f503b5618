//! Formulas shared by the stock and flux methods

use super::blending::RateBlending;
use crate::error::{FtpError, Result};
use crate::matrix::Matrix;

/// `stock_amort[i][t] = outstanding[i] * profiles[i][t+1]`
pub(super) fn stock_amort(outstanding: &Matrix, profiles: &Matrix) -> Result<Matrix> {
    let (n, m) = profiles.dims();
    let mut amort = Matrix::zeros(n, m - 1)?;
    for i in 0..n {
        let principal = outstanding[(i, 0)];
        let curve = profiles.row(i);
        for (t, cell) in amort.row_mut(i).iter_mut().enumerate() {
            *cell = principal * curve[t + 1];
        }
    }
    Ok(amort)
}

/// Period run-off of an amortizing balance: `prev - current`, where the
/// balance before period 0 is the position's outstanding principal.
pub(super) fn run_off(amort: &Matrix, outstanding: &Matrix) -> Result<Matrix> {
    let (n, periods) = amort.dims();
    let mut instal = Matrix::zeros(n, periods)?;
    for i in 0..n {
        let mut previous = outstanding[(i, 0)];
        for t in 0..periods {
            let current = amort[(i, t)];
            instal[(i, t)] = previous - current;
            previous = current;
        }
    }
    Ok(instal)
}

/// Market rates pass through unchanged
pub(super) fn market_rate(rates: &Matrix) -> Matrix {
    rates.clone()
}

/// Remaining-life transfer rate.
///
/// Cell `(i, t)` blends `rates[i][t..]` weighted by the profile decrements
/// `profiles[i][k] - profiles[i][k+1]`. Cells whose weights sum to zero
/// (flat remaining profile) fall back to `0.0`.
pub(super) fn ftp_rate(profiles: &Matrix, rates: &Matrix, blending: RateBlending) -> Result<Matrix> {
    let (n, periods) = rates.dims();
    let mut ftp = Matrix::zeros(n, periods)?;
    let mut weights = Vec::with_capacity(periods);
    let mut flat_cells = 0usize;

    for i in 0..n {
        let curve = profiles.row(i);
        weights.clear();
        weights.extend((0..periods).map(|k| curve[k] - curve[k + 1]));
        let row_rates = rates.row(i);

        for t in 0..periods {
            let value = match blending.blend(&row_rates[t..], &weights[t..]) {
                Some(v) if v.is_finite() => v,
                Some(_) => {
                    return Err(FtpError::NotComputable {
                        row: i,
                        col: t,
                        reason: format!("{blending} blending produced a non-finite rate"),
                    })
                }
                None => {
                    flat_cells += 1;
                    0.0
                }
            };
            ftp[(i, t)] = value;
        }
    }

    if flat_cells > 0 {
        log::warn!("{flat_cells} ftp_rate cell(s) have a flat remaining profile; set to zero");
    }
    Ok(ftp)
}

/// `ftp_int[i][t] = ftp_rate[i][t] * stock_instal[i][t] / periods_per_year`
pub(super) fn ftp_int(ftp_rate: &Matrix, stock_instal: &Matrix, periods_per_year: u32) -> Result<Matrix> {
    let (n, periods) = ftp_rate.dims();
    let divisor = f64::from(periods_per_year);
    let mut interest = Matrix::zeros(n, periods)?;
    for i in 0..n {
        for t in 0..periods {
            interest[(i, t)] = ftp_rate[(i, t)] * stock_instal[(i, t)] / divisor;
        }
    }
    Ok(interest)
}
