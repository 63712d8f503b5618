//! Flux method: variable stock from clamped profile decrements
//!
//! Variable stock only carries net inflows from a position's own schedule,
//! so both the balance and its run-off are floored at zero.

use crate::error::Result;
use crate::matrix::Matrix;

/// `(varstock_amort, varstock_instal)` for the flux method.
///
/// - `varstock_amort[i][t] = max(0, (profiles[i][t] - profiles[i][t+1]) * outstanding[i])`
/// - `varstock_instal[i][t] = max(0, varstock_amort[i][t-1] - varstock_amort[i][t])`,
///   with the balance before period 0 equal to `outstanding[i]`
pub(super) fn variable_stock(profiles: &Matrix, outstanding: &Matrix) -> Result<(Matrix, Matrix)> {
    let (n, m) = profiles.dims();
    let periods = m - 1;
    let mut varstock = Matrix::zeros(n, periods)?;
    let mut instal = Matrix::zeros(n, periods)?;

    for i in 0..n {
        let principal = outstanding[(i, 0)];
        let curve = profiles.row(i);
        let mut previous = principal;
        for t in 0..periods {
            let inflow = ((curve[t] - curve[t + 1]) * principal).max(0.0);
            varstock[(i, t)] = inflow;
            instal[(i, t)] = (previous - inflow).max(0.0);
            previous = inflow;
        }
    }

    Ok((varstock, instal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_decrement_times_principal() {
        let outstanding = Matrix::column(vec![1000.0]);
        let profiles = Matrix::from_rows(vec![vec![1.00, 0.50, 0.20, 0.05]]).unwrap();
        let (varstock, instal) = variable_stock(&profiles, &outstanding).unwrap();
        for (got, want) in varstock.as_slice().iter().zip([500.0, 300.0, 150.0]) {
            assert_relative_eq!(*got, want, epsilon = 1e-9);
        }
        for (got, want) in instal.as_slice().iter().zip([500.0, 200.0, 150.0]) {
            assert_relative_eq!(*got, want, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_increasing_profile_is_clamped() {
        let outstanding = Matrix::column(vec![900.0]);
        // Repricing weight rises in period 1
        let profiles = Matrix::from_rows(vec![vec![1.0, 0.6, 0.8, 0.3]]).unwrap();
        let (varstock, instal) = variable_stock(&profiles, &outstanding).unwrap();
        assert_eq!(varstock[(0, 1)], 0.0);
        assert!(varstock.as_slice().iter().all(|v| *v >= 0.0));
        assert!(instal.as_slice().iter().all(|v| *v >= 0.0));
        // 0.0 -> 450.0 would be a negative run-off
        assert_eq!(instal[(0, 2)], 0.0);
    }

    #[test]
    fn test_negative_principal_never_yields_negative_varstock() {
        let outstanding = Matrix::column(vec![-500.0]);
        let profiles = Matrix::from_rows(vec![vec![1.0, 0.5, 0.0]]).unwrap();
        let (varstock, _) = variable_stock(&profiles, &outstanding).unwrap();
        assert_eq!(varstock.as_slice(), &[0.0, 0.0]);
    }
}
