//! Stock method: variable stock by anti-diagonal alignment
//!
//! Rows are successive origination cohorts. Cohort `i` at period `t` is
//! compared with cohort `i-1` one period further along its own curve, so the
//! difference isolates the volume cohort `i` brings in.

use super::common::run_off;
use crate::error::Result;
use crate::matrix::Matrix;

/// Previous cohort's balance one period further along, if that cell exists
fn anti_diagonal_predecessor(amort: &Matrix, row: usize, col: usize) -> Option<f64> {
    if row == 0 {
        return None;
    }
    amort.get(row - 1, col + 1)
}

/// `(varstock_amort, varstock_instal)` for the stock method.
///
/// The first cohort and the last period have no predecessor cell and keep
/// their own `stock_amort` value.
pub(super) fn variable_stock(stock_amort: &Matrix, outstanding: &Matrix) -> Result<(Matrix, Matrix)> {
    let (n, periods) = stock_amort.dims();
    let mut varstock = Matrix::zeros(n, periods)?;
    for i in 0..n {
        for t in 0..periods {
            let own = stock_amort[(i, t)];
            varstock[(i, t)] = match anti_diagonal_predecessor(stock_amort, i, t) {
                Some(aged) => own - aged,
                None => own,
            };
        }
    }

    let instal = run_off(&varstock, outstanding)?;
    Ok((varstock, instal))
}
