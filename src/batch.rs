//! Parallel computation over many independent books
//!
//! Each book is validated and priced on its own; one failure does not stop
//! the others. Results come back in input order.

use rayon::prelude::*;

use crate::engine::{self, EngineConfig, FtpOutputs, Method};
use crate::error::Result;
use crate::inputs::FtpInputs;

/// Validate and compute every book with the same method and configuration
pub fn compute_all(books: &[FtpInputs], method: Method, config: &EngineConfig) -> Vec<Result<FtpOutputs>> {
    log::debug!("batch {method} computation over {} books", books.len());

    let results: Vec<Result<FtpOutputs>> = books
        .par_iter()
        .map(|book| engine::compute(book, method, config))
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        log::warn!("{failed} of {} books failed", books.len());
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FtpError;
    use crate::matrix::Matrix;

    fn book(principal: f64) -> FtpInputs {
        FtpInputs::new(
            Matrix::column(vec![principal, principal * 2.0]),
            Matrix::from_rows(vec![vec![1.0, 0.6, 0.3, 0.0]; 2]).unwrap(),
            Matrix::from_rows(vec![vec![0.02, 0.025, 0.03]; 2]).unwrap(),
        )
    }

    #[test]
    fn test_matches_sequential_compute_in_order() {
        let books: Vec<_> = (1..=16).map(|k| book(100.0 * k as f64)).collect();
        let config = EngineConfig::default();
        let parallel = compute_all(&books, Method::Flux, &config);

        assert_eq!(parallel.len(), books.len());
        for (book, result) in books.iter().zip(&parallel) {
            let sequential = engine::compute(book, Method::Flux, &config).unwrap();
            assert_eq!(result.as_ref().unwrap(), &sequential);
        }
    }

    #[test]
    fn test_failure_is_isolated() {
        let mut bad = book(500.0);
        bad.rates = Matrix::from_rows(vec![vec![0.02, 0.025]; 2]).unwrap();
        let books = vec![book(100.0), bad, book(300.0)];

        let results = compute_all(&books, Method::Stock, &EngineConfig::default());
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(FtpError::DimensionMismatch { .. })));
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_empty_batch() {
        assert!(compute_all(&[], Method::Stock, &EngineConfig::default()).is_empty());
    }
}
