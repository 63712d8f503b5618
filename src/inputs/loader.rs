//! Load input matrices from header-less CSV files
//!
//! One matrix row per CSV record; every record must have the same width.

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{FtpError, Result};
use crate::matrix::Matrix;

/// Load a matrix from a CSV file
pub fn load_matrix<P: AsRef<Path>>(path: P) -> Result<Matrix> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|e| FtpError::Io(format!("{}: {e}", path.display())))?;
    let matrix = load_matrix_from_reader(file)?;
    log::debug!(
        "loaded {}x{} matrix from {}",
        matrix.rows(),
        matrix.cols(),
        path.display()
    );
    Ok(matrix)
}

/// Load a matrix from any reader (e.g., string buffer, network stream)
pub fn load_matrix_from_reader<R: Read>(reader: R) -> Result<Matrix> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row = record
            .iter()
            .map(|cell| {
                cell.parse::<f64>().map_err(|e| FtpError::Parse {
                    line,
                    message: format!("'{cell}': {e}"),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    Matrix::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_profiles_from_string() {
        let data = "1.00,0.50,0.20,0.05\n1.00, 0.50, 0.20, 0.05\n";
        let m = load_matrix_from_reader(data.as_bytes()).unwrap();
        assert_eq!(m.dims(), (2, 4));
        assert_eq!(m[(1, 3)], 0.05);
    }

    #[test]
    fn test_ragged_csv_is_dimension_mismatch() {
        let data = "1.0,2.0\n3.0\n";
        let err = load_matrix_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, FtpError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_bad_cell_reports_line() {
        let data = "1.0,2.0\n3.0,abc\n";
        let err = load_matrix_from_reader(data.as_bytes()).unwrap_err();
        match err {
            FtpError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("abc"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_matrix("does/not/exist.csv").unwrap_err();
        assert!(matches!(err, FtpError::Io(_)));
    }
}
