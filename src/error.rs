//! Error taxonomy for the FTP engine and its foreign boundary

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, FtpError>;

/// Status code returned across the foreign boundary on success
pub const STATUS_OK: i32 = 0;

/// Errors raised while validating, computing or reading FTP matrices
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FtpError {
    /// Input matrices are not dimensionally consistent
    #[error("dimension mismatch ({check}): {detail}")]
    DimensionMismatch {
        /// Which validation check failed
        check: &'static str,
        /// Human-readable description of the offending shapes
        detail: String,
    },

    /// Unrecognized method or blending selector
    #[error("invalid method: {0}")]
    InvalidMethod(String),

    /// A result was requested before `compute` succeeded
    #[error("results not computed: call compute first")]
    NotComputed,

    /// Caller-supplied buffer cannot hold the requested data
    #[error("buffer too small: need {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },

    /// Storage for a matrix could not be reserved
    #[error("allocation failure: could not reserve {elements} elements")]
    AllocationFailure { elements: usize },

    /// Numerically degenerate input the engine cannot price
    #[error("not computable at row {row}, column {col}: {reason}")]
    NotComputable {
        row: usize,
        col: usize,
        reason: String,
    },

    /// A required pointer argument was null
    #[error("null argument: {0}")]
    NullArgument(&'static str),

    /// A panic was caught at the foreign boundary
    #[error("internal panic: {0}")]
    Panic(String),

    /// Reading an input file failed
    #[error("i/o error: {0}")]
    Io(String),

    /// A CSV cell could not be parsed as a number
    #[error("parse error on line {line}: {message}")]
    Parse { line: u64, message: String },
}

impl FtpError {
    /// Shorthand for a failed dimension check
    pub fn dimension(check: &'static str, detail: impl Into<String>) -> Self {
        FtpError::DimensionMismatch {
            check,
            detail: detail.into(),
        }
    }

    /// Non-zero status code conveyed to foreign callers
    pub fn status(&self) -> i32 {
        match self {
            FtpError::DimensionMismatch { .. } => 1,
            FtpError::InvalidMethod(_) => 2,
            FtpError::NotComputed => 3,
            FtpError::BufferTooSmall { .. } => 4,
            FtpError::AllocationFailure { .. } => 5,
            FtpError::NotComputable { .. } => 6,
            FtpError::NullArgument(_) => 7,
            FtpError::Panic(_) => 8,
            FtpError::Io(_) | FtpError::Parse { .. } => 9,
        }
    }
}

impl From<std::io::Error> for FtpError {
    fn from(e: std::io::Error) -> Self {
        FtpError::Io(e.to_string())
    }
}

impl From<csv::Error> for FtpError {
    fn from(e: csv::Error) -> Self {
        let line = e.position().map(|p| p.line()).unwrap_or(0);
        let message = e.to_string();
        match e.into_kind() {
            csv::ErrorKind::Io(io) => FtpError::Io(io.to_string()),
            csv::ErrorKind::UnequalLengths { expected_len, len, .. } => FtpError::dimension(
                "ragged rows",
                format!("line {line} has {len} fields, expected {expected_len}"),
            ),
            _ => FtpError::Parse { line, message },
        }
    }
}
