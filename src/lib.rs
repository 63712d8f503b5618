//! FTP Engine - funds transfer pricing matrices for banking books
//!
//! This library provides:
//! - Stock and flux methods over outstanding, repricing-profile and market-rate matrices
//! - Remaining-life transfer rates with simple or compounded blending
//! - A computation handle that owns its inputs and latest result set
//! - Parallel batch computation over many books
//! - A handle-based C ABI (`ftp_*` symbols) for foreign callers

pub mod error;
pub mod matrix;
pub mod inputs;
pub mod engine;
pub mod handle;
pub mod batch;
pub mod ffi;

// Re-export commonly used types
pub use error::{FtpError, Result};
pub use matrix::Matrix;
pub use inputs::FtpInputs;
pub use engine::{EngineConfig, FtpOutputs, Method, OutputKind, RateBlending};
pub use handle::Computation;
pub use batch::compute_all;
