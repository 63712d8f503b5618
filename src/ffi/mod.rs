//! C ABI over [`Computation`]
//!
//! Callers hold an opaque `FtpHandle` pointer from [`ftp_create`] until they
//! pass it to [`ftp_free`]. Results only leave the library by copy into
//! caller-owned buffers. Status-returning functions give `0` on success and
//! the [`FtpError::status`] code on failure, with the message available from
//! [`ftp_get_last_error`] on the same thread.

mod last_error;

pub use last_error::last_error;

use std::ffi::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::slice;

use crate::engine::{EngineConfig, Method, OutputKind, RateBlending};
use crate::error::{FtpError, Result, STATUS_OK};
use crate::handle::Computation;
use crate::matrix::Matrix;
use last_error::{clear_last_error, copy_last_error, last_error_len, set_last_error};

/// Opaque handle returned to foreign callers
pub struct FtpHandle {
    inner: Computation,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run `f` with panics contained, recording the outcome in the error slot
fn guarded<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(FtpError::Panic(panic_message(payload.as_ref()))));
    match &outcome {
        Ok(_) => clear_last_error(),
        Err(e) => set_last_error(e.to_string()),
    }
    outcome
}

fn status_of(result: Result<()>) -> i32 {
    match result {
        Ok(()) => STATUS_OK,
        Err(e) => e.status(),
    }
}

/// Copy a foreign row-major buffer into an owned matrix
///
/// # Safety
/// `data` must point to at least `rows * cols` readable doubles.
unsafe fn matrix_from_raw(data: *const f64, rows: usize, cols: usize, label: &'static str) -> Result<Matrix> {
    if data.is_null() {
        return Err(FtpError::NullArgument(label));
    }
    let len = rows
        .checked_mul(cols)
        .ok_or(FtpError::AllocationFailure { elements: usize::MAX })?;
    Matrix::from_slice(rows, cols, slice::from_raw_parts(data, len))
}

fn handle_ref<'a>(handle: *const FtpHandle) -> Result<&'a FtpHandle> {
    // SAFETY: callers promise a live pointer from `ftp_create` or null.
    unsafe { handle.as_ref() }.ok_or(FtpError::NullArgument("handle"))
}

fn handle_mut<'a>(handle: *mut FtpHandle) -> Result<&'a mut FtpHandle> {
    // SAFETY: as above; the caller does not share the handle across threads mid-call.
    unsafe { handle.as_mut() }.ok_or(FtpError::NullArgument("handle"))
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Validate three row-major matrices and return a new handle.
///
/// Returns null on null data pointers, dimension mismatch or allocation
/// failure; the reason is available from [`ftp_get_last_error`].
///
/// # Safety
/// Each data pointer must reference `rows * cols` readable doubles. The
/// buffers are copied; the library keeps no reference to them.
#[no_mangle]
pub unsafe extern "C" fn ftp_create(
    outstanding: *const f64,
    outs_rows: usize,
    outs_cols: usize,
    profiles: *const f64,
    prof_rows: usize,
    prof_cols: usize,
    rates: *const f64,
    rate_rows: usize,
    rate_cols: usize,
) -> *mut FtpHandle {
    let created = guarded(|| {
        let outstanding = matrix_from_raw(outstanding, outs_rows, outs_cols, "outstanding")?;
        let profiles = matrix_from_raw(profiles, prof_rows, prof_cols, "profiles")?;
        let rates = matrix_from_raw(rates, rate_rows, rate_cols, "rates")?;
        Computation::new(outstanding, profiles, rates)
    });

    match created {
        Ok(inner) => {
            let handle = Box::into_raw(Box::new(FtpHandle { inner }));
            log::debug!("ftp_create -> {handle:p}");
            handle
        }
        Err(_) => ptr::null_mut(),
    }
}

/// Release a handle and everything it owns. No-op on null.
///
/// # Safety
/// `handle` must come from [`ftp_create`] and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn ftp_free(handle: *mut FtpHandle) {
    if handle.is_null() {
        return;
    }
    log::debug!("ftp_free({handle:p})");
    drop(Box::from_raw(handle));
}

// ---------------------------------------------------------------------------
// Compute
// ---------------------------------------------------------------------------

/// Run the computation with the default rate blending.
///
/// `method`: `0` = stock, `1` = flux.
///
/// # Safety
/// `handle` must be null or a live handle not in use by another thread.
#[no_mangle]
pub unsafe extern "C" fn ftp_compute(handle: *mut FtpHandle, method: i32) -> i32 {
    ftp_compute_with(handle, method, 0)
}

/// Run the computation with an explicit blending convention.
///
/// `method`: `0` = stock, `1` = flux. `blending`: `0` = simple, `1` = compounded.
///
/// # Safety
/// `handle` must be null or a live handle not in use by another thread.
#[no_mangle]
pub unsafe extern "C" fn ftp_compute_with(handle: *mut FtpHandle, method: i32, blending: i32) -> i32 {
    status_of(guarded(|| {
        let h = handle_mut(handle)?;
        let method = Method::from_selector(method)?;
        let blending = RateBlending::from_selector(blending)?;
        let config = EngineConfig {
            blending,
            ..*h.inner.config()
        };
        h.inner.set_config(config);
        h.inner.compute(method)
    }))
}

// ---------------------------------------------------------------------------
// Dimension query
// ---------------------------------------------------------------------------

/// Write the result dimensions `(rows, cols)` = `(n, m-1)`.
///
/// Fails with the not-computed status until a compute has succeeded.
///
/// # Safety
/// `out_rows` and `out_cols` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn ftp_get_dims(
    handle: *const FtpHandle,
    out_rows: *mut usize,
    out_cols: *mut usize,
) -> i32 {
    status_of(guarded(|| {
        let h = handle_ref(handle)?;
        if out_rows.is_null() {
            return Err(FtpError::NullArgument("out_rows"));
        }
        if out_cols.is_null() {
            return Err(FtpError::NullArgument("out_cols"));
        }
        let (rows, cols) = h.inner.dims()?;
        *out_rows = rows;
        *out_cols = cols;
        Ok(())
    }))
}

// ---------------------------------------------------------------------------
// Getters: copy a result matrix into a caller-provided buffer
// ---------------------------------------------------------------------------

/// Shared body of the output getters; never writes on failure
///
/// # Safety
/// `out_buf` must be null or point to `buf_len` writable doubles.
unsafe fn copy_output(handle: *const FtpHandle, kind: OutputKind, out_buf: *mut f64, buf_len: usize) -> i32 {
    status_of(guarded(|| {
        let h = handle_ref(handle)?;
        if out_buf.is_null() {
            return Err(FtpError::NullArgument("out_buf"));
        }
        let dst = slice::from_raw_parts_mut(out_buf, buf_len);
        h.inner.copy_output(kind, dst).map(|_| ())
    }))
}

/// Copy output number `index` (canonical order: stock_amort, stock_instal,
/// varstock_amort, varstock_instal, ftp_rate, ftp_int, market_rate).
///
/// # Safety
/// `out_buf` must be null or point to `buf_len` writable doubles.
#[no_mangle]
pub unsafe extern "C" fn ftp_get_output(
    handle: *const FtpHandle,
    index: usize,
    out_buf: *mut f64,
    buf_len: usize,
) -> i32 {
    match OutputKind::from_index(index) {
        Some(kind) => copy_output(handle, kind, out_buf, buf_len),
        None => status_of(guarded(|| {
            Err(FtpError::InvalidMethod(format!("unknown output index {index} (expected 0..=6)")))
        })),
    }
}

/// Copy `stock_amort` into `out_buf`.
///
/// # Safety
/// `out_buf` must be null or point to `buf_len` writable doubles.
#[no_mangle]
pub unsafe extern "C" fn ftp_get_stock_amort(handle: *const FtpHandle, out_buf: *mut f64, buf_len: usize) -> i32 {
    copy_output(handle, OutputKind::StockAmort, out_buf, buf_len)
}

/// Copy `stock_instal` into `out_buf`.
///
/// # Safety
/// `out_buf` must be null or point to `buf_len` writable doubles.
#[no_mangle]
pub unsafe extern "C" fn ftp_get_stock_instal(handle: *const FtpHandle, out_buf: *mut f64, buf_len: usize) -> i32 {
    copy_output(handle, OutputKind::StockInstal, out_buf, buf_len)
}

/// Copy `varstock_amort` into `out_buf`.
///
/// # Safety
/// `out_buf` must be null or point to `buf_len` writable doubles.
#[no_mangle]
pub unsafe extern "C" fn ftp_get_varstock_amort(handle: *const FtpHandle, out_buf: *mut f64, buf_len: usize) -> i32 {
    copy_output(handle, OutputKind::VarstockAmort, out_buf, buf_len)
}

/// Copy `varstock_instal` into `out_buf`.
///
/// # Safety
/// `out_buf` must be null or point to `buf_len` writable doubles.
#[no_mangle]
pub unsafe extern "C" fn ftp_get_varstock_instal(handle: *const FtpHandle, out_buf: *mut f64, buf_len: usize) -> i32 {
    copy_output(handle, OutputKind::VarstockInstal, out_buf, buf_len)
}

/// Copy `ftp_rate` into `out_buf`.
///
/// # Safety
/// `out_buf` must be null or point to `buf_len` writable doubles.
#[no_mangle]
pub unsafe extern "C" fn ftp_get_ftp_rate(handle: *const FtpHandle, out_buf: *mut f64, buf_len: usize) -> i32 {
    copy_output(handle, OutputKind::FtpRate, out_buf, buf_len)
}

/// Copy `ftp_int` into `out_buf`.
///
/// # Safety
/// `out_buf` must be null or point to `buf_len` writable doubles.
#[no_mangle]
pub unsafe extern "C" fn ftp_get_ftp_int(handle: *const FtpHandle, out_buf: *mut f64, buf_len: usize) -> i32 {
    copy_output(handle, OutputKind::FtpInt, out_buf, buf_len)
}

/// Copy `market_rate` into `out_buf`.
///
/// # Safety
/// `out_buf` must be null or point to `buf_len` writable doubles.
#[no_mangle]
pub unsafe extern "C" fn ftp_get_market_rate(handle: *const FtpHandle, out_buf: *mut f64, buf_len: usize) -> i32 {
    copy_output(handle, OutputKind::MarketRate, out_buf, buf_len)
}

// ---------------------------------------------------------------------------
// Error reporting
// ---------------------------------------------------------------------------

/// Copy the calling thread's last error into `buf` (NUL-terminated).
///
/// Returns `0` when the whole message fit. When `buf` is too small the
/// message is truncated to `buf_len - 1` bytes, still terminated, and the
/// buffer-too-small status is returned. An empty string means no error.
///
/// # Safety
/// `buf` must be null or point to `buf_len` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn ftp_get_last_error(buf: *mut c_char, buf_len: usize) -> i32 {
    if buf.is_null() {
        return FtpError::NullArgument("buf").status();
    }
    let needed = last_error_len() + 1;
    if buf_len == 0 {
        return FtpError::BufferTooSmall { needed, got: 0 }.status();
    }
    let dst = slice::from_raw_parts_mut(buf.cast::<u8>(), buf_len);
    if copy_last_error(dst) {
        STATUS_OK
    } else {
        FtpError::BufferTooSmall { needed, got: buf_len }.status()
    }
}

/// Byte length of the last error message, excluding the NUL terminator
#[no_mangle]
pub extern "C" fn ftp_last_error_length() -> usize {
    last_error_len()
}

/// Clear the calling thread's last error
#[no_mangle]
pub extern "C" fn ftp_clear_last_error() {
    clear_last_error();
}

/// Write the library version into `buf` and return its full byte length.
///
/// The copy is truncated and NUL-terminated when `buf_len` is too small.
///
/// # Safety
/// `buf` must be null or point to `buf_len` writable bytes.
#[no_mangle]
pub unsafe extern "C" fn ftp_version(buf: *mut c_char, buf_len: usize) -> usize {
    let version = env!("CARGO_PKG_VERSION").as_bytes();
    if !buf.is_null() && buf_len > 0 {
        let copy_len = version.len().min(buf_len - 1);
        ptr::copy_nonoverlapping(version.as_ptr().cast::<c_char>(), buf, copy_len);
        *buf.add(copy_len) = 0;
    }
    version.len()
}
