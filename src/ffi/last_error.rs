//! Per-thread most-recent error message
//!
//! Foreign callers cannot catch Rust errors, so every fallible boundary call
//! records its outcome here: success clears the slot, failure replaces it.

use std::cell::RefCell;

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

pub(crate) fn set_last_error(message: impl Into<String>) {
    let message = message.into();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(message));
}

pub(crate) fn clear_last_error() {
    LAST_ERROR.with(|slot| *slot.borrow_mut() = None);
}

/// Copy of the calling thread's last error, if any
pub fn last_error() -> Option<String> {
    LAST_ERROR.with(|slot| slot.borrow().clone())
}

/// Byte length of the last error message (0 when none)
pub(crate) fn last_error_len() -> usize {
    LAST_ERROR.with(|slot| slot.borrow().as_ref().map_or(0, String::len))
}

/// Copy the message into `dst` with a trailing NUL.
///
/// Returns `true` when the whole message fit. On truncation the first
/// `dst.len() - 1` bytes are copied and still NUL-terminated. `dst` must not
/// be empty.
pub(crate) fn copy_last_error(dst: &mut [u8]) -> bool {
    debug_assert!(!dst.is_empty());
    LAST_ERROR.with(|slot| {
        let slot = slot.borrow();
        let bytes = slot.as_deref().unwrap_or("").as_bytes();
        let max = dst.len() - 1;
        let copy_len = bytes.len().min(max);
        dst[..copy_len].copy_from_slice(&bytes[..copy_len]);
        dst[copy_len] = 0;
        bytes.len() <= max
    })
}
