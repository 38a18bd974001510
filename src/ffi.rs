//! FFI bindings for Folio Analytics
//!
//! This module provides C-compatible functions for calling the engine from
//! other languages. All functions take null-terminated JSON strings and return
//! allocated memory that must be freed by the caller using `folio_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::AnalyticsError;
use crate::pipeline::{daily_report_json, decode_heatmap_json, derived_metrics_json, z_scores_json};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Hand a pipeline result across the boundary, recording any error
fn finish(result: Result<String, AnalyticsError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Read a required string argument, recording an error when it is invalid
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {name} string pointer"));
    }
    value
}

/// Widen a C window argument; negative values become zero and are rejected downstream
fn window_arg(window_days: i32) -> usize {
    usize::try_from(window_days).unwrap_or(0)
}

/// Compute derived metrics for one day record.
///
/// # Safety
/// - `counters_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `folio_free_string`.
/// - Returns NULL on error; call `folio_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn folio_derived_metrics(counters_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(counters) = required_arg(counters_json, "counters JSON") else {
        return ptr::null_mut();
    };
    finish(derived_metrics_json(&counters))
}

/// Compute baseline z-scores for one day against a JSON array of history.
///
/// # Safety
/// - `current_json` and `history_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `folio_free_string`.
/// - Returns NULL on error, including a non-positive `window_days`.
#[no_mangle]
pub unsafe extern "C" fn folio_z_scores(
    current_json: *const c_char,
    history_json: *const c_char,
    window_days: i32,
) -> *mut c_char {
    clear_last_error();

    let Some(current) = required_arg(current_json, "current JSON") else {
        return ptr::null_mut();
    };
    let Some(history) = required_arg(history_json, "history JSON") else {
        return ptr::null_mut();
    };
    finish(z_scores_json(&current, &history, window_arg(window_days)))
}

/// Decode a sparse heatmap into a JSON array of cells.
///
/// # Safety
/// - `heatmap_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `folio_free_string`.
/// - Returns NULL on error; call `folio_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn folio_decode_heatmap(heatmap_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(heatmap) = required_arg(heatmap_json, "heatmap JSON") else {
        return ptr::null_mut();
    };
    finish(decode_heatmap_json(&heatmap))
}

/// Build the full daily report for one day.
///
/// # Safety
/// - `current_json` and `history_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `folio_free_string`.
/// - Returns NULL on error; call `folio_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn folio_daily_report(
    current_json: *const c_char,
    history_json: *const c_char,
    window_days: i32,
) -> *mut c_char {
    clear_last_error();

    let Some(current) = required_arg(current_json, "current JSON") else {
        return ptr::null_mut();
    };
    let Some(history) = required_arg(history_json, "history JSON") else {
        return ptr::null_mut();
    };
    finish(daily_report_json(&current, &history, window_arg(window_days)))
}

/// Free a string returned by any `folio_*` function.
///
/// # Safety
/// - `ptr` must be a pointer returned by a `folio_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn folio_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Get the last error message for the calling thread.
///
/// # Safety
/// - Returns a pointer owned by thread-local storage; do not free it.
/// - The pointer is valid until the next `folio_*` call on the same thread.
/// - Returns NULL if there was no error.
#[no_mangle]
pub unsafe extern "C" fn folio_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the engine version string.
///
/// # Safety
/// - Returns a pointer to a static string; do not free it.
#[no_mangle]
pub unsafe extern "C" fn folio_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
