//! FFI interface for host interop
//!
//! Exposes the splitter over a C ABI. Options go in and results come out as
//! JSON; the source text is passed as raw UTF-8 bytes.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use crate::extractors::{extract_code, ExtractionRequest};

/// Result struct returned to the host
/// Both pointers are owned by Rust and must be freed via free_split_result
#[repr(C)]
pub struct SplitResultFFI {
    /// JSON-serialized ExtractedResult (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if the call was rejected (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Split mixed source into markup, style, script and component text.
///
/// # Arguments
/// * `source_ptr` - Pointer to the source text (UTF-8, not necessarily null-terminated)
/// * `source_len` - Length of the source text in bytes
/// * `request_json` - JSON-serialized ExtractionRequest (null-terminated), or null for defaults
///
/// # Returns
/// SplitResultFFI with either json_ptr set (success) or error_ptr set (rejected input)
///
/// # Safety
/// - `source_ptr` must point to valid memory of at least `source_len` bytes
/// - `request_json` must be null or a valid null-terminated C string
/// - Caller must free the result via `free_split_result`
#[no_mangle]
pub unsafe extern "C" fn split_code(
    source_ptr: *const c_char,
    source_len: usize,
    request_json: *const c_char,
) -> SplitResultFFI {
    let source = if source_ptr.is_null() || source_len == 0 {
        ""
    } else {
        let slice = std::slice::from_raw_parts(source_ptr as *const u8, source_len);
        match std::str::from_utf8(slice) {
            Ok(s) => s,
            Err(_) => return make_error_result("Invalid UTF-8 in source"),
        }
    };

    // The engine assumes non-empty input; rejecting it is this layer's job
    if source.trim().is_empty() {
        return make_error_result("Please enter some code to extract.");
    }

    let request: ExtractionRequest = if request_json.is_null() {
        ExtractionRequest::default()
    } else {
        let request_str = match CStr::from_ptr(request_json).to_str() {
            Ok(s) => s,
            Err(_) => return make_error_result("Invalid UTF-8 in request JSON"),
        };
        match serde_json::from_str(request_str) {
            Ok(r) => r,
            Err(e) => {
                return make_error_result(&format!("Failed to parse request JSON: {}", e));
            }
        }
    };

    tracing::debug!(
        bytes = source.len(),
        component = request.is_component_source,
        "splitting source"
    );
    let result = extract_code(source, &request);

    match serde_json::to_string(&result) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => SplitResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

/// Free a SplitResultFFI returned by split_code
///
/// # Safety
/// - `result` must have been returned by `split_code`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_split_result(result: SplitResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

// Helper to create error result
fn make_error_result(msg: &str) -> SplitResultFFI {
    let error_cstr = CString::new(msg.replace('\0', "")).unwrap_or_default();
    SplitResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
