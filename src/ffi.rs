//! FFI interface for C/C++ callers
//!
//! The schema goes in as JSON and the extraction comes back as JSON, so the
//! only types crossing the boundary are C strings.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use crate::extractors::extract_html;
use crate::validator::validate;

/// Result struct returned to C/C++
/// Both pointers are owned by Rust and must be freed via free_extraction_result
#[repr(C)]
pub struct ExtractionResultFFI {
    /// JSON `{"record": {...}, "errors": [...]}` (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if extraction could not start (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Apply a JSON selector schema to an HTML page.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `schema_json` - JSON selector mapping (null-terminated)
///
/// # Returns
/// ExtractionResultFFI with json_ptr set when the schema was valid (individual
/// field failures are listed under `errors`), or error_ptr set otherwise
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `schema_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_extraction_result`
#[no_mangle]
pub unsafe extern "C" fn extract_from_html(
    html_ptr: *const c_char,
    html_len: usize,
    schema_json: *const c_char,
) -> ExtractionResultFFI {
    let html = if html_ptr.is_null() || html_len == 0 {
        ""
    } else {
        let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
        match std::str::from_utf8(slice) {
            Ok(s) => s,
            Err(_) => return make_error_result("Invalid UTF-8 in HTML content"),
        }
    };

    if schema_json.is_null() {
        return make_error_result("Schema JSON is null");
    }
    let schema_str = match CStr::from_ptr(schema_json).to_str() {
        Ok(s) => s,
        Err(_) => return make_error_result("Invalid UTF-8 in schema JSON"),
    };

    let raw: serde_json::Value = match serde_json::from_str(schema_str) {
        Ok(v) => v,
        Err(e) => return make_error_result(&format!("Failed to parse schema JSON: {}", e)),
    };

    let schema = match validate(&raw) {
        Ok(schema) => schema,
        Err(e) => return make_error_result(&format!("Invalid schema: {}", e)),
    };

    let extraction = extract_html(html, &schema);

    match serde_json::to_string(&extraction) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ExtractionResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

/// Free an ExtractionResultFFI returned by extract_from_html
///
/// # Safety
/// - `result` must have been returned by `extract_from_html`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_extraction_result(result: ExtractionResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

fn make_error_result(msg: &str) -> ExtractionResultFFI {
    let error_ptr = CString::new(msg)
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut());
    ExtractionResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr,
    }
}
