//! C-ABI wrapper around `httpfast-core`.
//!
//! # Overview
//! Exposes the HTTP client through `extern "C"` functions so any language
//! with a C FFI can issue requests over the same connection-reusing client
//! without touching Rust types.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - One function per verb mirrors the core client 1:1. Request bodies are
//!   passed as JSON text and validated before anything is sent.
//! - A single `FfiHttpResult` envelope carries either the response or an
//!   error code plus message.
//! - The C caller owns every returned pointer and releases it with the
//!   matching `httpfast_*_free` function.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use httpfast_core::{ClientConfig, HttpError, HttpFastClient, HttpMethod};
use log::warn;

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new client configured from the `HTTPFAST_*` environment variables.
///
/// Returns null if `HTTPFAST_READ_CHUNK_SIZE` or `HTTPFAST_RETRY_STALE` holds
/// an invalid value (the reason is logged at warn level), or if an internal
/// panic occurs. The caller must free the returned pointer with
/// `httpfast_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn httpfast_client_new() -> *mut FfiHttpClient {
    catch_unwind(|| client_from_config(ClientConfig::from_env())).unwrap_or(std::ptr::null_mut())
}

fn client_from_config(config: Result<ClientConfig, HttpError>) -> *mut FfiHttpClient {
    match config {
        Ok(config) => Box::into_raw(Box::new(FfiHttpClient {
            inner: HttpFastClient::with_config(config),
        })),
        Err(e) => {
            warn!("httpfast_client_new: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Close every connection held by `client`. The client stays usable and
/// reconnects on the next request. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn httpfast_client_close(client: *mut FfiHttpClient) {
    if client.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let client = unsafe { &mut *client };
        client.inner.close();
    }));
}

/// Free a client created by `httpfast_client_new`, closing its connections.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn httpfast_client_free(client: *mut FfiHttpClient) {
    if !client.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(client) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Send a `GET` request to `url`.
///
/// The caller must free the returned result with `httpfast_free_result`.
#[unsafe(no_mangle)]
pub extern "C" fn httpfast_get(client: *mut FfiHttpClient, url: *const c_char) -> *mut FfiHttpResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiHttpResult::null_arg("client");
        }
        let url = match read_str(url, "url") {
            Ok(url) => url,
            Err(result) => return result,
        };
        let client = unsafe { &mut *client };
        match client.inner.get(url) {
            Ok(response) => FfiHttpResult::ok(response),
            Err(e) => FfiHttpResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiHttpResult::panic("panic in httpfast_get"))
}

/// Send a `POST` request to `url` with `json_body` (JSON text) as the body.
#[unsafe(no_mangle)]
pub extern "C" fn httpfast_post(
    client: *mut FfiHttpClient,
    url: *const c_char,
    json_body: *const c_char,
) -> *mut FfiHttpResult {
    send_json(HttpMethod::Post, client, url, json_body)
}

/// Send a `PUT` request to `url` with `json_body` (JSON text) as the body.
#[unsafe(no_mangle)]
pub extern "C" fn httpfast_put(
    client: *mut FfiHttpClient,
    url: *const c_char,
    json_body: *const c_char,
) -> *mut FfiHttpResult {
    send_json(HttpMethod::Put, client, url, json_body)
}

/// Send a `PATCH` request to `url` with `json_body` (JSON text) as the body.
#[unsafe(no_mangle)]
pub extern "C" fn httpfast_patch(
    client: *mut FfiHttpClient,
    url: *const c_char,
    json_body: *const c_char,
) -> *mut FfiHttpResult {
    send_json(HttpMethod::Patch, client, url, json_body)
}

/// Send a `DELETE` request to `url` with `json_body` (JSON text) as the body.
#[unsafe(no_mangle)]
pub extern "C" fn httpfast_delete(
    client: *mut FfiHttpClient,
    url: *const c_char,
    json_body: *const c_char,
) -> *mut FfiHttpResult {
    send_json(HttpMethod::Delete, client, url, json_body)
}

fn send_json(
    method: HttpMethod,
    client: *mut FfiHttpClient,
    url: *const c_char,
    json_body: *const c_char,
) -> *mut FfiHttpResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiHttpResult::null_arg("client");
        }
        let url = match read_str(url, "url") {
            Ok(url) => url,
            Err(result) => return result,
        };
        let body = match read_str(json_body, "json_body") {
            Ok(body) => body,
            Err(result) => return result,
        };
        let data: serde_json::Value = match serde_json::from_str(body) {
            Ok(data) => data,
            Err(e) => return FfiHttpResult::error(FfiErrorCode::InvalidJson, &e.to_string()),
        };
        let client = unsafe { &mut *client };
        match client.inner.request(method, url, Some(&data)) {
            Ok(response) => FfiHttpResult::ok(response),
            Err(e) => FfiHttpResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiHttpResult::panic(&format!("panic in httpfast_{}", method.as_str().to_lowercase())))
}

/// Borrow a C string argument as UTF-8, or produce the error result for it.
fn read_str<'a>(ptr: *const c_char, name: &str) -> Result<&'a str, *mut FfiHttpResult> {
    if ptr.is_null() {
        return Err(FfiHttpResult::null_arg(name));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|e| FfiHttpResult::error(FfiErrorCode::InvalidUtf8, &format!("{name}: {e}")))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpResult` returned by any request function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn httpfast_free_result(result: *mut FfiHttpResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(AssertUnwindSafe(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.headers.is_null() {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    result.headers,
                    result.headers_len as usize,
                ))
            };
            for h in headers.iter() {
                if !h.key.is_null() {
                    drop(unsafe { CString::from_raw(h.key) });
                }
                if !h.value.is_null() {
                    drop(unsafe { CString::from_raw(h.value) });
                }
            }
        }
        if !result.body.is_null() {
            drop(unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(result.body, result.body_len))
            });
        }
    }));
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
