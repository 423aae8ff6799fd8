//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible fields: `*mut c_char`
//! for strings, pointer + length pairs for byte buffers and header lists.
//! Buffers are handed over as boxed slices so their length is also their
//! capacity when `httpfast_free_result` rebuilds them.

use std::ffi::CString;
use std::os::raw::c_char;

use httpfast_core::{HttpError, HttpFastClient, HttpResponse};

/// Opaque handle to an `HttpFastClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiHttpClient {
    pub(crate) inner: HttpFastClient,
}

/// Error codes returned in `FfiHttpResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NullArg = 1,
    InvalidUtf8 = 2,
    InvalidJson = 3,
    MalformedUrl = 4,
    UnsupportedScheme = 5,
    Connection = 6,
    TlsHandshake = 7,
    Protocol = 8,
    Decode = 9,
    Serialization = 10,
    Config = 11,
    Panic = 12,
}

/// A single response header as a pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// Result envelope for every request function.
///
/// On success `error_code` is `Ok`, `error_message` is null and the
/// response fields are filled in. `body` is raw bytes, not NUL-terminated;
/// it is null when `body_len` is 0. On failure `error_code` names the
/// category, `error_message` is a human-readable C string and every response
/// field is zero/null.
#[repr(C)]
pub struct FfiHttpResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub status: u16,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut u8,
    pub body_len: usize,
}

impl FfiHttpResult {
    /// Build a success result from a parsed response.
    pub(crate) fn ok(response: HttpResponse) -> *mut Self {
        let headers: Box<[FfiHeader]> = response
            .headers
            .iter()
            .map(|(name, value)| FfiHeader {
                key: c_string(name),
                value: c_string(value),
            })
            .collect();
        let headers_len = headers.len() as u32;
        let headers = if headers.is_empty() {
            std::ptr::null_mut()
        } else {
            Box::into_raw(headers) as *mut FfiHeader
        };

        let body_len = response.body.len();
        let body = if response.body.is_empty() {
            std::ptr::null_mut()
        } else {
            Box::into_raw(response.body.into_boxed_slice()) as *mut u8
        };

        Box::into_raw(Box::new(FfiHttpResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            status: response.status,
            headers,
            headers_len,
            body,
            body_len,
        }))
    }

    /// Build an error result from an `HttpError`.
    pub(crate) fn from_error(err: HttpError) -> *mut Self {
        let code = match &err {
            HttpError::MalformedUrl(_) => FfiErrorCode::MalformedUrl,
            HttpError::UnsupportedScheme(_) => FfiErrorCode::UnsupportedScheme,
            HttpError::Connection(_) => FfiErrorCode::Connection,
            HttpError::TlsHandshake { .. } => FfiErrorCode::TlsHandshake,
            HttpError::Protocol(_) => FfiErrorCode::Protocol,
            HttpError::Decode(_) => FfiErrorCode::Decode,
            HttpError::Serialization(_) => FfiErrorCode::Serialization,
            HttpError::Config(_) => FfiErrorCode::Config,
        };
        Self::error(code, &err.to_string())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::error(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::error(FfiErrorCode::Panic, msg)
    }

    pub(crate) fn error(code: FfiErrorCode, msg: &str) -> *mut Self {
        Box::into_raw(Box::new(FfiHttpResult {
            error_code: code,
            error_message: c_string(msg),
            status: 0,
            headers: std::ptr::null_mut(),
            headers_len: 0,
            body: std::ptr::null_mut(),
            body_len: 0,
        }))
    }
}

/// Heap C string; interior NUL bytes are dropped rather than failing.
pub(crate) fn c_string(s: &str) -> *mut c_char {
    CString::new(s.replace('\0', ""))
        .unwrap_or_default()
        .into_raw()
}
