//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointer + length instead of `Vec`,
//! and tagged enums with explicit discriminants. Conversion functions live
//! here to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use pca_core::{ErrorKind, PanelError, PanelSession, ZoneSet};

/// Opaque handle to a `PanelSession` and the runtime that drives it. C
/// callers receive a pointer to this and pass it back into every call.
pub struct FfiPcaSession {
    pub(crate) runtime: tokio::runtime::Runtime,
    pub(crate) inner: PanelSession,
}

/// Error codes returned in `FfiPcaResult`.
#[repr(C)]
#[derive(Debug)]
pub enum FfiErrorCode {
    Ok = 0,
    Transport = 1,
    Timeout = 2,
    Auth = 3,
    Protocol = 4,
    Http = 5,
    Config = 6,
    Panic = 7,
    NullArg = 8,
    InvalidArg = 9,
}

/// Tag that tells `pca_free_result` what `FfiPcaResult::data` points to.
#[repr(C)]
#[derive(Debug)]
pub enum FfiDataTag {
    None = 0,
    /// `data` is a NUL-terminated response body (`char*`).
    Text = 1,
    /// `data` is an `FfiZoneList*`.
    ZoneList = 2,
}

/// Zone names exposed to C, sorted.
#[repr(C)]
pub struct FfiZoneList {
    pub names: *mut *mut c_char,
    pub len: u32,
}

/// Result envelope for every session call.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the payload tagged by `data_tag`. On failure `error_code`
/// describes the category, `error_message` is a human-readable C string,
/// `http_status` is set when the panel answered, and `data` is null.
#[repr(C)]
pub struct FfiPcaResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

/// Move `s` onto the C heap. Interior NULs are dropped rather than failing.
pub(crate) fn to_c_string(s: String) -> *mut c_char {
    let c = CString::new(s).unwrap_or_else(|e| {
        let mut bytes = e.into_vec();
        bytes.retain(|b| *b != 0);
        CString::new(bytes).unwrap_or_default()
    });
    c.into_raw()
}

impl FfiPcaResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: *mut c_char,
        http_status: u16,
        data_tag: FfiDataTag,
        data: *mut c_void,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiPcaResult {
            error_code,
            error_message,
            http_status,
            data_tag,
            data,
        }))
    }

    /// Build a success result carrying a response body.
    pub(crate) fn ok_text(body: String) -> *mut Self {
        Self::boxed(
            FfiErrorCode::Ok,
            std::ptr::null_mut(),
            0,
            FfiDataTag::Text,
            to_c_string(body) as *mut c_void,
        )
    }

    /// Build a success result carrying an `FfiZoneList`.
    pub(crate) fn ok_zone_list(zones: ZoneSet) -> *mut Self {
        let len = zones.len() as u32;
        let names: Box<[*mut c_char]> = zones.into_iter().map(to_c_string).collect();
        let names_ptr = if names.is_empty() {
            std::ptr::null_mut()
        } else {
            Box::into_raw(names) as *mut *mut c_char
        };
        let list = Box::new(FfiZoneList {
            names: names_ptr,
            len,
        });
        Self::boxed(
            FfiErrorCode::Ok,
            std::ptr::null_mut(),
            0,
            FfiDataTag::ZoneList,
            Box::into_raw(list) as *mut c_void,
        )
    }

    /// Build an error result from a `PanelError`.
    pub(crate) fn from_error(err: PanelError) -> *mut Self {
        let error_code = match (&err, err.kind()) {
            (PanelError::Timeout { .. }, _) => FfiErrorCode::Timeout,
            (_, ErrorKind::Transport) => FfiErrorCode::Transport,
            (_, ErrorKind::Auth) => FfiErrorCode::Auth,
            (_, ErrorKind::Protocol) => FfiErrorCode::Protocol,
            (_, ErrorKind::Http) => FfiErrorCode::Http,
            (_, ErrorKind::Config) => FfiErrorCode::Config,
        };
        let http_status = err.status().unwrap_or(0);
        Self::boxed(
            error_code,
            to_c_string(err.to_string()),
            http_status,
            FfiDataTag::None,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, format!("null argument: {name}"))
    }

    /// Build an error result for an argument that is not valid UTF-8.
    pub(crate) fn invalid_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::InvalidArg, format!("invalid UTF-8 in argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, msg.to_string())
    }

    fn failure(code: FfiErrorCode, msg: String) -> *mut Self {
        Self::boxed(code, to_c_string(msg), 0, FfiDataTag::None, std::ptr::null_mut())
    }
}
