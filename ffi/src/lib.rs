//! C-ABI wrapper around `pca-core`'s `PanelSession`.
//!
//! # Overview
//! Lets the Android app (or any host with a C FFI) drive a panel session
//! without linking Rust's async runtime or serde directly. The host creates
//! one session at startup and passes the handle into every call.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Calls block the calling thread until the panel answers. Each session
//!   owns a small tokio runtime, and the host invokes calls from a worker
//!   thread, never the UI thread.
//! - A single `FfiPcaResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - The C caller owns all returned pointers and must release results with
//!   `pca_free_result` and sessions with `pca_session_free`.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use pca_core::{ClientConfig, PanelError, PanelSession, ZoneStates};
use tracing::error;

use types::*;

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

/// Create a session for the panel at `base_url`.
///
/// A bare `host[:port]` is treated as `https://host[:port]`. Pass
/// `insecure_tls = true` only for panels with self-signed certificates.
/// Returns null if `base_url` is null, not valid UTF-8, not a usable URL, or
/// if the runtime cannot be started. Free with `pca_session_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pca_session_new(base_url: *const c_char, insecure_tls: bool) -> *mut FfiPcaSession {
    catch_unwind(|| {
        if base_url.is_null() {
            return std::ptr::null_mut();
        }
        let Ok(url) = unsafe { CStr::from_ptr(base_url) }.to_str() else {
            return std::ptr::null_mut();
        };
        let config = match ClientConfig::builder().base_url(url).insecure_tls(insecure_tls).build() {
            Ok(config) => config,
            Err(e) => {
                error!("rejected session config: {e}");
                return std::ptr::null_mut();
            }
        };
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("pca-ffi")
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("failed to start session runtime: {e}");
                return std::ptr::null_mut();
            }
        };
        let inner = PanelSession::new(&config);
        Box::into_raw(Box::new(FfiPcaSession { runtime, inner }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a session created by `pca_session_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pca_session_free(session: *mut FfiPcaSession) {
    if !session.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            drop(unsafe { Box::from_raw(session) });
        }));
    }
}

// ---------------------------------------------------------------------------
// Session calls
// ---------------------------------------------------------------------------

/// Run `op` against the session behind `session` and wrap its body.
fn text_call(
    session: *const FfiPcaSession,
    op_name: &str,
    op: impl FnOnce(&FfiPcaSession) -> Result<String, PanelError>,
) -> *mut FfiPcaResult {
    catch_unwind(AssertUnwindSafe(|| {
        if session.is_null() {
            return FfiPcaResult::null_arg("session");
        }
        let session = unsafe { &*session };
        match op(session) {
            Ok(body) => FfiPcaResult::ok_text(body),
            Err(e) => FfiPcaResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiPcaResult::panic(&format!("panic in {op_name}")))
}

/// GET the landing page and capture the session cookie.
///
/// Returns a result with `data_tag = Text` (the page body) on success.
#[unsafe(no_mangle)]
pub extern "C" fn pca_fetch_home(session: *const FfiPcaSession) -> *mut FfiPcaResult {
    text_call(session, "pca_fetch_home", |s| s.runtime.block_on(s.inner.fetch_home()))
}

/// GET `/zones`. Returns the raw JSON body as `Text`; use `pca_zone_names`
/// for the parsed names.
#[unsafe(no_mangle)]
pub extern "C" fn pca_fetch_zones(session: *const FfiPcaSession) -> *mut FfiPcaResult {
    text_call(session, "pca_fetch_zones", |s| s.runtime.block_on(s.inner.fetch_zones()))
}

/// Zone names from the last successful `pca_fetch_zones`.
///
/// Returns a result with `data_tag = ZoneList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn pca_zone_names(session: *const FfiPcaSession) -> *mut FfiPcaResult {
    catch_unwind(AssertUnwindSafe(|| {
        if session.is_null() {
            return FfiPcaResult::null_arg("session");
        }
        let session = unsafe { &*session };
        match session.runtime.block_on(session.inner.zone_names()) {
            Ok(zones) => FfiPcaResult::ok_zone_list(zones),
            Err(e) => FfiPcaResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiPcaResult::panic("panic in pca_zone_names"))
}

/// POST `password` to `/login`.
#[unsafe(no_mangle)]
pub extern "C" fn pca_login(session: *const FfiPcaSession, password: *const c_char) -> *mut FfiPcaResult {
    if password.is_null() {
        return FfiPcaResult::null_arg("password");
    }
    let Ok(password) = unsafe { CStr::from_ptr(password) }.to_str() else {
        return FfiPcaResult::invalid_arg("password");
    };
    text_call(session, "pca_login", |s| s.runtime.block_on(s.inner.login(password)))
}

/// GET `/control`.
#[unsafe(no_mangle)]
pub extern "C" fn pca_fetch_control_page(session: *const FfiPcaSession) -> *mut FfiPcaResult {
    text_call(session, "pca_fetch_control_page", |s| {
        s.runtime.block_on(s.inner.fetch_control_page())
    })
}

/// Start the PCA system.
///
/// `names` and `states` are parallel arrays of `len` entries: `states[i]`
/// is the flag for zone `names[i]`. Both may be null when `len` is 0.
#[unsafe(no_mangle)]
pub extern "C" fn pca_start_zones(
    session: *const FfiPcaSession,
    names: *const *const c_char,
    states: *const bool,
    len: u32,
) -> *mut FfiPcaResult {
    let zones = match zone_states_from_raw(names, states, len) {
        Ok(zones) => zones,
        Err(result) => return result,
    };
    text_call(session, "pca_start_zones", |s| s.runtime.block_on(s.inner.start_zones(&zones)))
}

/// Stop the PCA system.
#[unsafe(no_mangle)]
pub extern "C" fn pca_stop_zones(session: *const FfiPcaSession) -> *mut FfiPcaResult {
    text_call(session, "pca_stop_zones", |s| s.runtime.block_on(s.inner.stop_zones()))
}

fn zone_states_from_raw(
    names: *const *const c_char,
    states: *const bool,
    len: u32,
) -> Result<ZoneStates, *mut FfiPcaResult> {
    if len == 0 {
        return Ok(ZoneStates::new());
    }
    if names.is_null() {
        return Err(FfiPcaResult::null_arg("names"));
    }
    if states.is_null() {
        return Err(FfiPcaResult::null_arg("states"));
    }
    let names = unsafe { std::slice::from_raw_parts(names, len as usize) };
    let flags = unsafe { std::slice::from_raw_parts(states, len as usize) };

    let mut zones = ZoneStates::new();
    for (name, on) in names.iter().zip(flags) {
        if name.is_null() {
            return Err(FfiPcaResult::null_arg("names[i]"));
        }
        let Ok(name) = unsafe { CStr::from_ptr(*name) }.to_str() else {
            return Err(FfiPcaResult::invalid_arg("names[i]"));
        };
        zones.set(name, *on);
    }
    Ok(zones)
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiPcaResult` returned by any session call. Safe to call with
/// null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn pca_free_result(result: *mut FfiPcaResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        if !result.error_message.is_null() {
            drop(unsafe { CString::from_raw(result.error_message) });
        }
        if !result.data.is_null() {
            match result.data_tag {
                FfiDataTag::Text => {
                    drop(unsafe { CString::from_raw(result.data as *mut c_char) });
                }
                FfiDataTag::ZoneList => {
                    let list = unsafe { Box::from_raw(result.data as *mut FfiZoneList) };
                    if !list.names.is_null() && list.len > 0 {
                        let names = unsafe {
                            Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                                list.names,
                                list.len as usize,
                            ))
                        };
                        for name in names.iter().copied() {
                            if !name.is_null() {
                                drop(unsafe { CString::from_raw(name) });
                            }
                        }
                    }
                }
                FfiDataTag::None => {}
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn new_session(url: &str) -> *mut FfiPcaSession {
        let url = CString::new(url).unwrap();
        pca_session_new(url.as_ptr(), false)
    }

    #[test]
    fn session_new_and_free() {
        let session = new_session("http://localhost:8888");
        assert!(!session.is_null());
        pca_session_free(session);
    }

    #[test]
    fn session_new_null_returns_null() {
        assert!(pca_session_new(std::ptr::null(), false).is_null());
    }

    #[test]
    fn session_new_bad_scheme_returns_null() {
        assert!(new_session("ftp://panel").is_null());
    }

    #[test]
    fn session_free_null_is_safe() {
        pca_session_free(std::ptr::null_mut());
    }

    #[test]
    fn null_session_returns_null_arg() {
        let result = pca_fetch_home(std::ptr::null());
        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::NullArg));
        let msg = unsafe { CStr::from_ptr(r.error_message) }.to_str().unwrap();
        assert_eq!(msg, "null argument: session");
        pca_free_result(result);
    }

    #[test]
    fn login_null_password_returns_null_arg() {
        let session = new_session("http://localhost:8888");
        let result = pca_login(session, std::ptr::null());
        assert!(matches!(unsafe { &*result }.error_code, FfiErrorCode::NullArg));
        pca_free_result(result);
        pca_session_free(session);
    }

    #[test]
    fn zone_names_before_fetch_is_protocol_error() {
        let session = new_session("http://localhost:8888");
        let result = pca_zone_names(session);
        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::Protocol));
        assert!(r.data.is_null());
        pca_free_result(result);
        pca_session_free(session);
    }

    #[test]
    fn stop_before_home_is_auth_error() {
        let session = new_session("http://localhost:8888");
        let result = pca_stop_zones(session);
        assert!(matches!(unsafe { &*result }.error_code, FfiErrorCode::Auth));
        pca_free_result(result);
        pca_session_free(session);
    }

    #[test]
    fn start_with_null_names_returns_null_arg() {
        let session = new_session("http://localhost:8888");
        let states = [true];
        let result = pca_start_zones(session, std::ptr::null(), states.as_ptr(), 1);
        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::NullArg));
        pca_free_result(result);
        pca_session_free(session);
    }

    #[test]
    fn zone_states_pair_by_index_into_names() {
        let front = CString::new("front").unwrap();
        let back = CString::new("back yard").unwrap();
        let names = [front.as_ptr(), back.as_ptr()];
        let flags = [false, true];
        let zones = zone_states_from_raw(names.as_ptr(), flags.as_ptr(), 2).unwrap();
        assert_eq!(zones.get("front"), Some(false));
        assert_eq!(zones.get("back yard"), Some(true));
    }

    #[test]
    fn ok_text_round_trips_through_free() {
        let result = FfiPcaResult::ok_text("body".to_string());
        let r = unsafe { &*result };
        assert!(matches!(r.data_tag, FfiDataTag::Text));
        let body = unsafe { CStr::from_ptr(r.data as *const c_char) }.to_str().unwrap();
        assert_eq!(body, "body");
        pca_free_result(result);
    }

    #[test]
    fn ok_zone_list_exposes_sorted_names() {
        let zones: pca_core::ZoneSet = ["front", "back"].into_iter().collect();
        let result = FfiPcaResult::ok_zone_list(zones);
        let list = unsafe { &*((*result).data as *const FfiZoneList) };
        assert_eq!(list.len, 2);
        let first = unsafe { CStr::from_ptr(*list.names) }.to_str().unwrap();
        assert_eq!(first, "back");
        pca_free_result(result);
    }

    #[test]
    fn error_result_carries_status() {
        let result = FfiPcaResult::from_error(PanelError::Unauthorized {
            status: 401,
            body: "invalid password".to_string(),
        });
        let r = unsafe { &*result };
        assert!(matches!(r.error_code, FfiErrorCode::Auth));
        assert_eq!(r.http_status, 401);
        pca_free_result(result);
    }

    #[test]
    fn interior_nul_is_stripped() {
        let ptr = types::to_c_string("a\0b".to_string());
        let s = unsafe { CString::from_raw(ptr) };
        assert_eq!(s.to_str().unwrap(), "ab");
    }

    #[test]
    fn free_result_null_is_safe() {
        pca_free_result(std::ptr::null_mut());
    }
}
