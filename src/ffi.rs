//! C entry points. A handle is an owned [`MemoryFrontend`] behind a raw pointer; every
//! `memfront_create*` must be paired with exactly one `memfront_destroy`.
//!
//! Conditions the caller cannot recover from (unknown standard, engine protocol violation, popping
//! an empty completion queue, null handle) panic. A panic cannot unwind out of an `extern "C"`
//! function, so the process aborts with the message on stderr.

use std::ffi::CStr;
use std::path::PathBuf;

use libc::c_char;

use crate::frontend::{MemoryFrontend, RequestKind};
use crate::sim::config::FrontendConfig;
use crate::sim::log;

unsafe fn str_arg<'a>(ptr: *const c_char, what: &str) -> &'a str {
    assert!(!ptr.is_null(), "{} is null", what);
    CStr::from_ptr(ptr)
        .to_str()
        .unwrap_or_else(|_| panic!("{} is not valid UTF-8", what))
}

unsafe fn frontend<'a>(handle: *mut MemoryFrontend) -> &'a mut MemoryFrontend {
    handle.as_mut().expect("memfront handle is null")
}

fn into_handle(frontend: MemoryFrontend) -> *mut MemoryFrontend {
    Box::into_raw(Box::new(frontend))
}

/// Build a frontend for `standard_name`. `stats_path` may be null to keep the report in memory.
///
/// # Safety
/// `standard_name` must be a valid NUL-terminated string; `stats_path` must be one or null.
#[no_mangle]
pub unsafe extern "C" fn memfront_create(
    standard_name: *const c_char,
    cache_line_size: u32,
    stats_path: *const c_char,
) -> *mut MemoryFrontend {
    let stats_path =
        (!stats_path.is_null()).then(|| PathBuf::from(str_arg(stats_path, "stats_path")));
    let config = FrontendConfig {
        standard: str_arg(standard_name, "standard_name").to_string(),
        cache_line_size,
        stats_path,
        ..FrontendConfig::default()
    };
    match MemoryFrontend::new(&config) {
        Ok(frontend) => into_handle(frontend),
        Err(err) => panic!("memfront_create: {}", err),
    }
}

/// Build a frontend from the `[frontend]` and `[engine]` sections of a TOML file.
///
/// # Safety
/// `config_path` must be a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn memfront_create_from_config(
    config_path: *const c_char,
) -> *mut MemoryFrontend {
    let path = PathBuf::from(str_arg(config_path, "config_path"));
    let frontend =
        crate::ui::load_config(&path).and_then(|config| crate::ui::make_frontend(&config));
    match frontend {
        Ok(frontend) => into_handle(frontend),
        Err(err) => panic!("memfront_create_from_config: {:#}", err),
    }
}

/// # Safety
/// `handle` must come from `memfront_create*` and not have been destroyed.
#[no_mangle]
pub unsafe extern "C" fn memfront_submit(
    handle: *mut MemoryFrontend,
    address: u64,
    is_write: bool,
) {
    frontend(handle).submit(address, RequestKind::from_is_write(is_write));
}

/// # Safety
/// See [`memfront_submit`].
#[no_mangle]
pub unsafe extern "C" fn memfront_available(handle: *mut MemoryFrontend, address: u64) -> bool {
    frontend(handle).available(address)
}

/// # Safety
/// See [`memfront_submit`].
#[no_mangle]
pub unsafe extern "C" fn memfront_step(handle: *mut MemoryFrontend) {
    if let Err(err) = frontend(handle).step() {
        panic!("memfront_step: {}", err);
    }
}

/// # Safety
/// See [`memfront_submit`].
#[no_mangle]
pub unsafe extern "C" fn memfront_completion_ready(handle: *mut MemoryFrontend) -> bool {
    frontend(handle).completion_ready()
}

/// Oldest completed read address. The queue must not be empty.
///
/// # Safety
/// See [`memfront_submit`].
#[no_mangle]
pub unsafe extern "C" fn memfront_peek_completed(handle: *mut MemoryFrontend) -> u64 {
    frontend(handle)
        .peek_completed()
        .expect("memfront_peek_completed: completion queue is empty")
}

/// Remove and return the oldest completed read address. The queue must not be empty.
///
/// # Safety
/// See [`memfront_submit`].
#[no_mangle]
pub unsafe extern "C" fn memfront_pop_completed(handle: *mut MemoryFrontend) -> u64 {
    frontend(handle)
        .pop_completed()
        .expect("memfront_pop_completed: completion queue is empty")
}

/// # Safety
/// See [`memfront_submit`].
#[no_mangle]
pub unsafe extern "C" fn memfront_is_idle(handle: *mut MemoryFrontend) -> bool {
    frontend(handle).is_idle()
}

/// Write the final report and free the handle. Null is ignored.
///
/// # Safety
/// `handle` must be null or come from `memfront_create*`, and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn memfront_destroy(handle: *mut MemoryFrontend) {
    if handle.is_null() {
        return;
    }
    let frontend = *Box::from_raw(handle);
    if let Err(err) = frontend.shutdown() {
        ::log::error!("memfront_destroy: {}", err);
    }
}

#[no_mangle]
pub extern "C" fn memfront_init_logger() {
    log::init_logger();
}

macro_rules! log_shim {
    ($plain:ident, $targeted:ident, $rust:ident, $rust_targeted:ident) => {
        /// # Safety
        /// `msg` must be a valid NUL-terminated string.
        #[no_mangle]
        pub unsafe extern "C" fn $plain(msg: *const c_char) {
            log::$rust(str_arg(msg, "msg"));
        }

        /// # Safety
        /// `target` and `msg` must be valid NUL-terminated strings.
        #[no_mangle]
        pub unsafe extern "C" fn $targeted(target: *const c_char, msg: *const c_char) {
            log::$rust_targeted(str_arg(target, "target"), str_arg(msg, "msg"));
        }
    };
}

log_shim!(memfront_log_debug, memfront_log_debug_with_target, rdebug, rdebug_with_target);
log_shim!(memfront_log_info, memfront_log_info_with_target, rinfo, rinfo_with_target);
log_shim!(memfront_log_error, memfront_log_error_with_target, rerror, rerror_with_target);
