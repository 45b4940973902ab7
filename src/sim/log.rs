//! Logger setup and the small logging shim exported to foreign callers.

use env_logger::Builder;
use log::{debug, error, info, LevelFilter};

pub fn to_level_filter(ulevel: u64) -> LevelFilter {
    match ulevel {
        0 => LevelFilter::Error,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Install the global logger at `level`; `RUST_LOG` still wins per module. Calling this more than
/// once is harmless.
pub fn init_logger_at(level: LevelFilter) {
    let _ = Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}

pub fn init_logger() {
    init_logger_at(LevelFilter::Info);
}

pub fn rdebug(msg: &str) {
    debug!("{}", msg);
}

pub fn rinfo(msg: &str) {
    info!("{}", msg);
}

pub fn rerror(msg: &str) {
    error!("{}", msg);
}

pub fn rdebug_with_target(target: &str, msg: &str) {
    debug!(target: target, "{}", msg);
}

pub fn rinfo_with_target(target: &str, msg: &str) {
    info!(target: target, "{}", msg);
}

pub fn rerror_with_target(target: &str, msg: &str) {
    error!(target: target, "{}", msg);
}
