pub mod engine;
pub mod ffi;
pub mod frontend;
pub mod sim {
    pub mod config;
    pub mod log;
    pub mod stats;
}
pub mod timeq;
pub mod traffic;
pub mod ui;
