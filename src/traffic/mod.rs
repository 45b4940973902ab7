//! Synthetic workloads for driving a frontend from the command line.

pub mod config;
pub mod driver;
pub mod patterns;

pub use config::{PatternKind, TrafficConfig};
pub use driver::{run, TrafficOutcome};
pub use patterns::TrafficGenerator;
