//! Agent flow console.
//!
//! Hosts the stream-driven view controller and the two front ends that
//! drive it: an interactive terminal canvas and a headless runner that
//! prints transitions as plain text.

pub mod config;
pub mod console;
pub mod controller;
pub mod headless;

pub use config::{ConfigError, ConsoleConfig};
pub use console::run_console;
pub use controller::{LogCategory, LogEntry, RunOutcome, StreamController, PUMP_BUDGET};
pub use headless::run_headless;
