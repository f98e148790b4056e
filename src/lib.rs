//! `web-kpi` library crate.
//!
//! The binary (`kpi`) is a thin wrapper around this library so that:
//!
//! - metric math and report building are testable without spawning processes
//! - the CLI and the TUI share one pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod metrics;
pub mod plot;
pub mod report;
pub mod tui;

/// Where tables are read from (and `kpi generate` writes to) by default.
pub const DEFAULT_DATA_DIR: &str = "sample_data";
