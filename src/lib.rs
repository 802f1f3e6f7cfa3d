//! `std-curve` library crate.
//!
//! The binary (`stdcurve`) is a thin wrapper around this library so that:
//!
//! - the fit/estimate/dilution chain is testable without spawning processes
//! - the CLI and the TUI share one session pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod estimate;
pub mod fit;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod tui;
