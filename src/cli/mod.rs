//! Command-line parsing for the standard curve tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::DEFAULT_BEVERAGE;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "stdcurve",
    version,
    about = "Spectrophotometric standard curve and dilution calculator"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the standard curve, estimate unknowns and print the results.
    Analyze(AnalyzeArgs),
    /// Write starter `standards.csv` and `unknowns.csv` files.
    Template(TemplateArgs),
    /// Launch the interactive TUI.
    ///
    /// Every edit re-runs the same pipeline as `stdcurve analyze`.
    Tui(SessionArgs),
}

/// Inputs shared by `analyze` and `tui`.
#[derive(Debug, Args, Clone)]
pub struct SessionArgs {
    /// Calibration standards CSV (`concentration`, `absorbance`). Defaults to the glucose standards.
    #[arg(short = 's', long, value_name = "CSV", env = "STDCURVE_STANDARDS")]
    pub standards: Option<PathBuf>,

    /// Unknown-sample CSV (`label`, `absorbance`). Defaults to blank 1:1, 1:5, 1:10, Other rows.
    #[arg(short = 'u', long, value_name = "CSV", env = "STDCURVE_UNKNOWNS")]
    pub unknowns: Option<PathBuf>,

    /// Lower concentration bound of the fit range (mg/mL). Defaults to the lowest standard.
    #[arg(long, allow_negative_numbers = true)]
    pub range_start: Option<f64>,

    /// Upper concentration bound of the fit range (mg/mL). Defaults to the highest standard.
    #[arg(long, allow_negative_numbers = true)]
    pub range_end: Option<f64>,

    /// Name of the beverage being analyzed.
    #[arg(short = 'b', long, env = "STDCURVE_BEVERAGE", default_value = DEFAULT_BEVERAGE)]
    pub beverage: String,

    /// Estimated concentration (mg/mL) to correct for dilution.
    #[arg(long, allow_negative_numbers = true)]
    pub estimate: Option<f64>,

    /// Dilution factor applied to the sample.
    #[arg(long, default_value_t = 1.0)]
    pub dilution_factor: f64,
}

/// Options for `analyze`.
#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the report (CSV blocks) to this file.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export a JSON snapshot of the session.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

/// Options for `template`.
#[derive(Debug, Args, Clone)]
pub struct TemplateArgs {
    /// Directory to write the templates into.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Overwrite existing files.
    #[arg(long)]
    pub force: bool,
}
