//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - loads standards and unknown rows (CSV or defaults)
//! - runs the session pipeline
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, Command, SessionArgs, TemplateArgs};
use crate::domain::{DilutionInput, SessionConfig};
use crate::error::AppError;
use crate::io::ingest::RowError;

pub mod pipeline;

/// Environment variable holding the log filter (`tracing_subscriber::EnvFilter` syntax).
pub const LOG_ENV: &str = "STDCURVE_LOG";

/// Entry point for the `stdcurve` binary.
pub fn run() -> Result<(), AppError> {
    // `stdcurve` and `stdcurve -s std.csv` behave like `stdcurve tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    // The TUI owns the terminal; stray log lines would corrupt the screen.
    let default_filter = match cli.command {
        Command::Tui(_) => "off",
        _ => "warn",
    };
    init_tracing(default_filter);

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Template(args) => handle_template(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));
    // A second init (e.g. from a test harness) is not an error worth surfacing.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = session_config_from_analyze(&args);
    let loaded = pipeline::load_session(&config)?;
    report_row_errors("standards", &loaded.standards_errors);
    report_row_errors("unknowns", &loaded.unknowns_errors);

    let inputs = loaded.inputs;
    let output = pipeline::recompute(&inputs);

    println!(
        "{}",
        crate::report::format_fit_summary(&inputs.calibration, &inputs.range, &output.fit)
    );
    println!(
        "{}",
        crate::report::format_calibration_table(&inputs.calibration, &inputs.range)
    );
    println!(
        "{}",
        crate::report::format_estimates(&inputs.beverage, &output.estimates)
    );
    print!(
        "{}",
        crate::report::format_dilution(&output.dilution, &inputs.beverage)
    );

    if config.plot {
        let plot = crate::plot::render_ascii_plot(
            &inputs.calibration,
            &inputs.range,
            output.valid_fit(),
            config.plot_width,
            config.plot_height,
        );
        println!();
        println!("{plot}");
    }

    if config.export_report.is_none() && config.export_json.is_none() {
        return Ok(());
    }

    let generated_at = Some(chrono::Local::now().naive_local());
    if let Some(path) = &config.export_report {
        let report = pipeline::build_report(&inputs, &output, generated_at)?;
        crate::io::export::write_report(path, &report)?;
        println!("Report written to {}", path.display());
    }
    if let Some(path) = &config.export_json {
        let snapshot = crate::io::session::SessionSnapshot::new(&inputs, &output, generated_at);
        crate::io::session::write_session_json(path, &snapshot)?;
        println!("Session snapshot written to {}", path.display());
    }

    Ok(())
}

fn handle_template(args: TemplateArgs) -> Result<(), AppError> {
    let paths = crate::io::template::write_templates(&args.dir, args.force)?;
    println!("Wrote {}", paths.standards.display());
    println!("Wrote {}", paths.unknowns.display());
    Ok(())
}

fn handle_tui(args: SessionArgs) -> Result<(), AppError> {
    let config = session_config_from_args(&args);
    crate::tui::run(config)
}

fn report_row_errors(table: &str, errors: &[RowError]) {
    if errors.is_empty() {
        return;
    }
    eprintln!("Skipped {} {table} row(s):", errors.len());
    for e in errors.iter().take(10) {
        eprintln!("  line {}: {}", e.line, e.message);
    }
    if errors.len() > 10 {
        eprintln!("  ... and {} more", errors.len() - 10);
    }
}

/// Session inputs from the shared flags; output options keep their defaults.
pub fn session_config_from_args(args: &SessionArgs) -> SessionConfig {
    SessionConfig {
        standards_path: args.standards.clone(),
        unknowns_path: args.unknowns.clone(),
        range_start: args.range_start,
        range_end: args.range_end,
        beverage: args.beverage.clone(),
        dilution: DilutionInput {
            estimated_concentration: args.estimate,
            dilution_factor: Some(args.dilution_factor),
        },
        ..SessionConfig::default()
    }
}

pub fn session_config_from_analyze(args: &AnalyzeArgs) -> SessionConfig {
    SessionConfig {
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_report: args.export.clone(),
        export_json: args.export_json.clone(),
        ..session_config_from_args(&args.session)
    }
}

/// Rewrite argv so `stdcurve` defaults to `stdcurve tui`.
///
/// Rules:
/// - `stdcurve`                      -> `stdcurve tui`
/// - `stdcurve -s std.csv ...`       -> `stdcurve tui -s std.csv ...`
/// - `stdcurve --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "analyze" | "template" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_launches_tui() {
        assert_eq!(rewrite_args(argv(&["stdcurve"])), argv(&["stdcurve", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["stdcurve", "-s", "std.csv"])),
            argv(&["stdcurve", "tui", "-s", "std.csv"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for args in [
            argv(&["stdcurve", "analyze", "--no-plot"]),
            argv(&["stdcurve", "template"]),
            argv(&["stdcurve", "--help"]),
        ] {
            assert_eq!(rewrite_args(args.clone()), args);
        }
    }

    #[test]
    fn analyze_args_become_session_config() {
        let cli = crate::cli::Cli::parse_from([
            "stdcurve",
            "analyze",
            "--beverage",
            "Cola",
            "--estimate",
            "0.5",
            "--dilution-factor",
            "10",
            "--width",
            "40",
            "--export",
            "out.csv",
        ]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        let config = session_config_from_analyze(&args);
        assert_eq!(config.beverage, "Cola");
        assert_eq!(
            config.dilution,
            DilutionInput {
                estimated_concentration: Some(0.5),
                dilution_factor: Some(10.0),
            }
        );
        assert!(config.plot);
        assert_eq!(config.plot_width, 40);
        assert_eq!(config.export_report.as_deref(), Some(Path::new("out.csv")));
        assert!(config.export_json.is_none());
    }
}
