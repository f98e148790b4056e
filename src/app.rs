//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs logging
//! - parses CLI arguments
//! - loads the CSV tables
//! - prints page reports/charts
//! - writes optional exports

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{Cli, Command, GenerateArgs, SummaryArgs, ViewArgs};
use crate::data::sample::{GeneratorConfig, generate_sample, write_sample};
use crate::domain::DashboardConfig;
use crate::error::AppError;
use crate::io::Dataset;
use crate::logging::{LoggingConfig, init_logging};
use crate::report::{Page, render_text};

pub mod pipeline;

/// Entry point for the `kpi` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // We want `kpi` and `kpi --preset last30` to behave like `kpi tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    let mut logging = LoggingConfig::from_env();
    logging.quiet_stderr = matches!(cli.command, Command::Tui(_));
    init_logging(&logging)?;

    match cli.command {
        Command::Summary(args) => handle_summary(args),
        Command::Traffic(args) => handle_page(Page::Traffic, &config_from_args(&args)),
        Command::Conversion(args) => handle_page(Page::Conversion, &config_from_args(&args)),
        Command::Behavior(args) => handle_page(Page::Behavior, &config_from_args(&args)),
        Command::Tui(args) => crate::tui::run(config_from_args(&args)),
        Command::Generate(args) => handle_generate(args),
    }
}

fn load(config: &DashboardConfig) -> Dataset {
    let dataset = Dataset::load(&config.data_dir);
    for notice in dataset.notices() {
        eprintln!("note: {notice}");
    }
    dataset
}

fn handle_page(page: Page, config: &DashboardConfig) -> Result<(), AppError> {
    let dataset = load(config);
    let view = pipeline::build_page(page, &dataset, config)?;
    print!("{}", render_text(&view, &pipeline::plot_options(config)));
    Ok(())
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let mut config = config_from_args(&args.view);
    config.export_csv = args.export;
    config.export_json = args.json;

    let dataset = load(&config);
    let period = pipeline::resolve_period(&dataset, &config)?;
    let report = crate::report::summary::build_summary(&dataset, &period);
    let view = crate::report::summary::summary_view(&report);
    print!("{}", render_text(&view, &pipeline::plot_options(&config)));

    if let Some(path) = &config.export_csv {
        crate::io::write_summary_csv(path, &report)?;
        eprintln!("Wrote {}", path.display());
    }
    if let Some(path) = &config.export_json {
        crate::io::write_summary_json(path, &report)?;
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let config = GeneratorConfig {
        seed: args.seed,
        days: args.days,
        end_date: args.end_date,
    };
    let tables = generate_sample(&config)?;
    write_sample(&args.out, &tables)?;
    println!(
        "Wrote {} days of sample data ({} daily rows, {} page rows) to {}",
        config.days,
        tables.daily.len(),
        tables.pages.len(),
        args.out.display()
    );
    Ok(())
}

/// Flag > `KPI_DATA_DIR` > built-in default.
fn resolve_data_dir(flag: Option<&PathBuf>) -> PathBuf {
    flag.cloned()
        .or_else(|| std::env::var_os("KPI_DATA_DIR").filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(crate::DEFAULT_DATA_DIR))
}

pub fn config_from_args(args: &ViewArgs) -> DashboardConfig {
    DashboardConfig {
        data_dir: resolve_data_dir(args.data_dir.as_ref()),
        preset: args.preset,
        from: args.from,
        to: args.to,
        comparison: args.compare,
        granularity: args.granularity,
        top_n: args.top,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_csv: None,
        export_json: None,
    }
}

/// Rewrite argv so `kpi` defaults to `kpi tui`.
///
/// Rules:
/// - `kpi`                       -> `kpi tui`
/// - `kpi --preset last30 ...`   -> `kpi tui --preset last30 ...`
/// - `kpi --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_launches_tui() {
        assert_eq!(rewrite_args(argv(&["kpi"])), argv(&["kpi", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["kpi", "--preset", "all"])),
            argv(&["kpi", "tui", "--preset", "all"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        assert_eq!(rewrite_args(argv(&["kpi", "summary"])), argv(&["kpi", "summary"]));
        assert_eq!(rewrite_args(argv(&["kpi", "--help"])), argv(&["kpi", "--help"]));
    }

    #[test]
    fn no_plot_flag_disables_charts() {
        let cli = Cli::try_parse_from(["kpi", "traffic", "--no-plot", "--data-dir", "x", "--top", "3"]).unwrap();
        let Command::Traffic(args) = cli.command else {
            panic!("expected traffic");
        };
        let config = config_from_args(&args);
        assert!(!config.plot);
        assert_eq!(config.top_n, 3);
        assert_eq!(config.data_dir, PathBuf::from("x"));
    }
}
