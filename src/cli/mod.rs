//! Command-line parsing for the KPI dashboard.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! command dispatch (`app`) and from the metrics code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{ComparisonMode, DatePreset, Granularity};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "kpi", version, about = "Web-traffic KPI dashboard over CSV exports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Headline KPIs against the comparison period; optionally export them.
    Summary(SummaryArgs),
    /// Traffic trends, referrers, devices and regions.
    Traffic(ViewArgs),
    /// Funnel, revenue, products and converting channels.
    Conversion(ViewArgs),
    /// Engagement, visitor mix and page performance.
    Behavior(ViewArgs),
    /// Launch the interactive TUI (the default when no subcommand is given).
    Tui(ViewArgs),
    /// Write a seeded sample dataset (all seven CSV tables).
    Generate(GenerateArgs),
}

/// Options shared by every dashboard view.
#[derive(Debug, Args, Clone)]
pub struct ViewArgs {
    /// Directory holding the CSV tables (default: $KPI_DATA_DIR, then `sample_data`).
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Date range preset, resolved against the data's last day.
    #[arg(short = 'p', long, value_enum, default_value_t = DatePreset::Last7)]
    pub preset: DatePreset,

    /// Range start (implies `--preset custom`).
    #[arg(long, value_name = "DATE", value_parser = parse_date_arg)]
    pub from: Option<NaiveDate>,

    /// Range end (implies `--preset custom`).
    #[arg(long, value_name = "DATE", value_parser = parse_date_arg)]
    pub to: Option<NaiveDate>,

    /// Comparison period.
    #[arg(short = 'c', long, value_enum, default_value_t = ComparisonMode::PreviousWeek)]
    pub compare: ComparisonMode,

    /// Trend bucket size.
    #[arg(short = 'g', long, value_enum, default_value_t = Granularity::Daily)]
    pub granularity: Granularity,

    /// Rows shown in top-N breakdowns.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Disable terminal charts (series are printed as tables instead).
    #[arg(long)]
    pub no_plot: bool,

    /// Chart width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Chart height (rows).
    #[arg(long, default_value_t = 12)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Export one row per KPI to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the full summary to JSON.
    #[arg(long, value_name = "JSON")]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Output directory.
    #[arg(short = 'o', long, default_value = crate::DEFAULT_DATA_DIR)]
    pub out: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of days to generate.
    #[arg(long, default_value_t = 90)]
    pub days: u32,

    /// Last generated day.
    #[arg(long, value_name = "DATE", default_value = "2025-01-15", value_parser = parse_date_arg)]
    pub end_date: NaiveDate,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
        .map_err(|_| format!("invalid date '{s}' (expected YYYY-MM-DD)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_view_flags() {
        let cli = Cli::try_parse_from([
            "kpi", "traffic", "--preset", "last30", "--compare", "previous-month", "-g", "weekly", "--no-plot",
        ])
        .unwrap();
        let Command::Traffic(args) = cli.command else {
            panic!("expected traffic");
        };
        assert_eq!(args.preset, DatePreset::Last30);
        assert_eq!(args.compare, ComparisonMode::PreviousMonth);
        assert_eq!(args.granularity, Granularity::Weekly);
        assert!(args.no_plot);
    }

    #[test]
    fn parses_summary_exports_and_dates() {
        let cli = Cli::try_parse_from([
            "kpi", "summary", "--from", "2025/01/01", "--to", "2025-01-07", "--export", "out.csv",
        ])
        .unwrap();
        let Command::Summary(args) = cli.command else {
            panic!("expected summary");
        };
        assert_eq!(args.view.from, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(args.export, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn comparison_aliases_are_accepted() {
        let cli = Cli::try_parse_from(["kpi", "summary", "-c", "day"]).unwrap();
        let Command::Summary(args) = cli.command else {
            panic!("expected summary");
        };
        assert_eq!(args.view.compare, ComparisonMode::PreviousDay);
    }

    #[test]
    fn generate_defaults() {
        let cli = Cli::try_parse_from(["kpi", "generate"]).unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.seed, 42);
        assert_eq!(args.days, 90);
        assert_eq!(args.end_date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    }
}
