//! Shared dashboard pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load tables -> resolve the date range -> derive the comparison period -> build a page
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use crate::domain::{DashboardConfig, DatePreset};
use crate::error::AppError;
use crate::io::Dataset;
use crate::metrics::resolve_preset;
use crate::report::{Page, PageView, Period, PlotOptions, ReportOptions, build_view};

/// Explicit `--from/--to` always win over the preset.
pub fn effective_preset(config: &DashboardConfig) -> DatePreset {
    if config.from.is_some() || config.to.is_some() {
        DatePreset::Custom
    } else {
        config.preset
    }
}

/// Resolve the selected range and its comparison period.
///
/// Fails with the "no data" exit code when the preset needs the data's date
/// bounds and the daily table is empty.
pub fn resolve_period(dataset: &Dataset, config: &DashboardConfig) -> Result<Period, AppError> {
    let preset = effective_preset(config);
    let current = resolve_preset(preset, dataset.date_bounds(), config.from, config.to).ok_or_else(|| {
        AppError::no_data(format!(
            "No daily data in '{}' to resolve the {} range. Run `kpi generate --out {}` or pass --data-dir.",
            dataset.data_dir.display(),
            preset.display_name(),
            dataset.data_dir.display(),
        ))
    })?;

    let period = Period::new(current, config.comparison);
    tracing::debug!(
        preset = preset.display_name(),
        current = %period.current,
        previous = %period.previous,
        "period resolved"
    );
    Ok(period)
}

pub fn report_options(config: &DashboardConfig) -> ReportOptions {
    ReportOptions {
        top_n: config.top_n.max(1),
        granularity: config.granularity,
    }
}

pub fn plot_options(config: &DashboardConfig) -> PlotOptions {
    PlotOptions {
        enabled: config.plot,
        width: config.plot_width,
        height: config.plot_height,
    }
}

/// Build one page for the configured range.
pub fn build_page(page: Page, dataset: &Dataset, config: &DashboardConfig) -> Result<PageView, AppError> {
    let period = resolve_period(dataset, config)?;
    Ok(build_view(page, dataset, &period, &report_options(config)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ComparisonMode;
    use crate::report::fixtures::{d, daily_row, dataset};

    #[test]
    fn last7_ends_at_latest_day() {
        let mut ds = dataset();
        ds.daily.rows = (1..=20).map(|n| daily_row(n, 100.0, 1.0, 0.0)).collect();
        let config = DashboardConfig::default();

        let period = resolve_period(&ds, &config).unwrap();
        assert_eq!(period.current.start(), d(14));
        assert_eq!(period.current.end(), d(20));
        assert_eq!(period.previous.start(), d(7));
    }

    #[test]
    fn explicit_dates_imply_custom() {
        let mut ds = dataset();
        ds.daily.rows = (1..=20).map(|n| daily_row(n, 100.0, 1.0, 0.0)).collect();
        let config = DashboardConfig {
            from: Some(d(3)),
            comparison: ComparisonMode::PreviousDay,
            ..DashboardConfig::default()
        };
        assert_eq!(effective_preset(&config), DatePreset::Custom);

        let period = resolve_period(&ds, &config).unwrap();
        assert_eq!(period.current.start(), d(3));
        assert_eq!(period.current.end(), d(20));
        assert_eq!(period.previous.end(), d(19));
    }

    #[test]
    fn empty_data_is_a_no_data_error() {
        let err = resolve_period(&dataset(), &DashboardConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), AppError::NO_DATA);
    }
}
