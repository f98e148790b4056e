//! Shared domain types.
//!
//! Row types mirror the CSV tables one-to-one and derive `Serialize` so the
//! sample generator can write them back out with `csv::Writer`. Everything the
//! computation core needs from a row goes through [`MetricSource`].

use std::fmt;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// An inclusive calendar date range.
///
/// Constructing a range with `start > end` swaps the endpoints, so every
/// `DateRange` in the program satisfies `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            tracing::debug!(%start, %end, "inverted date range normalized");
            Self { start: end, end: start }
        }
    }

    /// A one-day range.
    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered (inclusive).
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Shift both endpoints back by `days`.
    pub fn shift_back(&self, days: i64) -> Self {
        let offset = Duration::days(days);
        Self {
            start: self.start - offset,
            end: self.end - offset,
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%Y/%m/%d"),
            self.end.format("%Y/%m/%d")
        )
    }
}

/// Which prior period a selection is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    #[value(name = "previous-day", alias = "day")]
    PreviousDay,
    #[default]
    #[value(name = "previous-week", alias = "week")]
    PreviousWeek,
    /// Fixed 30-day shift (not calendar-month aware).
    #[value(name = "previous-month", alias = "month")]
    PreviousMonth,
}

impl ComparisonMode {
    pub const ALL: [ComparisonMode; 3] = [
        ComparisonMode::PreviousWeek,
        ComparisonMode::PreviousDay,
        ComparisonMode::PreviousMonth,
    ];

    pub fn offset_days(self) -> i64 {
        match self {
            ComparisonMode::PreviousDay => 1,
            ComparisonMode::PreviousWeek => 7,
            ComparisonMode::PreviousMonth => 30,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ComparisonMode::PreviousDay => "previous day",
            ComparisonMode::PreviousWeek => "previous week",
            ComparisonMode::PreviousMonth => "previous month",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, -1)
    }
}

/// Quick date-range selections resolved against the data's available dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DatePreset {
    /// The last 7 days of data (`max - 6 ..= max`).
    #[default]
    Last7,
    /// The last 30 days of data (`max - 29 ..= max`).
    Last30,
    /// Every available day (`min ..= max`).
    All,
    /// Explicit `--from` / `--to`.
    Custom,
}

impl DatePreset {
    /// Presets the TUI cycles through (custom ranges come from flags only).
    pub const CYCLE: [DatePreset; 3] = [DatePreset::Last7, DatePreset::Last30, DatePreset::All];

    pub fn display_name(self) -> &'static str {
        match self {
            DatePreset::Last7 => "last 7 days",
            DatePreset::Last30 => "last 30 days",
            DatePreset::All => "all days",
            DatePreset::Custom => "custom",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::CYCLE, self, 1)
    }

    pub fn prev(self) -> Self {
        cycle(&Self::CYCLE, self, -1)
    }
}

/// Bucket size for trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Daily,
    Weekly,
}

impl Granularity {
    pub fn display_name(self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Granularity::Daily => Granularity::Weekly,
            Granularity::Weekly => Granularity::Daily,
        }
    }
}

fn cycle<T: Copy + PartialEq>(items: &[T], cur: T, step: isize) -> T {
    let len = items.len() as isize;
    let idx = items.iter().position(|&x| x == cur).unwrap_or(0) as isize;
    items[(idx + step).rem_euclid(len) as usize]
}

/// Every named scalar the dashboard knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Visitors,
    NewVisitors,
    ReturningVisitors,
    Sessions,
    Pageviews,
    UniquePageviews,
    Entrances,
    Conversions,
    Quantity,
    Revenue,
    BounceRate,
    AvgSessionDuration,
    PagesPerSession,
    AvgTimeOnPage,
    ExitRate,
    Cvr,
    AverageOrderValue,
}

impl Metric {
    pub const ADDITIVE: [Metric; 10] = [
        Metric::Visitors,
        Metric::NewVisitors,
        Metric::ReturningVisitors,
        Metric::Sessions,
        Metric::Pageviews,
        Metric::UniquePageviews,
        Metric::Entrances,
        Metric::Conversions,
        Metric::Quantity,
        Metric::Revenue,
    ];

    pub const RATE: [Metric; 5] = [
        Metric::BounceRate,
        Metric::AvgSessionDuration,
        Metric::PagesPerSession,
        Metric::AvgTimeOnPage,
        Metric::ExitRate,
    ];

    /// Column / JSON key.
    pub fn key(self) -> &'static str {
        match self {
            Metric::Visitors => "visitors",
            Metric::NewVisitors => "new_visitors",
            Metric::ReturningVisitors => "returning_visitors",
            Metric::Sessions => "sessions",
            Metric::Pageviews => "pageviews",
            Metric::UniquePageviews => "unique_pageviews",
            Metric::Entrances => "entrances",
            Metric::Conversions => "conversions",
            Metric::Quantity => "quantity",
            Metric::Revenue => "revenue",
            Metric::BounceRate => "bounce_rate",
            Metric::AvgSessionDuration => "avg_session_duration",
            Metric::PagesPerSession => "pages_per_session",
            Metric::AvgTimeOnPage => "avg_time_on_page",
            Metric::ExitRate => "exit_rate",
            Metric::Cvr => "cvr",
            Metric::AverageOrderValue => "average_order_value",
        }
    }

    /// Human-readable label for terminal output.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Visitors => "Visitors",
            Metric::NewVisitors => "New visitors",
            Metric::ReturningVisitors => "Returning visitors",
            Metric::Sessions => "Sessions",
            Metric::Pageviews => "Pageviews",
            Metric::UniquePageviews => "Unique pageviews",
            Metric::Entrances => "Entrances",
            Metric::Conversions => "Conversions",
            Metric::Quantity => "Quantity",
            Metric::Revenue => "Revenue",
            Metric::BounceRate => "Bounce rate",
            Metric::AvgSessionDuration => "Avg session",
            Metric::PagesPerSession => "Pages/session",
            Metric::AvgTimeOnPage => "Avg time on page",
            Metric::ExitRate => "Exit rate",
            Metric::Cvr => "CVR",
            Metric::AverageOrderValue => "Avg order value",
        }
    }

    /// Metrics where a decrease is the favorable direction.
    pub fn lower_is_better(self) -> bool {
        matches!(self, Metric::BounceRate | Metric::ExitRate)
    }
}

/// Anything that carries a date plus some subset of the named metrics.
pub trait MetricSource {
    fn date(&self) -> NaiveDate;

    /// The row's value for `metric`, or `None` when the row's table has no such column.
    fn value(&self, metric: Metric) -> Option<f64>;
}

/// `daily_summary.csv`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub visitors: f64,
    pub new_visitors: f64,
    pub returning_visitors: f64,
    pub sessions: f64,
    pub pageviews: f64,
    pub conversions: f64,
    pub revenue: f64,
    pub bounce_rate: f64,
    pub avg_session_duration: f64,
    pub pages_per_session: f64,
}

impl MetricSource for DailyRow {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Visitors => Some(self.visitors),
            Metric::NewVisitors => Some(self.new_visitors),
            Metric::ReturningVisitors => Some(self.returning_visitors),
            Metric::Sessions => Some(self.sessions),
            Metric::Pageviews => Some(self.pageviews),
            Metric::Conversions => Some(self.conversions),
            Metric::Revenue => Some(self.revenue),
            Metric::BounceRate => Some(self.bounce_rate),
            Metric::AvgSessionDuration => Some(self.avg_session_duration),
            Metric::PagesPerSession => Some(self.pages_per_session),
            _ => None,
        }
    }
}

/// `page_metrics.csv` (date × page)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRow {
    pub date: NaiveDate,
    pub page_name: String,
    pub page_url: String,
    pub page_category: String,
    pub pageviews: f64,
    pub unique_pageviews: f64,
    pub avg_time_on_page: f64,
    pub exit_rate: f64,
    pub entrances: f64,
}

impl MetricSource for PageRow {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Pageviews => Some(self.pageviews),
            Metric::UniquePageviews => Some(self.unique_pageviews),
            Metric::AvgTimeOnPage => Some(self.avg_time_on_page),
            Metric::ExitRate => Some(self.exit_rate),
            Metric::Entrances => Some(self.entrances),
            _ => None,
        }
    }
}

/// `referrer_metrics.csv` (date × referrer)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferrerRow {
    pub date: NaiveDate,
    pub referrer: String,
    pub referrer_type: String,
    pub sessions: f64,
    pub visitors: f64,
    pub pageviews: f64,
    pub conversions: f64,
    pub revenue: f64,
    pub bounce_rate: f64,
}

impl MetricSource for ReferrerRow {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Sessions => Some(self.sessions),
            Metric::Visitors => Some(self.visitors),
            Metric::Pageviews => Some(self.pageviews),
            Metric::Conversions => Some(self.conversions),
            Metric::Revenue => Some(self.revenue),
            Metric::BounceRate => Some(self.bounce_rate),
            _ => None,
        }
    }
}

/// `device_metrics.csv` (date × device)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceRow {
    pub date: NaiveDate,
    pub device: String,
    pub sessions: f64,
    pub visitors: f64,
    pub pageviews: f64,
    pub conversions: f64,
    pub revenue: f64,
    pub bounce_rate: f64,
}

impl MetricSource for DeviceRow {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Sessions => Some(self.sessions),
            Metric::Visitors => Some(self.visitors),
            Metric::Pageviews => Some(self.pageviews),
            Metric::Conversions => Some(self.conversions),
            Metric::Revenue => Some(self.revenue),
            Metric::BounceRate => Some(self.bounce_rate),
            _ => None,
        }
    }
}

/// `region_metrics.csv` (date × region)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRow {
    pub date: NaiveDate,
    pub region: String,
    pub sessions: f64,
    pub visitors: f64,
    pub pageviews: f64,
    pub conversions: f64,
    pub revenue: f64,
}

impl MetricSource for RegionRow {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Sessions => Some(self.sessions),
            Metric::Visitors => Some(self.visitors),
            Metric::Pageviews => Some(self.pageviews),
            Metric::Conversions => Some(self.conversions),
            Metric::Revenue => Some(self.revenue),
            _ => None,
        }
    }
}

/// `product_sales.csv` (date × product)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRow {
    pub date: NaiveDate,
    pub product_id: String,
    pub product_name: String,
    pub product_category: String,
    pub unit_price: f64,
    pub quantity: f64,
    pub revenue: f64,
}

impl MetricSource for ProductRow {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Quantity => Some(self.quantity),
            Metric::Revenue => Some(self.revenue),
            _ => None,
        }
    }
}

/// `conversion_funnel.csv` (date × funnel step)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelRow {
    pub date: NaiveDate,
    pub step_number: u32,
    pub step_name: String,
    pub users: f64,
    pub conversion_rate_from_prev: f64,
    pub conversion_rate_from_start: f64,
}

impl MetricSource for FunnelRow {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn value(&self, _metric: Metric) -> Option<f64> {
        None
    }
}

/// One aggregated funnel stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStep {
    pub step_number: u32,
    pub step_name: String,
    pub users: f64,
    /// `users / previous step users` (1.0 for the first step).
    pub from_previous: f64,
    /// `users / first step users`.
    pub from_start: f64,
}

/// Current vs previous value of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChangeResult {
    pub delta: f64,
    pub delta_pct: f64,
    pub is_positive: bool,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults and `.env`).
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    pub preset: DatePreset,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub comparison: ComparisonMode,
    pub granularity: Granularity,
    pub top_n: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(crate::DEFAULT_DATA_DIR),
            preset: DatePreset::default(),
            from: None,
            to: None,
            comparison: ComparisonMode::default(),
            granularity: Granularity::default(),
            top_n: 10,
            plot: true,
            plot_width: 72,
            plot_height: 12,
            export_csv: None,
            export_json: None,
        }
    }
}
