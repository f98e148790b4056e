//! Dashboard pages: report builders plus a shared, render-agnostic view model.
//!
//! Each page module computes a typed report from the filtered tables and turns
//! it into a [`PageView`] (cards + sections). The text renderer below and the
//! TUI both draw from `PageView`, so the two front-ends never diverge.

pub mod behavior;
pub mod conversion;
pub mod format;
pub mod summary;
pub mod traffic;

#[cfg(test)]
pub(crate) mod fixtures;

use chrono::NaiveDate;

use crate::domain::{ComparisonMode, DateRange, Granularity, Metric};
use crate::io::Dataset;
use crate::metrics::{MetricSet, resolve_comparison};
use crate::plot::ascii::{render_bar_chart, render_line_chart};

pub use format::{Align, KpiCard, TextTable, ValueFormat};

/// The dashboard pages, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Summary,
    Traffic,
    Conversion,
    Behavior,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Summary, Page::Traffic, Page::Conversion, Page::Behavior];

    pub fn title(self) -> &'static str {
        match self {
            Page::Summary => "KPI Summary",
            Page::Traffic => "Traffic",
            Page::Conversion => "Conversion",
            Page::Behavior => "Behavior",
        }
    }

    pub fn index(self) -> usize {
        Page::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Page::ALL[(self.index() + 1) % Page::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Page::ALL[(self.index() + Page::ALL.len() - 1) % Page::ALL.len()]
    }
}

/// The selected range and the comparison range derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Period {
    pub current: DateRange,
    pub previous: DateRange,
    pub mode: ComparisonMode,
}

impl Period {
    pub fn new(current: DateRange, mode: ComparisonMode) -> Self {
        Self {
            current,
            previous: resolve_comparison(&current, mode),
            mode,
        }
    }

    pub fn caption(&self) -> String {
        format!(
            "Period: {} | Compared with: {} ({})",
            self.current,
            self.mode.display_name(),
            self.previous
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub top_n: usize,
    pub granularity: Granularity,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_n: 10,
            granularity: Granularity::Daily,
        }
    }
}

/// A named date series (one chart line).
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(NaiveDate, f64)>,
}

impl Series {
    pub fn new(name: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Lines {
        series: Vec<Series>,
        format: ValueFormat,
    },
    Bars {
        bars: Vec<(String, f64)>,
        format: ValueFormat,
    },
    Table(TextTable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub body: SectionBody,
}

impl Section {
    pub fn lines(title: impl Into<String>, series: Vec<Series>, format: ValueFormat) -> Self {
        Self {
            title: title.into(),
            body: SectionBody::Lines { series, format },
        }
    }

    pub fn bars(title: impl Into<String>, bars: Vec<(String, f64)>, format: ValueFormat) -> Self {
        Self {
            title: title.into(),
            body: SectionBody::Bars { bars, format },
        }
    }

    pub fn table(title: impl Into<String>, table: TextTable) -> Self {
        Self {
            title: title.into(),
            body: SectionBody::Table(table),
        }
    }
}

/// Everything one page shows, ready for any renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub page: Page,
    pub caption: String,
    pub cards: Vec<KpiCard>,
    pub sections: Vec<Section>,
}

/// Build the view for `page` over `period`.
pub fn build_view(page: Page, dataset: &Dataset, period: &Period, opts: &ReportOptions) -> PageView {
    tracing::debug!(page = page.title(), period = %period.current, "building page");
    match page {
        Page::Summary => summary::summary_view(&summary::build_summary(dataset, period)),
        Page::Traffic => traffic::traffic_view(&traffic::build_traffic(dataset, period, opts), opts),
        Page::Conversion => conversion::conversion_view(&conversion::build_conversion(dataset, period, opts)),
        Page::Behavior => behavior::behavior_view(&behavior::build_behavior(dataset, period, opts)),
    }
}

/// Chart settings for text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotOptions {
    pub enabled: bool,
    pub width: usize,
    pub height: usize,
}

/// Render a page as plain text for stdout.
pub fn render_text(view: &PageView, plot: &PlotOptions) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ===\n", view.page.title()));
    out.push_str(&view.caption);
    out.push_str("\n\n");
    out.push_str(&format::format_cards(&view.cards));

    for section in &view.sections {
        out.push('\n');
        out.push_str(&section.title);
        out.push_str(":\n");
        match &section.body {
            SectionBody::Lines { series, format } => {
                if plot.enabled {
                    out.push_str(&render_line_chart(series, plot.width, plot.height, *format));
                } else {
                    out.push_str(&series_table(series, *format).render());
                }
            }
            SectionBody::Bars { bars, format } => {
                if plot.enabled {
                    out.push_str(&render_bar_chart(bars, plot.width, *format));
                } else {
                    let mut t = TextTable::new(&[("", Align::Left), ("value", Align::Right)]);
                    for (name, v) in bars {
                        t.push_row(vec![name.clone(), format.format(*v)]);
                    }
                    out.push_str(&t.render());
                }
            }
            SectionBody::Table(table) => out.push_str(&table.render()),
        }
    }
    out
}

/// Series laid out as a date-by-series table (used when charts are off).
pub fn series_table(series: &[Series], format: ValueFormat) -> TextTable {
    let mut columns = vec![("date", Align::Left)];
    columns.extend(series.iter().map(|s| (s.name.as_str(), Align::Right)));
    let mut table = TextTable::new(&columns);

    let mut dates: Vec<NaiveDate> = series.iter().flat_map(|s| s.points.iter().map(|p| p.0)).collect();
    dates.sort();
    dates.dedup();
    for date in dates {
        let mut row = vec![date.format("%Y/%m/%d").to_string()];
        for s in series {
            let v = s.points.iter().find(|p| p.0 == date).map(|p| p.1);
            row.push(format.format_opt(v));
        }
        table.push_row(row);
    }
    table
}

/// Bar data for one metric of grouped sets.
pub(crate) fn named_bars<K: AsRef<str>>(groups: &[(K, MetricSet)], metric: Metric) -> Vec<(String, f64)> {
    groups
        .iter()
        .map(|(k, set)| (k.as_ref().to_string(), set.get_or_zero(metric)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_cycle_wraps() {
        assert_eq!(Page::Behavior.next(), Page::Summary);
        assert_eq!(Page::Summary.prev(), Page::Behavior);
    }

    #[test]
    fn series_table_aligns_dates_across_series() {
        let d = |n| NaiveDate::from_ymd_opt(2025, 1, n).unwrap();
        let a = Series::new("a", vec![(d(1), 1.0), (d(2), 2.0)]);
        let b = Series::new("b", vec![(d(2), 5.0)]);
        let t = series_table(&[a, b], ValueFormat::Count);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0], vec!["2025/01/01", "1", "-"]);
        assert_eq!(t.rows[1], vec!["2025/01/02", "2", "5"]);
    }
}
