//! Formatting primitives for terminal output: numbers, KPI cards, text tables.
//!
//! We keep formatting code in one place so:
//! - the metrics code stays free of display concerns
//! - output changes are localized (important for snapshot-style tests)

use crate::domain::{ChangeResult, Metric};
use crate::metrics::{MetricSet, metric_change};

/// Format a number for display.
///
/// Large values use myriad units (`億` = 1e8, `万` = 1e4) with one decimal;
/// smaller values are comma-grouped with `decimals` places. Non-finite → `-`.
pub fn format_number(value: f64, prefix: &str, suffix: &str, decimals: usize) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    let body = if value.abs() >= 1e8 {
        format!("{:.1}億", value / 1e8)
    } else if value.abs() >= 1e4 {
        format!("{:.1}万", value / 1e4)
    } else {
        group_thousands(value, decimals)
    };
    format!("{prefix}{body}{suffix}")
}

/// `1234567.891` with 2 decimals -> `1,234,567.89`.
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let raw = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let mut out = String::new();
    if value < 0.0 && raw.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Seconds as `Xm Ys`.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "-".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}m {}s", total / 60, total % 60)
}

pub fn format_percent(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    format!("{value:.decimals$}%")
}

/// How a value is rendered in cards, tables and chart labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    Count,
    Yen,
    /// Already a percentage (e.g. CVR).
    Percent,
    /// A 0–1 share rendered as a percentage (e.g. bounce rate).
    Ratio,
    Duration,
    Decimal,
}

impl ValueFormat {
    pub fn for_metric(metric: Metric) -> Self {
        match metric {
            Metric::Revenue | Metric::AverageOrderValue => ValueFormat::Yen,
            Metric::Cvr => ValueFormat::Percent,
            Metric::BounceRate | Metric::ExitRate => ValueFormat::Ratio,
            Metric::AvgSessionDuration | Metric::AvgTimeOnPage => ValueFormat::Duration,
            Metric::PagesPerSession => ValueFormat::Decimal,
            _ => ValueFormat::Count,
        }
    }

    pub fn format(self, value: f64) -> String {
        match self {
            ValueFormat::Count => format_number(value, "", "", 0),
            ValueFormat::Yen => format_number(value, "¥", "", 0),
            ValueFormat::Percent => format_percent(value, 2),
            ValueFormat::Ratio => format_percent(value * 100.0, 1),
            ValueFormat::Duration => format_duration(value),
            ValueFormat::Decimal => format!("{value:.1}"),
        }
    }

    /// `None` ("no data") renders as `-`.
    pub fn format_opt(self, value: Option<f64>) -> String {
        value.map_or_else(|| "-".to_string(), |v| self.format(v))
    }
}

/// One headline number, optionally with its change against the comparison period.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiCard {
    pub label: String,
    pub value: String,
    /// e.g. `+4.2%`
    pub delta: Option<String>,
    /// Whether the delta moved in the favorable direction.
    pub favorable: Option<bool>,
}

impl KpiCard {
    pub fn plain(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            delta: None,
            favorable: None,
        }
    }
}

/// Percentage change as shown to the user.
///
/// For lower-is-better metrics (bounce rate, exit rate) the sign is flipped so
/// a drop displays as an improvement. The stored `ChangeResult` is untouched.
pub fn display_delta_pct(metric: Metric, change: &ChangeResult) -> f64 {
    if metric.lower_is_better() && change.delta_pct != 0.0 {
        -change.delta_pct
    } else {
        change.delta_pct
    }
}

/// Card for `metric`; no delta when either side has no data.
pub fn kpi_card(metric: Metric, current: &MetricSet, previous: &MetricSet) -> KpiCard {
    let value = ValueFormat::for_metric(metric).format_opt(current.get(metric));
    match metric_change(current, previous, metric) {
        Some(change) => {
            let pct = display_delta_pct(metric, &change);
            KpiCard {
                label: metric.label().to_string(),
                value,
                delta: Some(format!("{pct:+.1}%")),
                favorable: Some(pct >= 0.0),
            }
        }
        None => KpiCard::plain(metric.label(), value),
    }
}

pub fn format_cards(cards: &[KpiCard]) -> String {
    let mut out = String::new();
    for card in cards {
        let arrow = match card.favorable {
            Some(true) => "▲",
            Some(false) => "▼",
            None => "",
        };
        let line = format!(
            "{:<20} {:>14} {:>9} {arrow}",
            truncate(&card.label, 20),
            card.value,
            card.delta.as_deref().unwrap_or(""),
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A fixed-width text table.
#[derive(Debug, Clone, PartialEq)]
pub struct TextTable {
    pub headers: Vec<String>,
    pub align: Vec<Align>,
    pub rows: Vec<Vec<String>>,
}

const MAX_CELL: usize = 28;

impl TextTable {
    pub fn new(columns: &[(&str, Align)]) -> Self {
        Self {
            headers: columns.iter().map(|(h, _)| h.to_string()).collect(),
            align: columns.iter().map(|(_, a)| *a).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let cols = self.headers.len();
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().take(cols).enumerate() {
                widths[i] = widths[i].max(cell.chars().count().min(MAX_CELL));
            }
        }

        let mut out = String::new();
        push_line(&mut out, &self.headers, &widths, &self.align);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_line(&mut out, &rule, &widths, &self.align);
        if self.rows.is_empty() {
            out.push_str("(no data)\n");
        }
        for row in &self.rows {
            push_line(&mut out, row, &widths, &self.align);
        }
        out
    }
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize], align: &[Align]) {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = truncate(cells.get(i).map(String::as_str).unwrap_or(""), MAX_CELL);
        let pad = width.saturating_sub(cell.chars().count());
        if i > 0 {
            line.push(' ');
        }
        match align.get(i).copied().unwrap_or(Align::Left) {
            Align::Left => {
                line.push_str(&cell);
                line.push_str(&" ".repeat(pad));
            }
            Align::Right => {
                line.push_str(&" ".repeat(pad));
                line.push_str(&cell);
            }
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DailyRow;
    use crate::metrics::aggregate;
    use chrono::NaiveDate;

    #[test]
    fn myriad_units_and_grouping() {
        assert_eq!(format_number(123_456_789.0, "¥", "", 0), "¥1.2億");
        assert_eq!(format_number(35_200.0, "", "", 0), "3.5万");
        assert_eq!(format_number(9_999.0, "", "", 0), "9,999");
        assert_eq!(format_number(1234.567, "", "", 2), "1,234.57");
        assert_eq!(format_number(-2500.0, "", " pv", 0), "-2,500 pv");
        assert_eq!(format_number(f64::NAN, "¥", "", 0), "-");
    }

    #[test]
    fn duration_renders_minutes_and_seconds() {
        assert_eq!(format_duration(185.9), "3m 5s");
        assert_eq!(format_duration(42.0), "0m 42s");
    }

    fn daily(bounce: f64, visitors: f64) -> DailyRow {
        DailyRow {
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            visitors,
            new_visitors: 0.0,
            returning_visitors: 0.0,
            sessions: 100.0,
            pageviews: 0.0,
            conversions: 0.0,
            revenue: 0.0,
            bounce_rate: bounce,
            avg_session_duration: 0.0,
            pages_per_session: 0.0,
        }
    }

    #[test]
    fn bounce_rate_card_flips_sign() {
        let cur = aggregate(&[daily(0.40, 110.0)]);
        let prev = aggregate(&[daily(0.50, 100.0)]);

        let bounce = kpi_card(Metric::BounceRate, &cur, &prev);
        assert_eq!(bounce.value, "40.0%");
        assert_eq!(bounce.delta.as_deref(), Some("+20.0%"));
        assert_eq!(bounce.favorable, Some(true));

        let visitors = kpi_card(Metric::Visitors, &cur, &prev);
        assert_eq!(visitors.delta.as_deref(), Some("+10.0%"));
        assert_eq!(visitors.favorable, Some(true));
    }

    #[test]
    fn card_without_previous_data_has_no_delta() {
        let cur = aggregate(&[daily(0.40, 110.0)]);
        let prev = aggregate::<DailyRow, _>(&[]);
        let card = kpi_card(Metric::BounceRate, &cur, &prev);
        assert!(card.delta.is_none());
        // Additive metrics still compare against 0 ("no change").
        let card = kpi_card(Metric::Visitors, &cur, &prev);
        assert_eq!(card.delta.as_deref(), Some("+0.0%"));
    }

    #[test]
    fn table_renders_aligned_columns() {
        let mut t = TextTable::new(&[("page", Align::Left), ("views", Align::Right)]);
        t.push_row(vec!["Home".into(), "1,200".into()]);
        t.push_row(vec!["Cart".into(), "80".into()]);
        let expected = concat!(
            "page views\n",
            "---- -----\n",
            "Home 1,200\n",
            "Cart    80\n",
        );
        assert_eq!(t.render(), expected);
    }
}
