//! KPI summary page: headline metrics against the comparison period.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{ChangeResult, DailyRow, Metric};
use crate::io::Dataset;
use crate::metrics::{MetricSet, aggregate, daily_series, filter_by_date, metric_change};
use crate::report::format::{
    Align, TextTable, ValueFormat, format_number, format_percent, group_thousands, kpi_card,
};
use crate::report::{Page, PageView, Period, Section, Series};

/// Card order on the summary page: traffic row, then conversion row.
pub const SUMMARY_METRICS: [Metric; 8] = [
    Metric::Visitors,
    Metric::Sessions,
    Metric::Pageviews,
    Metric::BounceRate,
    Metric::Conversions,
    Metric::Cvr,
    Metric::Revenue,
    Metric::AverageOrderValue,
];

/// One KPI with both periods and the raw change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiChange {
    pub metric: Metric,
    pub current: Option<f64>,
    pub previous: Option<f64>,
    pub change: Option<ChangeResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub period: Period,
    pub current: MetricSet,
    pub previous: MetricSet,
    pub kpis: Vec<KpiChange>,
    #[serde(skip)]
    pub visitors_trend: Vec<(NaiveDate, f64)>,
    #[serde(skip)]
    pub sessions_trend: Vec<(NaiveDate, f64)>,
    #[serde(skip)]
    pub revenue_trend: Vec<(NaiveDate, f64)>,
    pub daily: Vec<DailyRow>,
}

pub fn build_summary(dataset: &Dataset, period: &Period) -> SummaryReport {
    let rows = &dataset.daily.rows;
    let current_rows = filter_by_date(rows, &period.current);
    let previous_rows = filter_by_date(rows, &period.previous);

    let current = aggregate(&current_rows);
    let previous = aggregate(&previous_rows);

    let kpis = SUMMARY_METRICS
        .iter()
        .map(|&metric| KpiChange {
            metric,
            current: current.get(metric),
            previous: previous.get(metric),
            change: metric_change(&current, &previous, metric),
        })
        .collect();

    SummaryReport {
        period: *period,
        kpis,
        visitors_trend: daily_series(&current_rows, Metric::Visitors),
        sessions_trend: daily_series(&current_rows, Metric::Sessions),
        revenue_trend: daily_series(&current_rows, Metric::Revenue),
        current,
        previous,
        daily: current_rows,
    }
}

pub fn summary_view(report: &SummaryReport) -> PageView {
    let cards = SUMMARY_METRICS
        .iter()
        .map(|&m| kpi_card(m, &report.current, &report.previous))
        .collect();

    let mut detail = TextTable::new(&[
        ("date", Align::Left),
        ("visitors", Align::Right),
        ("sessions", Align::Right),
        ("pv", Align::Right),
        ("cv", Align::Right),
        ("revenue", Align::Right),
        ("bounce", Align::Right),
    ]);
    let mut days = report.daily.clone();
    days.sort_by_key(|r| r.date);
    for r in &days {
        detail.push_row(vec![
            r.date.format("%Y/%m/%d").to_string(),
            format_number(r.visitors, "", "", 0),
            format_number(r.sessions, "", "", 0),
            format_number(r.pageviews, "", "", 0),
            format_number(r.conversions, "", "", 0),
            format!("¥{}", group_thousands(r.revenue, 0)),
            format_percent(r.bounce_rate * 100.0, 1),
        ]);
    }

    PageView {
        page: Page::Summary,
        caption: report.period.caption(),
        cards,
        sections: vec![
            Section::lines(
                "Visitors and sessions",
                vec![
                    Series::new("Visitors", report.visitors_trend.clone()),
                    Series::new("Sessions", report.sessions_trend.clone()),
                ],
                ValueFormat::Count,
            ),
            Section::lines(
                "Revenue",
                vec![Series::new("Revenue", report.revenue_trend.clone())],
                ValueFormat::Yen,
            ),
            Section::table("Daily detail", detail),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComparisonMode, DateRange};
    use crate::report::fixtures::{d, daily_row, dataset};

    #[test]
    fn summary_compares_against_previous_week() {
        let mut ds = dataset();
        ds.daily.rows = (1..=14)
            .map(|n| daily_row(n, 1000.0, if n > 7 { 30.0 } else { 20.0 }, 90_000.0))
            .collect();
        let period = Period::new(DateRange::new(d(8), d(14)), ComparisonMode::PreviousWeek);

        let report = build_summary(&ds, &period);
        assert_eq!(report.daily.len(), 7);
        assert_eq!(report.current.get(Metric::Conversions), Some(210.0));
        assert_eq!(report.previous.get(Metric::Conversions), Some(140.0));

        let cv = report.kpis.iter().find(|k| k.metric == Metric::Conversions).unwrap();
        let change = cv.change.unwrap();
        assert_eq!(change.delta, 70.0);
        assert_eq!(change.delta_pct, 50.0);

        let view = summary_view(&report);
        assert_eq!(view.cards.len(), SUMMARY_METRICS.len());
        assert_eq!(view.cards[4].delta.as_deref(), Some("+50.0%"));
    }

    #[test]
    fn empty_comparison_period_keeps_rates_absent() {
        let mut ds = dataset();
        ds.daily.rows = vec![daily_row(10, 500.0, 10.0, 450_000.0)];
        let period = Period::new(DateRange::single(d(10)), ComparisonMode::PreviousMonth);
        let report = build_summary(&ds, &period);

        assert_eq!(report.previous.get(Metric::Sessions), Some(0.0));
        assert_eq!(report.previous.get(Metric::BounceRate), None);
        let bounce = report.kpis.iter().find(|k| k.metric == Metric::BounceRate).unwrap();
        assert!(bounce.change.is_none());
        assert_eq!(report.current.get(Metric::Cvr), Some(2.0));
    }
}
