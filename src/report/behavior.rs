//! Behavior page: engagement, visitor mix and page-level performance.

use crate::domain::Metric;
use crate::io::Dataset;
use crate::metrics::{
    MetricSet, aggregate, aggregate_by, daily_series, filter_by_date, quantile, ratio, sort_groups, top_groups,
};
use crate::report::format::{
    Align, KpiCard, TextTable, ValueFormat, format_duration, format_number, format_percent,
};
use crate::report::{Page, PageView, Period, ReportOptions, Section, Series, named_bars};

/// Pages at or below this pageview quantile are left out of the exit-rate and
/// time-on-page rankings.
pub const LOW_TRAFFIC_QUANTILE: f64 = 0.25;

#[derive(Debug, Clone)]
pub struct BehaviorReport {
    pub period: Period,
    pub avg_session_duration: Option<f64>,
    pub pages_per_session: Option<f64>,
    pub bounce_rate: Option<f64>,
    pub new_visitors: f64,
    pub returning_visitors: f64,
    /// `new / (new + returning) * 100`, 0 when both are 0.
    pub new_visitor_ratio: f64,
    pub new_visitors_trend: Series,
    pub returning_visitors_trend: Series,
    pub duration_trend: Series,
    pub bounce_trend: Series,
    pub top_pages: Vec<(String, MetricSet)>,
    pub by_category: Vec<(String, MetricSet)>,
    pub top_exit_pages: Vec<(String, MetricSet)>,
    pub top_time_pages: Vec<(String, MetricSet)>,
    /// `(page_name, page_category, page_url)` sorted by pageviews, descending.
    pub page_detail: Vec<((String, String, String), MetricSet)>,
    pub entry_pages: Vec<(String, MetricSet)>,
}

pub fn build_behavior(dataset: &Dataset, period: &Period, opts: &ReportOptions) -> BehaviorReport {
    let daily = filter_by_date(&dataset.daily.rows, &period.current);
    let pages = filter_by_date(&dataset.pages.rows, &period.current);

    let totals = aggregate(&daily);
    let new_visitors = totals.get_or_zero(Metric::NewVisitors);
    let returning_visitors = totals.get_or_zero(Metric::ReturningVisitors);

    let by_page = aggregate_by(&pages, |r| r.page_name.clone());
    let ranked = above_low_traffic(&by_page);

    let mut by_category = aggregate_by(&pages, |r| r.page_category.clone());
    sort_groups(&mut by_category, Metric::Pageviews, true);

    let mut page_detail = aggregate_by(&pages, |r| {
        (r.page_name.clone(), r.page_category.clone(), r.page_url.clone())
    });
    sort_groups(&mut page_detail, Metric::Pageviews, true);

    let bounce_pct = daily_series(&daily, Metric::BounceRate)
        .into_iter()
        .map(|(d, v)| (d, v * 100.0))
        .collect();

    BehaviorReport {
        period: *period,
        avg_session_duration: totals.get(Metric::AvgSessionDuration),
        pages_per_session: totals.get(Metric::PagesPerSession),
        bounce_rate: totals.get(Metric::BounceRate),
        new_visitors,
        returning_visitors,
        new_visitor_ratio: ratio(new_visitors, new_visitors + returning_visitors) * 100.0,
        new_visitors_trend: Series::new("New", daily_series(&daily, Metric::NewVisitors)),
        returning_visitors_trend: Series::new("Returning", daily_series(&daily, Metric::ReturningVisitors)),
        duration_trend: Series::new("Avg session", daily_series(&daily, Metric::AvgSessionDuration)),
        bounce_trend: Series::new("Bounce rate", bounce_pct),
        top_pages: top_groups(by_page.clone(), Metric::Pageviews, opts.top_n),
        by_category,
        top_exit_pages: top_groups(ranked.clone(), Metric::ExitRate, opts.top_n),
        top_time_pages: top_groups(ranked, Metric::AvgTimeOnPage, opts.top_n),
        page_detail,
        entry_pages: top_groups(by_page, Metric::Entrances, opts.top_n),
    }
}

/// Drop pages whose pageviews are at or below the low-traffic quantile.
fn above_low_traffic(groups: &[(String, MetricSet)]) -> Vec<(String, MetricSet)> {
    let views: Vec<f64> = groups.iter().map(|(_, s)| s.get_or_zero(Metric::Pageviews)).collect();
    let Some(threshold) = quantile(&views, LOW_TRAFFIC_QUANTILE) else {
        return Vec::new();
    };
    groups
        .iter()
        .filter(|(_, s)| s.get_or_zero(Metric::Pageviews) > threshold)
        .cloned()
        .collect()
}

pub fn behavior_view(report: &BehaviorReport) -> PageView {
    let cards = vec![
        KpiCard::plain(
            "Avg session",
            report.avg_session_duration.map_or_else(|| "-".to_string(), format_duration),
        ),
        KpiCard::plain(
            "Pages/session",
            report
                .pages_per_session
                .map_or_else(|| "-".to_string(), |v| format!("{v:.1} pages")),
        ),
        KpiCard::plain("Bounce rate", ValueFormat::Ratio.format_opt(report.bounce_rate)),
        KpiCard::plain("New visitor ratio", format_percent(report.new_visitor_ratio, 1)),
    ];

    let mut detail = TextTable::new(&[
        ("page", Align::Left),
        ("category", Align::Left),
        ("url", Align::Left),
        ("pv", Align::Right),
        ("unique", Align::Right),
        ("time", Align::Right),
        ("exit", Align::Right),
        ("entries", Align::Right),
    ]);
    for ((name, category, url), s) in &report.page_detail {
        detail.push_row(vec![
            name.clone(),
            category.clone(),
            url.clone(),
            format_number(s.get_or_zero(Metric::Pageviews), "", "", 0),
            format_number(s.get_or_zero(Metric::UniquePageviews), "", "", 0),
            ValueFormat::Duration.format_opt(s.get(Metric::AvgTimeOnPage)),
            ValueFormat::Ratio.format_opt(s.get(Metric::ExitRate)),
            format_number(s.get_or_zero(Metric::Entrances), "", "", 0),
        ]);
    }

    let exit_pct: Vec<(String, f64)> = named_bars(&report.top_exit_pages, Metric::ExitRate)
        .into_iter()
        .map(|(name, v)| (name, v * 100.0))
        .collect();

    PageView {
        page: Page::Behavior,
        caption: format!("Period: {}", report.period.current),
        cards,
        sections: vec![
            Section::bars(
                "New vs returning visitors",
                vec![
                    ("New".to_string(), report.new_visitors),
                    ("Returning".to_string(), report.returning_visitors),
                ],
                ValueFormat::Count,
            ),
            Section::lines(
                "Visitors by type",
                vec![report.new_visitors_trend.clone(), report.returning_visitors_trend.clone()],
                ValueFormat::Count,
            ),
            Section::lines(
                "Avg session duration",
                vec![report.duration_trend.clone()],
                ValueFormat::Duration,
            ),
            Section::lines("Bounce rate", vec![report.bounce_trend.clone()], ValueFormat::Percent),
            Section::bars(
                "Top pages by pageviews",
                named_bars(&report.top_pages, Metric::Pageviews),
                ValueFormat::Count,
            ),
            Section::bars(
                "Pageviews by page category",
                named_bars(&report.by_category, Metric::Pageviews),
                ValueFormat::Count,
            ),
            Section::bars("Highest exit rate", exit_pct, ValueFormat::Percent),
            Section::bars(
                "Longest time on page",
                named_bars(&report.top_time_pages, Metric::AvgTimeOnPage),
                ValueFormat::Duration,
            ),
            Section::table("Page detail", detail),
            Section::bars(
                "Top entry pages",
                named_bars(&report.entry_pages, Metric::Entrances),
                ValueFormat::Count,
            ),
        ],
    }
}
