//! Traffic page: volume trends and where sessions come from.

use crate::domain::{Granularity, Metric};
use crate::io::Dataset;
use crate::metrics::{
    MetricSet, aggregate, aggregate_by, daily_series, filter_by_date, ratio, sort_groups, top_groups,
    weekly_series,
};
use crate::report::format::{Align, TextTable, ValueFormat, format_number, format_percent, kpi_card};
use crate::report::{Page, PageView, Period, ReportOptions, Section, Series, named_bars};

pub const TRAFFIC_METRICS: [Metric; 4] = [
    Metric::Visitors,
    Metric::Sessions,
    Metric::Pageviews,
    Metric::BounceRate,
];

#[derive(Debug, Clone)]
pub struct TrafficReport {
    pub period: Period,
    pub totals: MetricSet,
    pub previous: MetricSet,
    pub visitors_trend: Series,
    pub sessions_trend: Series,
    pub pageviews_trend: Series,
    pub by_referrer_type: Vec<(String, MetricSet)>,
    pub top_referrers: Vec<(String, MetricSet)>,
    /// `(referrer, referrer_type)` sorted by sessions, descending.
    pub referrer_detail: Vec<((String, String), MetricSet)>,
    pub devices: Vec<(String, MetricSet)>,
    /// Share of sessions per device, in percent.
    pub device_share: Vec<(String, f64)>,
    pub top_regions_by_sessions: Vec<(String, MetricSet)>,
    pub top_regions_by_revenue: Vec<(String, MetricSet)>,
}

pub fn build_traffic(dataset: &Dataset, period: &Period, opts: &ReportOptions) -> TrafficReport {
    let daily = filter_by_date(&dataset.daily.rows, &period.current);
    let previous = aggregate(&filter_by_date(&dataset.daily.rows, &period.previous));
    let referrers = filter_by_date(&dataset.referrers.rows, &period.current);
    let devices = filter_by_date(&dataset.devices.rows, &period.current);
    let regions = filter_by_date(&dataset.regions.rows, &period.current);

    let trend = |metric: Metric| match opts.granularity {
        Granularity::Daily => daily_series(&daily, metric),
        Granularity::Weekly => weekly_series(&daily, metric),
    };

    let mut by_referrer_type = aggregate_by(&referrers, |r| r.referrer_type.clone());
    sort_groups(&mut by_referrer_type, Metric::Sessions, true);

    let mut referrer_detail = aggregate_by(&referrers, |r| (r.referrer.clone(), r.referrer_type.clone()));
    sort_groups(&mut referrer_detail, Metric::Sessions, true);

    let mut device_groups = aggregate_by(&devices, |r| r.device.clone());
    sort_groups(&mut device_groups, Metric::Sessions, true);
    let device_total: f64 = device_groups.iter().map(|(_, s)| s.get_or_zero(Metric::Sessions)).sum();
    let device_share = device_groups
        .iter()
        .map(|(name, s)| (name.clone(), ratio(s.get_or_zero(Metric::Sessions), device_total) * 100.0))
        .collect();

    let region_groups = aggregate_by(&regions, |r| r.region.clone());

    TrafficReport {
        period: *period,
        totals: aggregate(&daily),
        previous,
        visitors_trend: Series::new("Visitors", trend(Metric::Visitors)),
        sessions_trend: Series::new("Sessions", trend(Metric::Sessions)),
        pageviews_trend: Series::new("Pageviews", trend(Metric::Pageviews)),
        top_referrers: top_groups(aggregate_by(&referrers, |r| r.referrer.clone()), Metric::Sessions, opts.top_n),
        by_referrer_type,
        referrer_detail,
        devices: device_groups,
        device_share,
        top_regions_by_sessions: top_groups(region_groups.clone(), Metric::Sessions, opts.top_n),
        top_regions_by_revenue: top_groups(region_groups, Metric::Revenue, opts.top_n),
    }
}

pub fn traffic_view(report: &TrafficReport, opts: &ReportOptions) -> PageView {
    let cards = TRAFFIC_METRICS
        .iter()
        .map(|&m| kpi_card(m, &report.totals, &report.previous))
        .collect();

    let mut detail = TextTable::new(&[
        ("referrer", Align::Left),
        ("type", Align::Left),
        ("sessions", Align::Right),
        ("visitors", Align::Right),
        ("cv", Align::Right),
        ("revenue", Align::Right),
        ("cvr", Align::Right),
    ]);
    for ((referrer, kind), s) in &report.referrer_detail {
        detail.push_row(vec![
            referrer.clone(),
            kind.clone(),
            format_number(s.get_or_zero(Metric::Sessions), "", "", 0),
            format_number(s.get_or_zero(Metric::Visitors), "", "", 0),
            format_number(s.get_or_zero(Metric::Conversions), "", "", 0),
            format_number(s.get_or_zero(Metric::Revenue), "¥", "", 0),
            format_percent(s.get_or_zero(Metric::Cvr), 2),
        ]);
    }

    let mut devices = TextTable::new(&[
        ("device", Align::Left),
        ("sessions", Align::Right),
        ("share", Align::Right),
        ("cv", Align::Right),
        ("cvr", Align::Right),
    ]);
    for ((name, s), (_, share)) in report.devices.iter().zip(&report.device_share) {
        devices.push_row(vec![
            name.clone(),
            format_number(s.get_or_zero(Metric::Sessions), "", "", 0),
            format_percent(*share, 1),
            format_number(s.get_or_zero(Metric::Conversions), "", "", 0),
            format_percent(s.get_or_zero(Metric::Cvr), 2),
        ]);
    }

    let unit = opts.granularity.display_name();
    PageView {
        page: Page::Traffic,
        caption: report.period.caption(),
        cards,
        sections: vec![
            Section::lines(
                format!("Visitors and sessions ({unit})"),
                vec![report.visitors_trend.clone(), report.sessions_trend.clone()],
                ValueFormat::Count,
            ),
            Section::lines(
                format!("Pageviews ({unit})"),
                vec![report.pageviews_trend.clone()],
                ValueFormat::Count,
            ),
            Section::bars(
                "Sessions by referrer type",
                named_bars(&report.by_referrer_type, Metric::Sessions),
                ValueFormat::Count,
            ),
            Section::bars(
                format!("Top {} referrers by sessions", opts.top_n),
                named_bars(&report.top_referrers, Metric::Sessions),
                ValueFormat::Count,
            ),
            Section::table("Referrer detail", detail),
            Section::table("Devices", devices),
            Section::bars(
                "CVR by device",
                named_bars(&report.devices, Metric::Cvr),
                ValueFormat::Percent,
            ),
            Section::bars(
                format!("Top {} regions by sessions", opts.top_n),
                named_bars(&report.top_regions_by_sessions, Metric::Sessions),
                ValueFormat::Count,
            ),
            Section::bars(
                format!("Top {} regions by revenue", opts.top_n),
                named_bars(&report.top_regions_by_revenue, Metric::Revenue),
                ValueFormat::Yen,
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComparisonMode, DateRange, DeviceRow};
    use crate::report::fixtures::{d, daily_row, dataset, referrer_row};

    fn device(day: u32, name: &str, sessions: f64, conversions: f64) -> DeviceRow {
        DeviceRow {
            date: d(day),
            device: name.to_string(),
            sessions,
            visitors: sessions,
            pageviews: sessions * 3.0,
            conversions,
            revenue: conversions * 1000.0,
            bounce_rate: 0.4,
        }
    }

    #[test]
    fn referrers_and_devices_are_ranked_by_sessions() {
        let mut ds = dataset();
        ds.daily.rows = (6..=12).map(|n| daily_row(n, 1000.0, 20.0, 0.0)).collect();
        ds.referrers.rows = vec![
            referrer_row(10, "Google", "Search", 300.0, 6.0),
            referrer_row(11, "Google", "Search", 300.0, 6.0),
            referrer_row(10, "Direct", "Direct", 400.0, 20.0),
            referrer_row(10, "Twitter", "Social", 50.0, 0.0),
            // outside the range
            referrer_row(1, "Twitter", "Social", 5000.0, 0.0),
        ];
        ds.devices.rows = vec![device(10, "Desktop", 600.0, 12.0), device(10, "Mobile", 400.0, 4.0)];

        let period = Period::new(DateRange::new(d(10), d(12)), ComparisonMode::PreviousWeek);
        let opts = ReportOptions { top_n: 2, ..ReportOptions::default() };
        let report = build_traffic(&ds, &period, &opts);

        assert_eq!(report.totals.get(Metric::Sessions), Some(3000.0));
        let names: Vec<&str> = report.top_referrers.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["Google", "Direct"]);
        assert_eq!(report.by_referrer_type[0].0, "Search");

        assert_eq!(report.device_share[0], ("Desktop".to_string(), 60.0));
        assert_eq!(report.devices[0].1.get(Metric::Cvr), Some(2.0));
    }

    #[test]
    fn weekly_granularity_buckets_by_monday() {
        let mut ds = dataset();
        // 2025-01-06 is a Monday.
        ds.daily.rows = (6..=19).map(|n| daily_row(n, 100.0, 1.0, 0.0)).collect();
        let period = Period::new(DateRange::new(d(6), d(19)), ComparisonMode::PreviousWeek);
        let opts = ReportOptions { granularity: Granularity::Weekly, ..ReportOptions::default() };

        let report = build_traffic(&ds, &period, &opts);
        assert_eq!(report.sessions_trend.points, vec![(d(6), 700.0), (d(13), 700.0)]);

        let view = traffic_view(&report, &opts);
        assert!(view.sections[0].title.contains("weekly"));
    }
}
