//! Conversion page: funnel, revenue, products and converting channels.

use crate::domain::{FunnelStep, Metric};
use crate::io::Dataset;
use crate::metrics::{
    MetricSet, aggregate, aggregate_by, daily_series, filter_by_date, funnel_steps, sort_groups, top_groups,
};
use crate::report::format::{Align, TextTable, ValueFormat, format_number, format_percent, kpi_card};
use crate::report::{Page, PageView, Period, ReportOptions, Section, Series, named_bars};

pub const CONVERSION_METRICS: [Metric; 4] = [
    Metric::Conversions,
    Metric::Cvr,
    Metric::Revenue,
    Metric::AverageOrderValue,
];

/// The top-products chart never shows more bars than this.
pub const TOP_PRODUCTS_CHART: usize = 7;

/// Product totals keyed by name, category and unit price.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductLine {
    pub name: String,
    pub category: String,
    pub unit_price: f64,
    pub quantity: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub period: Period,
    pub totals: MetricSet,
    pub previous: MetricSet,
    pub funnel: Vec<FunnelStep>,
    pub revenue_trend: Series,
    pub cvr_trend: Series,
    pub by_category: Vec<(String, MetricSet)>,
    pub top_products: Vec<(String, MetricSet)>,
    /// Sorted by revenue, descending.
    pub products: Vec<ProductLine>,
    pub by_referrer_type: Vec<(String, MetricSet)>,
    /// Per referrer, sorted by revenue, descending.
    pub referrer_revenue: Vec<(String, MetricSet)>,
}

pub fn build_conversion(dataset: &Dataset, period: &Period, opts: &ReportOptions) -> ConversionReport {
    let daily = filter_by_date(&dataset.daily.rows, &period.current);
    let previous = aggregate(&filter_by_date(&dataset.daily.rows, &period.previous));
    let funnel = filter_by_date(&dataset.funnel.rows, &period.current);
    let products = filter_by_date(&dataset.products.rows, &period.current);
    let referrers = filter_by_date(&dataset.referrers.rows, &period.current);

    let mut by_category = aggregate_by(&products, |r| r.product_category.clone());
    sort_groups(&mut by_category, Metric::Revenue, true);

    // Unit prices are grouped in whole cents so the key stays `Ord`.
    let mut lines: Vec<ProductLine> = aggregate_by(&products, |r| {
        (
            r.product_name.clone(),
            r.product_category.clone(),
            (r.unit_price * 100.0).round() as i64,
        )
    })
    .into_iter()
    .map(|((name, category, cents), s)| ProductLine {
        name,
        category,
        unit_price: cents as f64 / 100.0,
        quantity: s.get_or_zero(Metric::Quantity),
        revenue: s.get_or_zero(Metric::Revenue),
    })
    .collect();
    lines.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));

    let mut by_referrer_type = aggregate_by(&referrers, |r| r.referrer_type.clone());
    sort_groups(&mut by_referrer_type, Metric::Conversions, true);
    let mut referrer_revenue = aggregate_by(&referrers, |r| r.referrer.clone());
    sort_groups(&mut referrer_revenue, Metric::Revenue, true);

    ConversionReport {
        period: *period,
        totals: aggregate(&daily),
        previous,
        funnel: funnel_steps(&funnel),
        revenue_trend: Series::new("Revenue", daily_series(&daily, Metric::Revenue)),
        cvr_trend: Series::new("CVR", daily_series(&daily, Metric::Cvr)),
        by_category,
        top_products: top_groups(
            aggregate_by(&products, |r| r.product_name.clone()),
            Metric::Revenue,
            opts.top_n.min(TOP_PRODUCTS_CHART),
        ),
        products: lines,
        by_referrer_type,
        referrer_revenue,
    }
}

pub fn conversion_view(report: &ConversionReport) -> PageView {
    let cards = CONVERSION_METRICS
        .iter()
        .map(|&m| kpi_card(m, &report.totals, &report.previous))
        .collect();

    let mut funnel = TextTable::new(&[
        ("step", Align::Left),
        ("users", Align::Right),
        ("from prev", Align::Right),
        ("from start", Align::Right),
    ]);
    for step in &report.funnel {
        funnel.push_row(vec![
            format!("{}. {}", step.step_number, step.step_name),
            format_number(step.users, "", "", 0),
            format_percent(step.from_previous * 100.0, 1),
            format_percent(step.from_start * 100.0, 1),
        ]);
    }

    let mut products = TextTable::new(&[
        ("product", Align::Left),
        ("category", Align::Left),
        ("unit price", Align::Right),
        ("qty", Align::Right),
        ("revenue", Align::Right),
    ]);
    for p in &report.products {
        products.push_row(vec![
            p.name.clone(),
            p.category.clone(),
            format_number(p.unit_price, "¥", "", 0),
            format_number(p.quantity, "", "", 0),
            format_number(p.revenue, "¥", "", 0),
        ]);
    }

    let mut referrers = TextTable::new(&[
        ("referrer", Align::Left),
        ("sessions", Align::Right),
        ("cv", Align::Right),
        ("revenue", Align::Right),
        ("cvr", Align::Right),
    ]);
    for (name, s) in &report.referrer_revenue {
        referrers.push_row(vec![
            name.clone(),
            format_number(s.get_or_zero(Metric::Sessions), "", "", 0),
            format_number(s.get_or_zero(Metric::Conversions), "", "", 0),
            format_number(s.get_or_zero(Metric::Revenue), "¥", "", 0),
            format_percent(s.get_or_zero(Metric::Cvr), 2),
        ]);
    }

    let mut cvr_by_type = report.by_referrer_type.clone();
    sort_groups(&mut cvr_by_type, Metric::Cvr, true);

    PageView {
        page: Page::Conversion,
        caption: report.period.caption(),
        cards,
        sections: vec![
            Section::table("Purchase funnel", funnel),
            Section::lines("Daily revenue", vec![report.revenue_trend.clone()], ValueFormat::Yen),
            Section::lines("Daily CVR", vec![report.cvr_trend.clone()], ValueFormat::Percent),
            Section::bars(
                "Revenue by product category",
                named_bars(&report.by_category, Metric::Revenue),
                ValueFormat::Yen,
            ),
            Section::bars(
                format!("Top {} products by revenue", report.top_products.len()),
                named_bars(&report.top_products, Metric::Revenue),
                ValueFormat::Yen,
            ),
            Section::table("Product detail", products),
            Section::bars(
                "Conversions by referrer type",
                named_bars(&report.by_referrer_type, Metric::Conversions),
                ValueFormat::Count,
            ),
            Section::bars("CVR by referrer type", named_bars(&cvr_by_type, Metric::Cvr), ValueFormat::Percent),
            Section::table("Revenue by referrer", referrers),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ComparisonMode, DateRange, FunnelRow};
    use crate::report::fixtures::{d, daily_row, dataset, product_row, referrer_row};

    fn step(day: u32, n: u32, name: &str, users: f64) -> FunnelRow {
        FunnelRow {
            date: d(day),
            step_number: n,
            step_name: name.to_string(),
            users,
            conversion_rate_from_prev: 0.0,
            conversion_rate_from_start: 0.0,
        }
    }

    #[test]
    fn conversion_page_groups_products_and_funnel() {
        let mut ds = dataset();
        ds.daily.rows = vec![daily_row(10, 1000.0, 25.0, 1_125_000.0)];
        ds.products.rows = vec![
            product_row(10, "Laptop", "Electronics", 98_000.0, 2.0),
            product_row(10, "Laptop", "Electronics", 98_000.0, 1.0),
            product_row(10, "Mug", "Home", 1_200.0, 10.0),
        ];
        ds.funnel.rows = vec![
            step(10, 1, "Product View", 800.0),
            step(10, 2, "Add to Cart", 160.0),
            step(10, 3, "Checkout", 96.0),
            step(10, 4, "Purchase", 25.0),
        ];
        ds.referrers.rows = vec![
            referrer_row(10, "Google", "Search", 500.0, 10.0),
            referrer_row(10, "Newsletter", "Email", 100.0, 8.0),
        ];

        let period = Period::new(DateRange::single(d(10)), ComparisonMode::PreviousDay);
        let report = build_conversion(&ds, &period, &ReportOptions::default());

        assert_eq!(report.totals.get(Metric::Cvr), Some(2.5));
        assert_eq!(report.totals.get(Metric::AverageOrderValue), Some(45_000.0));

        assert_eq!(report.products.len(), 2);
        assert_eq!(report.products[0].name, "Laptop");
        assert_eq!(report.products[0].quantity, 3.0);
        assert_eq!(report.products[0].unit_price, 98_000.0);

        assert_eq!(report.funnel.len(), 4);
        assert_eq!(report.funnel[1].from_previous, 0.2);
        assert_eq!(report.funnel[3].from_start, 25.0 / 800.0);

        // Email converts at 8%, Search at 2%.
        let view = conversion_view(&report);
        let cvr = view.sections.iter().find(|s| s.title == "CVR by referrer type").unwrap();
        match &cvr.body {
            crate::report::SectionBody::Bars { bars, .. } => assert_eq!(bars[0].0, "Email"),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn top_products_chart_is_capped_at_seven() {
        let mut ds = dataset();
        ds.daily.rows = vec![daily_row(10, 1000.0, 25.0, 1_125_000.0)];
        ds.products.rows = (1..=9)
            .map(|n| product_row(10, &format!("Item {n}"), "Misc", 1_000.0 * n as f64, 1.0))
            .collect();
        let period = Period::new(DateRange::single(d(10)), ComparisonMode::PreviousDay);

        let report = build_conversion(&ds, &period, &ReportOptions::default());
        assert_eq!(report.top_products.len(), TOP_PRODUCTS_CHART);
        assert_eq!(report.top_products[0].0, "Item 9");
        assert_eq!(report.products.len(), 9);

        let narrow = ReportOptions {
            top_n: 3,
            ..ReportOptions::default()
        };
        assert_eq!(build_conversion(&ds, &period, &narrow).top_products.len(), 3);
    }
}
