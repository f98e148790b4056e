//! Seeded sample-data generator for the seven dashboard tables.
//!
//! Daily totals are drawn first; every dimension table is derived from the
//! day's totals with fixed weights and per-dimension CVR factors, so the
//! breakdowns stay roughly consistent with the summary.

use std::fs::{self, File};
use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::Serialize;

use crate::domain::{DailyRow, DeviceRow, FunnelRow, PageRow, ProductRow, ReferrerRow, RegionRow};
use crate::error::AppError;
use crate::io::TableKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub days: u32,
    pub end_date: NaiveDate,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            days: 90,
            end_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleTables {
    pub daily: Vec<DailyRow>,
    pub pages: Vec<PageRow>,
    pub referrers: Vec<ReferrerRow>,
    pub devices: Vec<DeviceRow>,
    pub regions: Vec<RegionRow>,
    pub products: Vec<ProductRow>,
    pub funnel: Vec<FunnelRow>,
}

struct PageSpec {
    name: &'static str,
    url: &'static str,
    category: &'static str,
    weight: f64,
}

const PAGES: [PageSpec; 12] = [
    PageSpec { name: "Home", url: "/", category: "Top", weight: 0.25 },
    PageSpec { name: "Product list", url: "/products", category: "Products", weight: 0.18 },
    PageSpec { name: "Product: Smartphone", url: "/products/smartphone", category: "Products", weight: 0.12 },
    PageSpec { name: "Product: Laptop", url: "/products/laptop", category: "Products", weight: 0.10 },
    PageSpec { name: "Product: Tablet", url: "/products/tablet", category: "Products", weight: 0.06 },
    PageSpec { name: "Product: Earphones", url: "/products/earphone", category: "Products", weight: 0.05 },
    PageSpec { name: "Cart", url: "/cart", category: "Conversion", weight: 0.08 },
    PageSpec { name: "Checkout", url: "/checkout", category: "Conversion", weight: 0.04 },
    PageSpec { name: "Order complete", url: "/thanks", category: "Conversion", weight: 0.03 },
    PageSpec { name: "About", url: "/about", category: "Other", weight: 0.03 },
    PageSpec { name: "Contact", url: "/contact", category: "Other", weight: 0.02 },
    PageSpec { name: "Search results", url: "/search", category: "Search", weight: 0.04 },
];

/// `(referrer, referrer_type, weight)`
const REFERRERS: [(&str, &str, f64); 12] = [
    ("google", "Organic Search", 0.30),
    ("yahoo", "Organic Search", 0.10),
    ("bing", "Organic Search", 0.03),
    ("facebook", "Social", 0.05),
    ("twitter", "Social", 0.04),
    ("instagram", "Social", 0.06),
    ("line", "Social", 0.04),
    ("google_ads", "Paid Search", 0.12),
    ("yahoo_ads", "Paid Search", 0.05),
    ("direct", "Direct", 0.12),
    ("email", "Email", 0.05),
    ("affiliate", "Affiliate", 0.04),
];

/// `(device, weight, cvr_factor)`
const DEVICES: [(&str, f64, f64); 3] = [
    ("desktop", 0.35, 1.3),
    ("mobile", 0.55, 0.85),
    ("tablet", 0.10, 1.0),
];

const REGIONS: [(&str, f64); 10] = [
    ("Tokyo", 0.25),
    ("Osaka", 0.12),
    ("Kanagawa", 0.10),
    ("Aichi", 0.08),
    ("Fukuoka", 0.06),
    ("Hokkaido", 0.05),
    ("Saitama", 0.07),
    ("Chiba", 0.06),
    ("Hyogo", 0.05),
    ("Other", 0.16),
];

/// `(id, name, category, unit_price, weight)`
const PRODUCTS: [(&str, &str, &str, f64, f64); 7] = [
    ("SP001", "Smartphone Pro", "Smartphone", 89_800.0, 0.25),
    ("SP002", "Smartphone Lite", "Smartphone", 49_800.0, 0.15),
    ("LP001", "Laptop 15-inch", "Laptop", 129_800.0, 0.20),
    ("LP002", "Laptop 13-inch", "Laptop", 98_000.0, 0.12),
    ("TB001", "Tablet 10-inch", "Tablet", 59_800.0, 0.10),
    ("EP001", "Wireless Earphones", "Earphones", 19_800.0, 0.10),
    ("EP002", "Noise-Cancelling Earphones", "Earphones", 34_800.0, 0.08),
];

const FUNNEL_STEPS: [&str; 4] = ["Product View", "Add to Cart", "Checkout Started", "Purchase"];

fn referrer_cvr_factor(referrer_type: &str) -> f64 {
    match referrer_type {
        "Paid Search" => 1.3,
        "Email" => 1.5,
        "Organic Search" => 1.0,
        "Direct" => 1.2,
        _ => 0.8,
    }
}

/// Weekend traffic lift.
fn weekday_factor(date: NaiveDate) -> f64 {
    match date.weekday() {
        Weekday::Sat | Weekday::Sun => 1.3,
        _ => 1.0,
    }
}

/// Year-end shopping season and new-year sales.
fn season_factor(date: NaiveDate) -> f64 {
    match date.month() {
        11 | 12 => 1.4,
        1 => 1.2,
        _ => 1.0,
    }
}

fn too_many_days() -> AppError {
    AppError::input("Sample day count is too large for --end-date.")
}

fn round_to(v: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (v * scale).round() / scale
}

/// Generate every table for `config.days` days ending at `config.end_date`.
pub fn generate_sample(config: &GeneratorConfig) -> Result<SampleTables, AppError> {
    if config.days == 0 {
        return Err(AppError::input("Sample day count must be > 0."));
    }
    let start = config
        .end_date
        .checked_sub_signed(Duration::days(i64::from(config.days) - 1))
        .ok_or_else(too_many_days)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let visitors_dist = Normal::new(5000.0, 800.0)
        .map_err(|e| AppError::runtime(format!("Visitor distribution error: {e}")))?;
    let aov_dist = Normal::new(45_000.0, 15_000.0)
        .map_err(|e| AppError::runtime(format!("Order value distribution error: {e}")))?;

    let mut out = SampleTables::default();
    for offset in 0..config.days {
        let date = start
            .checked_add_signed(Duration::days(i64::from(offset)))
            .ok_or_else(too_many_days)?;
        let day = daily_row(&mut rng, date, &visitors_dist, &aov_dist);
        push_pages(&mut rng, &day, &mut out.pages);
        push_referrers(&mut rng, &day, &mut out.referrers);
        push_devices(&mut rng, &day, &mut out.devices);
        push_regions(&mut rng, &day, &mut out.regions);
        push_products(&mut rng, &day, &mut out.products);
        push_funnel(&mut rng, &day, &mut out.funnel);
        out.daily.push(day);
    }

    tracing::debug!(seed = config.seed, days = config.days, %start, "sample tables generated");
    Ok(out)
}

fn daily_row(rng: &mut StdRng, date: NaiveDate, visitors_dist: &Normal<f64>, aov_dist: &Normal<f64>) -> DailyRow {
    let season = season_factor(date);
    let visitors = (visitors_dist.sample(rng) * weekday_factor(date) * season).max(0.0).trunc();
    let sessions = (visitors * rng.gen_range(1.2..1.5)).trunc();
    let pageviews = (sessions * rng.gen_range(3.5..5.0)).trunc();

    let cvr = rng.gen_range(0.02..0.04) * season;
    let conversions = (sessions * cvr).trunc();
    let aov = aov_dist.sample(rng).max(0.0);
    let revenue = (conversions * aov).trunc();

    let bounce_rate = rng.gen_range(0.35..0.50);
    let avg_session_duration = rng.gen_range(120.0..300.0);
    let pages_per_session = if sessions > 0.0 { pageviews / sessions } else { 0.0 };

    DailyRow {
        date,
        visitors,
        new_visitors: (visitors * rng.gen_range(0.6..0.75)).trunc(),
        returning_visitors: (visitors * rng.gen_range(0.25..0.4)).trunc(),
        sessions,
        pageviews,
        conversions,
        revenue,
        bounce_rate: round_to(bounce_rate, 4),
        avg_session_duration: round_to(avg_session_duration, 2),
        pages_per_session: round_to(pages_per_session, 2),
    }
}

fn push_pages(rng: &mut StdRng, day: &DailyRow, out: &mut Vec<PageRow>) {
    for page in &PAGES {
        let pageviews = (day.pageviews * page.weight * rng.gen_range(0.8..1.2)).trunc();
        let unique_pageviews = (pageviews * rng.gen_range(0.6..0.85)).trunc();
        let exit_rate = match (page.category, page.url) {
            ("Conversion", "/thanks") => rng.gen_range(0.1..0.3),
            ("Conversion", _) => rng.gen_range(0.2..0.4),
            _ => rng.gen_range(0.25..0.55),
        };
        let avg_time_on_page = rng.gen_range(30.0..180.0);
        out.push(PageRow {
            date: day.date,
            page_name: page.name.to_string(),
            page_url: page.url.to_string(),
            page_category: page.category.to_string(),
            pageviews,
            unique_pageviews,
            avg_time_on_page: round_to(avg_time_on_page, 2),
            exit_rate: round_to(exit_rate, 4),
            entrances: (unique_pageviews * rng.gen_range(0.2..0.5)).trunc(),
        });
    }
}

/// Revenue for `conversions` at the day's average order value.
fn revenue_share(day: &DailyRow, conversions: f64) -> f64 {
    if day.conversions > 0.0 {
        (conversions * (day.revenue / day.conversions)).trunc()
    } else {
        0.0
    }
}

fn day_cvr(day: &DailyRow) -> f64 {
    if day.sessions > 0.0 { day.conversions / day.sessions } else { 0.0 }
}

fn push_referrers(rng: &mut StdRng, day: &DailyRow, out: &mut Vec<ReferrerRow>) {
    for (referrer, referrer_type, weight) in REFERRERS {
        let sessions = (day.sessions * weight * rng.gen_range(0.8..1.2)).trunc();
        let conversions =
            (sessions * day_cvr(day) * referrer_cvr_factor(referrer_type) * rng.gen_range(0.7..1.3)).trunc();
        out.push(ReferrerRow {
            date: day.date,
            referrer: referrer.to_string(),
            referrer_type: referrer_type.to_string(),
            sessions,
            visitors: (sessions * rng.gen_range(0.7..0.9)).trunc(),
            pageviews: (sessions * rng.gen_range(3.0..5.0)).trunc(),
            conversions,
            revenue: revenue_share(day, conversions),
            bounce_rate: round_to(rng.gen_range(0.3..0.55), 4),
        });
    }
}

fn push_devices(rng: &mut StdRng, day: &DailyRow, out: &mut Vec<DeviceRow>) {
    for (device, weight, cvr_factor) in DEVICES {
        let sessions = (day.sessions * weight * rng.gen_range(0.9..1.1)).trunc();
        let conversions = (sessions * day_cvr(day) * cvr_factor).trunc();
        out.push(DeviceRow {
            date: day.date,
            device: device.to_string(),
            sessions,
            visitors: (sessions * rng.gen_range(0.7..0.9)).trunc(),
            pageviews: (sessions * rng.gen_range(3.5..5.5)).trunc(),
            conversions,
            revenue: revenue_share(day, conversions),
            bounce_rate: round_to(rng.gen_range(0.3..0.5), 4),
        });
    }
}

fn push_regions(rng: &mut StdRng, day: &DailyRow, out: &mut Vec<RegionRow>) {
    for (region, weight) in REGIONS {
        let sessions = (day.sessions * weight * rng.gen_range(0.85..1.15)).trunc();
        let conversions = (day.conversions * weight * rng.gen_range(0.8..1.2)).trunc();
        out.push(RegionRow {
            date: day.date,
            region: region.to_string(),
            sessions,
            visitors: (sessions * rng.gen_range(0.7..0.9)).trunc(),
            pageviews: (sessions * rng.gen_range(3.5..5.0)).trunc(),
            conversions,
            revenue: revenue_share(day, conversions),
        });
    }
}

fn push_products(rng: &mut StdRng, day: &DailyRow, out: &mut Vec<ProductRow>) {
    for (id, name, category, unit_price, weight) in PRODUCTS {
        let quantity = (day.conversions * weight * rng.gen_range(0.7..1.3)).trunc();
        out.push(ProductRow {
            date: day.date,
            product_id: id.to_string(),
            product_name: name.to_string(),
            product_category: category.to_string(),
            unit_price,
            quantity,
            revenue: quantity * unit_price,
        });
    }
}

fn push_funnel(rng: &mut StdRng, day: &DailyRow, out: &mut Vec<FunnelRow>) {
    let views = (day.sessions * rng.gen_range(0.6..0.8)).trunc();
    let carts = (views * rng.gen_range(0.15..0.25)).trunc();
    let checkouts = (carts * rng.gen_range(0.5..0.7)).trunc();
    let users = [views, carts, checkouts, day.conversions];

    for (i, step_name) in FUNNEL_STEPS.iter().enumerate() {
        let from_prev = if i > 0 && users[i - 1] > 0.0 {
            round_to(users[i] / users[i - 1], 4)
        } else {
            1.0
        };
        let from_start = if users[0] > 0.0 { round_to(users[i] / users[0], 4) } else { 0.0 };
        out.push(FunnelRow {
            date: day.date,
            step_number: i as u32 + 1,
            step_name: step_name.to_string(),
            users: users[i],
            conversion_rate_from_prev: from_prev,
            conversion_rate_from_start: from_start,
        });
    }
}

/// Write all tables into `dir` (created if needed) under their standard file names.
pub fn write_sample(dir: &Path, tables: &SampleTables) -> Result<(), AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::input(format!("Failed to create output dir '{}': {e}", dir.display())))?;

    write_table(dir, TableKind::Daily, &tables.daily)?;
    write_table(dir, TableKind::Pages, &tables.pages)?;
    write_table(dir, TableKind::Referrers, &tables.referrers)?;
    write_table(dir, TableKind::Devices, &tables.devices)?;
    write_table(dir, TableKind::Regions, &tables.regions)?;
    write_table(dir, TableKind::Products, &tables.products)?;
    write_table(dir, TableKind::Funnel, &tables.funnel)?;
    Ok(())
}

fn write_table<R: Serialize>(dir: &Path, kind: TableKind, rows: &[R]) -> Result<(), AppError> {
    let path = dir.join(kind.file_name());
    let file = File::create(&path)
        .map_err(|e| AppError::input(format!("Failed to create '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to flush '{}': {e}", path.display())))?;
    tracing::info!(path = %path.display(), rows = rows.len(), "sample table written");
    Ok(())
}
