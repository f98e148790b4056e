//! Row builders shared by the page tests.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::domain::{DailyRow, PageRow, ProductRow, ReferrerRow};
use crate::io::{Dataset, Table, TableKind};

pub fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
}

fn table<R>(kind: TableKind) -> Table<R> {
    Table {
        kind,
        rows: Vec::new(),
        row_errors: Vec::new(),
        rows_read: 0,
        notice: None,
    }
}

pub fn dataset() -> Dataset {
    Dataset {
        data_dir: PathBuf::from("fixtures"),
        daily: table(TableKind::Daily),
        pages: table(TableKind::Pages),
        referrers: table(TableKind::Referrers),
        devices: table(TableKind::Devices),
        regions: table(TableKind::Regions),
        products: table(TableKind::Products),
        funnel: table(TableKind::Funnel),
    }
}

pub fn daily_row(day: u32, sessions: f64, conversions: f64, revenue: f64) -> DailyRow {
    DailyRow {
        date: d(day),
        visitors: sessions * 0.8,
        new_visitors: sessions * 0.5,
        returning_visitors: sessions * 0.3,
        sessions,
        pageviews: sessions * 4.0,
        conversions,
        revenue,
        bounce_rate: 0.4,
        avg_session_duration: 200.0,
        pages_per_session: 4.0,
    }
}

pub fn referrer_row(day: u32, referrer: &str, kind: &str, sessions: f64, conversions: f64) -> ReferrerRow {
    ReferrerRow {
        date: d(day),
        referrer: referrer.to_string(),
        referrer_type: kind.to_string(),
        sessions,
        visitors: sessions * 0.8,
        pageviews: sessions * 4.0,
        conversions,
        revenue: conversions * 45_000.0,
        bounce_rate: 0.4,
    }
}

pub fn page_row(day: u32, name: &str, pageviews: f64, exit_rate: f64, time_on_page: f64) -> PageRow {
    PageRow {
        date: d(day),
        page_name: name.to_string(),
        page_url: format!("/{}", name.to_lowercase()),
        page_category: "Main".to_string(),
        pageviews,
        unique_pageviews: pageviews * 0.8,
        avg_time_on_page: time_on_page,
        exit_rate,
        entrances: pageviews * 0.2,
    }
}

pub fn product_row(day: u32, name: &str, category: &str, unit_price: f64, quantity: f64) -> ProductRow {
    ProductRow {
        date: d(day),
        product_id: format!("P-{name}"),
        product_name: name.to_string(),
        product_category: category.to_string(),
        unit_price,
        quantity,
        revenue: unit_price * quantity,
    }
}
