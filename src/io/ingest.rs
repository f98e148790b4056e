//! CSV table store.
//!
//! This module turns the dashboard's CSV tables into typed rows.
//!
//! Design goals:
//! - **Never fail the dashboard**: a missing or unusable table becomes an empty
//!   table plus a user-visible notice
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Tolerant headers**: trimmed, case-insensitive, UTF-8 BOM stripped
//! - **Separation of concerns**: no aggregation logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{
    DailyRow, DeviceRow, FunnelRow, PageRow, ProductRow, ReferrerRow, RegionRow,
};

/// The seven tables the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Daily,
    Pages,
    Referrers,
    Devices,
    Regions,
    Products,
    Funnel,
}

impl TableKind {
    pub fn file_name(self) -> &'static str {
        match self {
            TableKind::Daily => "daily_summary.csv",
            TableKind::Pages => "page_metrics.csv",
            TableKind::Referrers => "referrer_metrics.csv",
            TableKind::Devices => "device_metrics.csv",
            TableKind::Regions => "region_metrics.csv",
            TableKind::Products => "product_sales.csv",
            TableKind::Funnel => "conversion_funnel.csv",
        }
    }
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output for one table: rows + what went wrong along the way.
#[derive(Debug, Clone)]
pub struct Table<R> {
    pub kind: TableKind,
    pub rows: Vec<R>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    /// Set when the whole table could not be used (missing file, bad header).
    pub notice: Option<String>,
}

impl<R> Table<R> {
    pub fn empty(kind: TableKind, notice: impl Into<String>) -> Self {
        Self {
            kind,
            rows: Vec::new(),
            row_errors: Vec::new(),
            rows_read: 0,
            notice: Some(notice.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A typed row parsed from one CSV record.
pub trait FromRecord: Sized {
    const KIND: TableKind;
    /// Columns that must exist in the header for the table to be usable.
    const COLUMNS: &'static [&'static str];

    fn from_record(record: &RecordView<'_>) -> Result<Self, String>;
}

/// Header-aware accessors over a single CSV record.
pub struct RecordView<'a> {
    record: &'a StringRecord,
    header_map: &'a HashMap<String, usize>,
}

impl<'a> RecordView<'a> {
    pub fn text(&self, name: &str) -> Result<String, String> {
        let idx = self
            .header_map
            .get(name)
            .ok_or_else(|| format!("Missing required column: `{name}`"))?;
        self.record
            .get(*idx)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| format!("Missing required value: `{name}`"))
    }

    pub fn date(&self, name: &str) -> Result<NaiveDate, String> {
        parse_date(&self.text(name)?)
    }

    /// A finite, non-negative number.
    pub fn number(&self, name: &str) -> Result<f64, String> {
        let raw = self.text(name)?;
        let v = raw
            .replace(',', "")
            .parse::<f64>()
            .map_err(|_| format!("Invalid number in `{name}`: '{raw}'"))?;
        if !v.is_finite() || v < 0.0 {
            return Err(format!("`{name}` must be finite and >= 0 (got {raw})."));
        }
        Ok(v)
    }

    pub fn count(&self, name: &str) -> Result<u32, String> {
        let v = self.number(name)?;
        if v.fract() != 0.0 || v > u32::MAX as f64 {
            return Err(format!("`{name}` must be a whole number (got {v})."));
        }
        Ok(v as u32)
    }
}

/// Load one table from `data_dir`. Never fails: problems become a notice.
pub fn load_table<R: FromRecord>(data_dir: &Path) -> Table<R> {
    let path = data_dir.join(R::KIND.file_name());
    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "table unavailable");
            return Table::empty(R::KIND, format!("File not found: {} ({e})", path.display()));
        }
    };

    let table = read_table::<R, _>(file);
    if let Some(notice) = &table.notice {
        tracing::warn!(path = %path.display(), %notice, "table unusable");
    } else {
        tracing::debug!(
            path = %path.display(),
            rows = table.rows.len(),
            skipped = table.row_errors.len(),
            "table loaded"
        );
    }
    for err in table.row_errors.iter().take(5) {
        tracing::warn!(file = R::KIND.file_name(), line = err.line, message = %err.message, "row skipped");
    }
    table
}

/// Parse a table from any reader (header row required).
pub fn read_table<R: FromRecord, Rd: Read>(input: Rd) -> Table<R> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = match reader.headers() {
        Ok(h) => h.clone(),
        Err(e) => return Table::empty(R::KIND, format!("Failed to read CSV headers: {e}")),
    };
    let header_map = build_header_map(&headers);

    let missing: Vec<&str> = R::COLUMNS
        .iter()
        .copied()
        .filter(|c| !header_map.contains_key(*c))
        .collect();
    if !missing.is_empty() {
        return Table::empty(
            R::KIND,
            format!(
                "{}: missing required column(s): {}",
                R::KIND.file_name(),
                missing.join(", ")
            ),
        );
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let view = RecordView {
            record: &record,
            header_map: &header_map,
        };
        match R::from_record(&view) {
            Ok(row) => rows.push(row),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    Table {
        kind: R::KIND,
        rows,
        row_errors,
        rows_read,
        notice: None,
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet tools often emit UTF-8 CSVs with a BOM before the first
    // header (e.g. "\u{feff}date"); without stripping it `date` looks missing.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // A time component ("2025-01-15 00:00:00" / "2025-01-15T00:00:00") is ignored.
    let day = s.split(['T', ' ']).next().unwrap_or(s);
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(day, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, YYYY/MM/DD, DD/MM/YYYY, DD-MM-YYYY."
    ))
}

impl FromRecord for DailyRow {
    const KIND: TableKind = TableKind::Daily;
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "visitors",
        "new_visitors",
        "returning_visitors",
        "sessions",
        "pageviews",
        "conversions",
        "revenue",
        "bounce_rate",
        "avg_session_duration",
        "pages_per_session",
    ];

    fn from_record(r: &RecordView<'_>) -> Result<Self, String> {
        Ok(DailyRow {
            date: r.date("date")?,
            visitors: r.number("visitors")?,
            new_visitors: r.number("new_visitors")?,
            returning_visitors: r.number("returning_visitors")?,
            sessions: r.number("sessions")?,
            pageviews: r.number("pageviews")?,
            conversions: r.number("conversions")?,
            revenue: r.number("revenue")?,
            bounce_rate: r.number("bounce_rate")?,
            avg_session_duration: r.number("avg_session_duration")?,
            pages_per_session: r.number("pages_per_session")?,
        })
    }
}

impl FromRecord for PageRow {
    const KIND: TableKind = TableKind::Pages;
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "page_name",
        "page_url",
        "page_category",
        "pageviews",
        "unique_pageviews",
        "avg_time_on_page",
        "exit_rate",
        "entrances",
    ];

    fn from_record(r: &RecordView<'_>) -> Result<Self, String> {
        Ok(PageRow {
            date: r.date("date")?,
            page_name: r.text("page_name")?,
            page_url: r.text("page_url")?,
            page_category: r.text("page_category")?,
            pageviews: r.number("pageviews")?,
            unique_pageviews: r.number("unique_pageviews")?,
            avg_time_on_page: r.number("avg_time_on_page")?,
            exit_rate: r.number("exit_rate")?,
            entrances: r.number("entrances")?,
        })
    }
}

impl FromRecord for ReferrerRow {
    const KIND: TableKind = TableKind::Referrers;
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "referrer",
        "referrer_type",
        "sessions",
        "visitors",
        "pageviews",
        "conversions",
        "revenue",
        "bounce_rate",
    ];

    fn from_record(r: &RecordView<'_>) -> Result<Self, String> {
        Ok(ReferrerRow {
            date: r.date("date")?,
            referrer: r.text("referrer")?,
            referrer_type: r.text("referrer_type")?,
            sessions: r.number("sessions")?,
            visitors: r.number("visitors")?,
            pageviews: r.number("pageviews")?,
            conversions: r.number("conversions")?,
            revenue: r.number("revenue")?,
            bounce_rate: r.number("bounce_rate")?,
        })
    }
}

impl FromRecord for DeviceRow {
    const KIND: TableKind = TableKind::Devices;
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "device",
        "sessions",
        "visitors",
        "pageviews",
        "conversions",
        "revenue",
        "bounce_rate",
    ];

    fn from_record(r: &RecordView<'_>) -> Result<Self, String> {
        Ok(DeviceRow {
            date: r.date("date")?,
            device: r.text("device")?,
            sessions: r.number("sessions")?,
            visitors: r.number("visitors")?,
            pageviews: r.number("pageviews")?,
            conversions: r.number("conversions")?,
            revenue: r.number("revenue")?,
            bounce_rate: r.number("bounce_rate")?,
        })
    }
}

impl FromRecord for RegionRow {
    const KIND: TableKind = TableKind::Regions;
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "region",
        "sessions",
        "visitors",
        "pageviews",
        "conversions",
        "revenue",
    ];

    fn from_record(r: &RecordView<'_>) -> Result<Self, String> {
        Ok(RegionRow {
            date: r.date("date")?,
            region: r.text("region")?,
            sessions: r.number("sessions")?,
            visitors: r.number("visitors")?,
            pageviews: r.number("pageviews")?,
            conversions: r.number("conversions")?,
            revenue: r.number("revenue")?,
        })
    }
}

impl FromRecord for ProductRow {
    const KIND: TableKind = TableKind::Products;
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "product_id",
        "product_name",
        "product_category",
        "unit_price",
        "quantity",
        "revenue",
    ];

    fn from_record(r: &RecordView<'_>) -> Result<Self, String> {
        Ok(ProductRow {
            date: r.date("date")?,
            product_id: r.text("product_id")?,
            product_name: r.text("product_name")?,
            product_category: r.text("product_category")?,
            unit_price: r.number("unit_price")?,
            quantity: r.number("quantity")?,
            revenue: r.number("revenue")?,
        })
    }
}

impl FromRecord for FunnelRow {
    const KIND: TableKind = TableKind::Funnel;
    const COLUMNS: &'static [&'static str] = &[
        "date",
        "step_number",
        "step_name",
        "users",
        "conversion_rate_from_prev",
        "conversion_rate_from_start",
    ];

    fn from_record(r: &RecordView<'_>) -> Result<Self, String> {
        Ok(FunnelRow {
            date: r.date("date")?,
            step_number: r.count("step_number")?,
            step_name: r.text("step_name")?,
            users: r.number("users")?,
            conversion_rate_from_prev: r.number("conversion_rate_from_prev")?,
            conversion_rate_from_start: r.number("conversion_rate_from_start")?,
        })
    }
}

/// Every table the dashboard pages read, loaded once per session.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub data_dir: PathBuf,
    pub daily: Table<DailyRow>,
    pub pages: Table<PageRow>,
    pub referrers: Table<ReferrerRow>,
    pub devices: Table<DeviceRow>,
    pub regions: Table<RegionRow>,
    pub products: Table<ProductRow>,
    pub funnel: Table<FunnelRow>,
}

impl Dataset {
    pub fn load(data_dir: &Path) -> Self {
        let dataset = Self {
            data_dir: data_dir.to_path_buf(),
            daily: load_table(data_dir),
            pages: load_table(data_dir),
            referrers: load_table(data_dir),
            devices: load_table(data_dir),
            regions: load_table(data_dir),
            products: load_table(data_dir),
            funnel: load_table(data_dir),
        };
        tracing::info!(
            data_dir = %data_dir.display(),
            daily_rows = dataset.daily.rows.len(),
            notices = dataset.notices().len(),
            "dataset loaded"
        );
        dataset
    }

    /// Min and max date of the daily table (drives the date presets).
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.daily.rows.iter().map(|r| r.date).min()?;
        let max = self.daily.rows.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    /// User-facing messages about missing tables and skipped rows.
    pub fn notices(&self) -> Vec<String> {
        let mut out = Vec::new();
        push_notices(&mut out, &self.daily);
        push_notices(&mut out, &self.pages);
        push_notices(&mut out, &self.referrers);
        push_notices(&mut out, &self.devices);
        push_notices(&mut out, &self.regions);
        push_notices(&mut out, &self.products);
        push_notices(&mut out, &self.funnel);
        out
    }
}

fn push_notices<R>(out: &mut Vec<String>, table: &Table<R>) {
    if let Some(notice) = &table.notice {
        out.push(notice.clone());
    }
    if let Some(first) = table.row_errors.first() {
        out.push(format!(
            "{}: skipped {} of {} row(s) (first: line {}: {})",
            table.kind.file_name(),
            table.row_errors.len(),
            table.rows_read,
            first.line,
            first.message
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAILY_HEADER: &str = "date,visitors,new_visitors,returning_visitors,sessions,pageviews,conversions,revenue,bounce_rate,avg_session_duration,pages_per_session";

    #[test]
    fn parses_daily_rows_with_bom_and_mixed_case_headers() {
        let csv = format!(
            "\u{feff}{}\n2025-01-14,5000,3200,1600,6500,26000,150,6750000,0.41,180.5,4.0\n",
            DAILY_HEADER.to_uppercase()
        );
        let table: Table<DailyRow> = read_table(csv.as_bytes());
        assert!(table.notice.is_none());
        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2025, 1, 14).unwrap());
        assert_eq!(row.sessions, 6500.0);
        assert_eq!(row.bounce_rate, 0.41);
    }

    #[test]
    fn bad_rows_are_skipped_with_line_numbers() {
        let csv = format!(
            "{DAILY_HEADER}\n\
             2025-01-14,5000,3200,1600,6500,26000,150,6750000,0.41,180.5,4.0\n\
             not-a-date,1,1,1,1,1,1,1,0.4,100,1\n\
             2025-01-15,-5,1,1,1,1,1,1,0.4,100,1\n\
             2025-01-16,10,1,1,1,1,1,1,0.4,100,1\n"
        );
        let table: Table<DailyRow> = read_table(csv.as_bytes());
        assert_eq!(table.rows_read, 4);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.row_errors.len(), 2);
        assert_eq!(table.row_errors[0].line, 3);
        assert_eq!(table.row_errors[1].line, 4);
    }

    #[test]
    fn missing_column_makes_table_empty_with_notice() {
        let csv = "date,visitors\n2025-01-14,5000\n";
        let table: Table<DailyRow> = read_table(csv.as_bytes());
        assert!(table.is_empty());
        let notice = table.notice.unwrap();
        assert!(notice.contains("sessions"), "{notice}");
    }

    #[test]
    fn dates_accept_common_formats_and_ignore_time() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        for s in ["2025-01-15", "2025/01/15", "15/01/2025", "15-01-2025", "2025-01-15 00:00:00"] {
            assert_eq!(parse_date(s).unwrap(), expected, "{s}");
        }
        assert!(parse_date("Jan 15").is_err());
    }

    #[test]
    fn missing_file_is_an_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let table: Table<ReferrerRow> = load_table(dir.path());
        assert!(table.is_empty());
        assert!(table.notice.unwrap().contains("referrer_metrics.csv"));
    }

    #[test]
    fn dataset_reports_bounds_and_notices() {
        let dir = tempfile::tempdir().unwrap();
        let csv = format!(
            "{DAILY_HEADER}\n\
             2025-01-10,1,1,1,1,1,1,1,0.4,100,1\n\
             2025-01-03,1,1,1,1,1,1,1,0.4,100,1\n"
        );
        std::fs::write(dir.path().join("daily_summary.csv"), csv).unwrap();

        let ds = Dataset::load(dir.path());
        let (min, max) = ds.date_bounds().unwrap();
        assert_eq!(min, NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
        assert_eq!(max, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
        // Six other tables are missing.
        assert_eq!(ds.notices().len(), 6);
    }

    #[test]
    fn funnel_step_number_must_be_whole() {
        let csv = "date,step_number,step_name,users,conversion_rate_from_prev,conversion_rate_from_start\n\
                   2025-01-01,1,Product View,100,1.0,1.0\n\
                   2025-01-01,1.5,Add to Cart,20,0.2,0.2\n";
        let table: Table<FunnelRow> = read_table(csv.as_bytes());
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.row_errors.len(), 1);
    }
}
