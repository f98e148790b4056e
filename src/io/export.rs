//! Export the KPI summary to CSV or JSON.
//!
//! The CSV is one row per KPI so it drops straight into a spreadsheet; the JSON
//! carries the full summary (both metric sets, per-KPI changes, daily rows).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::AppError;
use crate::report::summary::SummaryReport;

#[derive(Debug, Serialize)]
struct KpiExportRow<'a> {
    metric: &'a str,
    current: Option<f64>,
    previous: Option<f64>,
    delta: Option<f64>,
    delta_pct: Option<f64>,
    is_positive: Option<bool>,
}

/// Write one row per summary KPI.
pub fn write_summary_csv(path: &Path, report: &SummaryReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_summary_csv_to(file, report)?;
    tracing::info!(path = %path.display(), rows = report.kpis.len(), "summary CSV written");
    Ok(())
}

pub fn write_summary_csv_to<W: Write>(out: W, report: &SummaryReport) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    for kpi in &report.kpis {
        writer
            .serialize(KpiExportRow {
                metric: kpi.metric.key(),
                current: kpi.current,
                previous: kpi.previous,
                delta: kpi.change.map(|c| c.delta),
                delta_pct: kpi.change.map(|c| c.delta_pct),
                is_positive: kpi.change.map(|c| c.is_positive),
            })
            .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to flush export CSV: {e}")))
}

/// Write the whole summary report as pretty JSON.
pub fn write_summary_json(path: &Path, report: &SummaryReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create export JSON '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|e| AppError::input(format!("Failed to write export JSON: {e}")))?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|e| AppError::input(format!("Failed to write export JSON: {e}")))?;
    tracing::info!(path = %path.display(), "summary JSON written");
    Ok(())
}
