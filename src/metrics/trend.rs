//! Trend series and small statistics helpers.

use chrono::{Datelike, Duration, NaiveDate};

use crate::domain::{Metric, MetricSource};
use crate::metrics::aggregate::{MetricSet, aggregate_by};

/// One value per calendar day present in `rows`, in date order.
///
/// Rows sharing a date (dimension tables) are reduced together first, so this
/// works for any table. Days where `metric` has no data are skipped.
pub fn daily_series<R: MetricSource>(rows: &[R], metric: Metric) -> Vec<(NaiveDate, f64)> {
    series_from_groups(aggregate_by(rows, |r| r.date()), metric)
}

/// Rows reduced per week, keyed by the Monday that starts the week.
pub fn weekly_totals<R: MetricSource>(rows: &[R]) -> Vec<(NaiveDate, MetricSet)> {
    aggregate_by(rows, |r| week_start(r.date()))
}

/// Like [`daily_series`], bucketed by week.
pub fn weekly_series<R: MetricSource>(rows: &[R], metric: Metric) -> Vec<(NaiveDate, f64)> {
    series_from_groups(weekly_totals(rows), metric)
}

pub fn series_from_groups(groups: Vec<(NaiveDate, MetricSet)>, metric: Metric) -> Vec<(NaiveDate, f64)> {
    groups
        .into_iter()
        .filter_map(|(date, set)| set.get(metric).map(|v| (date, v)))
        .collect()
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Linear-interpolation quantile (`q` in `[0, 1]`). `None` for empty input.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
