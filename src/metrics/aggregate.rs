//! Metrics aggregation: sums, means and derived ratios.
//!
//! Empty-input conventions:
//! - additive metrics are always present and sum to 0
//! - rate metrics are absent when no row carried a value ("no data")
//! - `cvr` is 0 when sessions are 0, `average_order_value` is 0 when conversions are 0

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{Metric, MetricSource};

/// Named scalars reduced from a set of rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricSet {
    values: BTreeMap<Metric, f64>,
}

impl MetricSet {
    /// `None` means "no data" (only possible for rate metrics).
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    /// The value, treating "no data" as 0. Use for sorting and sums only.
    pub fn get_or_zero(&self, metric: Metric) -> f64 {
        self.get(metric).unwrap_or(0.0)
    }
}

/// Reduce `rows` to a `MetricSet`.
pub fn aggregate<'a, R, I>(rows: I) -> MetricSet
where
    R: MetricSource + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let mut sums = [0.0_f64; Metric::ADDITIVE.len()];
    let mut rate_sums = [0.0_f64; Metric::RATE.len()];
    let mut rate_counts = [0usize; Metric::RATE.len()];

    for row in rows {
        for (i, m) in Metric::ADDITIVE.iter().enumerate() {
            if let Some(v) = row.value(*m) {
                sums[i] += v;
            }
        }
        for (i, m) in Metric::RATE.iter().enumerate() {
            if let Some(v) = row.value(*m) {
                rate_sums[i] += v;
                rate_counts[i] += 1;
            }
        }
    }

    let mut values = BTreeMap::new();
    for (i, m) in Metric::ADDITIVE.iter().enumerate() {
        values.insert(*m, sums[i]);
    }
    for (i, m) in Metric::RATE.iter().enumerate() {
        if rate_counts[i] > 0 {
            values.insert(*m, rate_sums[i] / rate_counts[i] as f64);
        }
    }

    let total = |m: Metric| values.get(&m).copied().unwrap_or(0.0);
    let sessions = total(Metric::Sessions);
    let conversions = total(Metric::Conversions);
    let revenue = total(Metric::Revenue);
    values.insert(Metric::Cvr, ratio(conversions, sessions) * 100.0);
    values.insert(Metric::AverageOrderValue, ratio(revenue, conversions));

    MetricSet { values }
}

/// `num / den`, or 0 when the denominator is 0.
pub fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

/// Reduce `rows` once per group key. Groups come back in key order.
pub fn aggregate_by<R, K, F>(rows: &[R], key: F) -> Vec<(K, MetricSet)>
where
    R: MetricSource,
    K: Ord,
    F: Fn(&R) -> K,
{
    let mut groups: BTreeMap<K, Vec<&R>> = BTreeMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().push(row);
    }
    groups
        .into_iter()
        .map(|(k, members)| (k, aggregate(members.iter().copied())))
        .collect()
}

/// Sort groups by `metric` ("no data" sorts as 0). Ties keep key order.
pub fn sort_groups<K>(groups: &mut [(K, MetricSet)], metric: Metric, descending: bool) {
    groups.sort_by(|a, b| {
        let ord = a
            .1
            .get_or_zero(metric)
            .partial_cmp(&b.1.get_or_zero(metric))
            .unwrap_or(Ordering::Equal);
        if descending { ord.reverse() } else { ord }
    });
}

/// Sort descending by `metric` and keep the first `n` groups.
pub fn top_groups<K>(mut groups: Vec<(K, MetricSet)>, metric: Metric, n: usize) -> Vec<(K, MetricSet)> {
    sort_groups(&mut groups, metric, true);
    groups.truncate(n);
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::domain::{DailyRow, ReferrerRow};

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, n).unwrap()
    }

    fn daily(n: u32, sessions: f64, conversions: f64, revenue: f64, bounce: f64) -> DailyRow {
        DailyRow {
            date: day(n),
            visitors: sessions * 0.8,
            new_visitors: 0.0,
            returning_visitors: 0.0,
            sessions,
            pageviews: sessions * 4.0,
            conversions,
            revenue,
            bounce_rate: bounce,
            avg_session_duration: 180.0,
            pages_per_session: 4.0,
        }
    }

    fn referrer(name: &str, kind: &str, sessions: f64, conversions: f64) -> ReferrerRow {
        ReferrerRow {
            date: day(1),
            referrer: name.to_string(),
            referrer_type: kind.to_string(),
            sessions,
            visitors: sessions,
            pageviews: sessions * 3.0,
            conversions,
            revenue: conversions * 1000.0,
            bounce_rate: 0.4,
        }
    }

    #[test]
    fn empty_input_yields_zeros_and_no_rate_data() {
        let rows: Vec<DailyRow> = Vec::new();
        let set = aggregate(&rows);
        for m in Metric::ADDITIVE {
            assert_eq!(set.get(m), Some(0.0), "{m:?}");
        }
        assert_eq!(set.get(Metric::Cvr), Some(0.0));
        assert_eq!(set.get(Metric::AverageOrderValue), Some(0.0));
        assert_eq!(set.get(Metric::BounceRate), None);
        assert_eq!(set.get(Metric::AvgSessionDuration), None);
    }

    #[test]
    fn cvr_from_summed_sessions_and_conversions() {
        let rows = vec![daily(1, 600.0, 10.0, 0.0, 0.4), daily(2, 400.0, 15.0, 0.0, 0.4)];
        let set = aggregate(&rows);
        assert_eq!(set.get(Metric::Sessions), Some(1000.0));
        assert_eq!(set.get(Metric::Conversions), Some(25.0));
        assert!((set.get(Metric::Cvr).unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn average_order_value_and_zero_conversions() {
        let rows = vec![daily(1, 100.0, 4.0, 200_000.0, 0.4)];
        assert!((aggregate(&rows).get(Metric::AverageOrderValue).unwrap() - 50_000.0).abs() < 1e-9);

        let rows = vec![daily(1, 100.0, 0.0, 5_000.0, 0.4)];
        assert_eq!(aggregate(&rows).get(Metric::AverageOrderValue), Some(0.0));
    }

    #[test]
    fn rate_metrics_use_the_mean() {
        let rows = vec![daily(1, 10.0, 0.0, 0.0, 0.30), daily(2, 90.0, 0.0, 0.0, 0.50)];
        let set = aggregate(&rows);
        assert!((set.get(Metric::BounceRate).unwrap() - 0.40).abs() < 1e-12);
        assert!((set.get(Metric::AvgSessionDuration).unwrap() - 180.0).abs() < 1e-12);
    }

    #[test]
    fn columns_a_table_lacks_stay_absent_for_rates() {
        let rows = vec![referrer("google", "Organic Search", 10.0, 1.0)];
        let set = aggregate(&rows);
        assert_eq!(set.get(Metric::AvgSessionDuration), None);
        assert_eq!(set.get(Metric::NewVisitors), Some(0.0));
    }

    #[test]
    fn group_by_matches_per_group_aggregate() {
        let rows = vec![
            referrer("google", "Organic Search", 100.0, 3.0),
            referrer("facebook", "Social", 50.0, 1.0),
            referrer("yahoo", "Organic Search", 40.0, 2.0),
        ];
        let groups = aggregate_by(&rows, |r| r.referrer_type.clone());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Organic Search");
        assert_eq!(groups[0].1.get(Metric::Sessions), Some(140.0));
        assert_eq!(groups[0].1.get(Metric::Conversions), Some(5.0));
        assert_eq!(groups[1].0, "Social");
        assert!((groups[1].1.get(Metric::Cvr).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn top_groups_sorts_descending_and_truncates() {
        let rows = vec![
            referrer("a", "x", 10.0, 0.0),
            referrer("b", "x", 30.0, 0.0),
            referrer("c", "x", 20.0, 0.0),
        ];
        let top = top_groups(aggregate_by(&rows, |r| r.referrer.clone()), Metric::Sessions, 2);
        let names: Vec<&str> = top.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }
}
