//! Period filter.

use crate::domain::{DateRange, MetricSource};

/// Rows whose date falls inside `range` (both endpoints included), in their
/// original order.
pub fn filter_by_date<R: MetricSource + Clone>(rows: &[R], range: &DateRange) -> Vec<R> {
    rows.iter().filter(|r| range.contains(r.date())).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::domain::RegionRow;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn row(day: u32, region: &str) -> RegionRow {
        RegionRow {
            date: d(day),
            region: region.to_string(),
            sessions: day as f64,
            visitors: 0.0,
            pageviews: 0.0,
            conversions: 0.0,
            revenue: 0.0,
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let rows: Vec<RegionRow> = (1..=10).map(|day| row(day, "Tokyo")).collect();
        let out = filter_by_date(&rows, &DateRange::new(d(3), d(7)));
        let days: Vec<u32> = out.iter().map(|r| r.sessions as u32).collect();
        assert_eq!(days, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn one_day_outside_is_excluded() {
        let rows = vec![row(2, "a"), row(3, "b"), row(7, "c"), row(8, "d")];
        let out = filter_by_date(&rows, &DateRange::new(d(3), d(7)));
        let names: Vec<&str> = out.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn preserves_relative_order() {
        let rows = vec![row(5, "x"), row(4, "y"), row(5, "z"), row(1, "w")];
        let out = filter_by_date(&rows, &DateRange::new(d(4), d(5)));
        let names: Vec<&str> = out.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }

    #[test]
    fn filtering_twice_is_a_no_op() {
        let rows: Vec<RegionRow> = (1..=20).map(|day| row(day, "Osaka")).collect();
        let range = DateRange::new(d(6), d(12));
        let once = filter_by_date(&rows, &range);
        let twice = filter_by_date(&once, &range);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let rows: Vec<RegionRow> = Vec::new();
        assert!(filter_by_date(&rows, &DateRange::single(d(1))).is_empty());
    }
}
