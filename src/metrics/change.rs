//! Current-vs-previous change calculation.

use crate::domain::{ChangeResult, Metric};
use crate::metrics::aggregate::MetricSet;

/// Absolute and percentage change from `previous` to `current`.
///
/// A zero `previous` reports "no change" (`0, 0, true`) rather than an
/// infinite percentage. No rounding happens here.
pub fn change(current: f64, previous: f64) -> ChangeResult {
    if previous == 0.0 {
        return ChangeResult {
            delta: 0.0,
            delta_pct: 0.0,
            is_positive: true,
        };
    }

    let delta = current - previous;
    ChangeResult {
        delta,
        delta_pct: delta / previous * 100.0,
        is_positive: delta >= 0.0,
    }
}

/// Change for one metric across two sets; `None` when either side has no data.
pub fn metric_change(current: &MetricSet, previous: &MetricSet, metric: Metric) -> Option<ChangeResult> {
    Some(change(current.get(metric)?, previous.get(metric)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DailyRow;
    use crate::metrics::aggregate::aggregate;

    #[test]
    fn zero_previous_is_no_change() {
        let c = change(500.0, 0.0);
        assert_eq!(c, ChangeResult { delta: 0.0, delta_pct: 0.0, is_positive: true });
    }

    #[test]
    fn increase_and_decrease() {
        assert_eq!(
            change(120.0, 100.0),
            ChangeResult { delta: 20.0, delta_pct: 20.0, is_positive: true }
        );
        assert_eq!(
            change(80.0, 100.0),
            ChangeResult { delta: -20.0, delta_pct: -20.0, is_positive: false }
        );
    }

    #[test]
    fn unchanged_counts_as_positive() {
        let c = change(42.0, 42.0);
        assert_eq!(c.delta, 0.0);
        assert!(c.is_positive);
    }

    #[test]
    fn metric_change_skips_missing_rates() {
        let empty: Vec<DailyRow> = Vec::new();
        let set = aggregate(&empty);
        assert_eq!(metric_change(&set, &set, Metric::BounceRate), None);
        assert_eq!(
            metric_change(&set, &set, Metric::Visitors),
            Some(ChangeResult { delta: 0.0, delta_pct: 0.0, is_positive: true })
        );
    }
}
