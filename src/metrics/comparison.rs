//! Comparison-period and preset resolution.

use chrono::{Duration, NaiveDate};

use crate::domain::{ComparisonMode, DatePreset, DateRange, MetricSource};
use crate::metrics::filter::filter_by_date;

/// The prior range for `current` under `mode`: both endpoints shifted back by
/// a fixed number of days. Never clamped to the available data.
pub fn resolve_comparison(current: &DateRange, mode: ComparisonMode) -> DateRange {
    current.shift_back(mode.offset_days())
}

/// Rows of the comparison period for `current`.
pub fn comparison_rows<R: MetricSource + Clone>(
    rows: &[R],
    current: &DateRange,
    mode: ComparisonMode,
) -> Vec<R> {
    filter_by_date(rows, &resolve_comparison(current, mode))
}

/// Resolve a preset against the data's `(min, max)` dates.
///
/// - `last7`  -> `[max - 6, max]`
/// - `last30` -> `[max - 29, max]`
/// - `all`    -> `[min, max]`
/// - `custom` -> `[from, to]`, a missing endpoint falls back to the data bound
///
/// Returns `None` when the needed bounds are unknown (no data and no explicit dates).
pub fn resolve_preset(
    preset: DatePreset,
    bounds: Option<(NaiveDate, NaiveDate)>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Option<DateRange> {
    match preset {
        DatePreset::Last7 => bounds.map(|(_, max)| DateRange::new(max - Duration::days(6), max)),
        DatePreset::Last30 => bounds.map(|(_, max)| DateRange::new(max - Duration::days(29), max)),
        DatePreset::All => bounds.map(|(min, max)| DateRange::new(min, max)),
        DatePreset::Custom => {
            let start = from.or(bounds.map(|(min, _)| min))?;
            let end = to.or(bounds.map(|(_, max)| max))?;
            Some(DateRange::new(start, end))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn previous_week_shifts_seven_days() {
        let cur = DateRange::new(d(2025, 1, 8), d(2025, 1, 14));
        let prev = resolve_comparison(&cur, ComparisonMode::PreviousWeek);
        assert_eq!(prev, DateRange::new(d(2025, 1, 1), d(2025, 1, 7)));
    }

    #[test]
    fn previous_day_shifts_one_day() {
        let cur = DateRange::single(d(2025, 1, 10));
        let prev = resolve_comparison(&cur, ComparisonMode::PreviousDay);
        assert_eq!(prev, DateRange::single(d(2025, 1, 9)));
    }

    #[test]
    fn previous_month_is_a_fixed_thirty_days() {
        let cur = DateRange::single(d(2025, 1, 15));
        let prev = resolve_comparison(&cur, ComparisonMode::PreviousMonth);
        assert_eq!(prev, DateRange::single(d(2024, 12, 16)));
    }

    #[test]
    fn span_is_preserved() {
        let cur = DateRange::new(d(2025, 3, 1), d(2025, 3, 31));
        for mode in ComparisonMode::ALL {
            assert_eq!(resolve_comparison(&cur, mode).days(), cur.days());
        }
    }

    #[test]
    fn presets_resolve_against_bounds() {
        let bounds = Some((d(2024, 10, 18), d(2025, 1, 15)));
        assert_eq!(
            resolve_preset(DatePreset::Last7, bounds, None, None),
            Some(DateRange::new(d(2025, 1, 9), d(2025, 1, 15)))
        );
        assert_eq!(
            resolve_preset(DatePreset::Last30, bounds, None, None),
            Some(DateRange::new(d(2024, 12, 17), d(2025, 1, 15)))
        );
        assert_eq!(
            resolve_preset(DatePreset::All, bounds, None, None),
            Some(DateRange::new(d(2024, 10, 18), d(2025, 1, 15)))
        );
    }

    #[test]
    fn custom_preset_without_data_needs_both_dates() {
        assert_eq!(resolve_preset(DatePreset::Custom, None, Some(d(2025, 1, 1)), None), None);
        assert_eq!(
            resolve_preset(DatePreset::Custom, None, Some(d(2025, 1, 1)), Some(d(2025, 1, 5))),
            Some(DateRange::new(d(2025, 1, 1), d(2025, 1, 5)))
        );
        assert_eq!(resolve_preset(DatePreset::Last7, None, None, None), None);
    }
}
