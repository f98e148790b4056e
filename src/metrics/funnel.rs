//! Conversion funnel aggregation.

use std::collections::BTreeMap;

use crate::domain::{FunnelRow, FunnelStep};
use crate::metrics::aggregate::ratio;

/// Sum users per `(step_number, step_name)` and derive the step ratios.
///
/// - `from_previous`: 1.0 for the first step, 0 when the previous step is empty
/// - `from_start`: 0 when the first step is empty
pub fn funnel_steps(rows: &[FunnelRow]) -> Vec<FunnelStep> {
    let mut totals: BTreeMap<(u32, &str), f64> = BTreeMap::new();
    for r in rows {
        *totals.entry((r.step_number, r.step_name.as_str())).or_insert(0.0) += r.users;
    }

    let mut steps: Vec<FunnelStep> = Vec::with_capacity(totals.len());
    let mut first_users = None;
    let mut prev_users = None;

    for ((step_number, step_name), users) in totals {
        let first = *first_users.get_or_insert(users);
        let from_previous = match prev_users {
            None => 1.0,
            Some(prev) => ratio(users, prev),
        };
        steps.push(FunnelStep {
            step_number,
            step_name: step_name.to_string(),
            users,
            from_previous,
            from_start: ratio(users, first),
        });
        prev_users = Some(users);
    }

    steps
}
