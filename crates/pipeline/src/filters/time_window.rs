//! Filter to keep sessions inside the selected time window.
//!
//! Only the time of day is compared; dates were dropped at load time.

use crate::selection::FilterSelection;
use crate::traits::Filter;
use data_loader::Record;

/// Keeps records with `login >= start` and `logout <= end`.
///
/// Whether an inverted window wraps past midnight is decided by
/// the selection's `WindowPolicy`.
pub struct TimeWindowFilter;

impl Filter for TimeWindowFilter {
    fn name(&self) -> &str {
        "TimeWindowFilter"
    }

    fn matches(&self, record: &Record, selection: &FilterSelection) -> bool {
        selection
            .window
            .contains(record.login_time, record.logout_time, selection.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_support::record;
    use crate::selection::{TimeWindow, WindowPolicy};
    use chrono::NaiveTime;

    fn window(start: (u32, u32), end: (u32, u32)) -> TimeWindow {
        TimeWindow::new(
            NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        )
    }

    #[test]
    fn test_time_window_filter() {
        let records = [
            record(1, (8, 0), (9, 0), 0),
            record(2, (5, 30), (7, 0), 0),  // starts too early
            record(3, (22, 0), (23, 59), 0), // ends exactly at the bound
            record(4, (23, 0), (0, 30), 0), // crosses midnight; 00:30 <= 23:59
        ];
        let selection = FilterSelection::new(TimeWindow::default());

        let filtered = TimeWindowFilter.apply(records.iter().collect(), &selection);
        let ids: Vec<u64> = filtered.iter().map(|r| r.npi).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn test_overnight_window_needs_wrap_policy() {
        let after_midnight = record(4, (0, 30), (1, 0), 0);
        let strict = FilterSelection::new(window((22, 0), (1, 0)));
        let wrapping = strict.with_policy(WindowPolicy::WrapMidnight);

        assert!(!TimeWindowFilter.matches(&after_midnight, &strict));
        assert!(TimeWindowFilter.matches(&after_midnight, &wrapping));
    }
}
