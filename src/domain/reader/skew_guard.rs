use chrono::NaiveDate;

/// Tracks the calendar day the upstream reports across the fetches of a
/// single read attempt. A change means the upstream's windows moved under
/// us and the attempt must start over.
#[derive(Debug, Default)]
pub struct SkewGuard {
    last_batch_day: Option<NaiveDate>,
}

impl SkewGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `day` and returns `true` if it differs from the previously
    /// observed day.
    pub fn observe(&mut self, day: NaiveDate) -> bool {
        let rolled_over = self.last_batch_day.is_some_and(|last| last != day);
        self.last_batch_day = Some(day);
        rolled_over
    }

    pub fn last_batch_day(&self) -> Option<NaiveDate> {
        self.last_batch_day
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2017, 6, d).unwrap()
    }

    #[test]
    fn first_observation_never_rolls_over() {
        let mut guard = SkewGuard::new();
        assert!(!guard.observe(day(20)));
        assert_eq!(guard.last_batch_day(), Some(day(20)));
    }

    #[test]
    fn same_day_is_stable() {
        let mut guard = SkewGuard::new();
        guard.observe(day(20));
        assert!(!guard.observe(day(20)));
        assert!(!guard.observe(day(20)));
    }

    #[test]
    fn day_change_is_reported() {
        let mut guard = SkewGuard::new();
        guard.observe(day(20));
        assert!(guard.observe(day(21)));
        assert_eq!(guard.last_batch_day(), Some(day(21)));
    }

    #[test]
    fn same_day_of_month_in_another_month_still_rolls_over() {
        let mut guard = SkewGuard::new();
        guard.observe(day(20));
        assert!(guard.observe(NaiveDate::from_ymd_opt(2017, 7, 20).unwrap()));
    }
}
