//! Trial arithmetic over canonical instants.
//!
//! Two rounding rules coexist here on purpose. The detailed breakdown used
//! for countdown banners floors every component, while the single
//! days-remaining figure reported by the resolver rounds up so that any
//! partial day counts as a whole one.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EpochMillis, MILLIS_PER_DAY, MILLIS_PER_HOUR, MILLIS_PER_MINUTE};

/// `start + days * 1d + minutes * 1min`.
pub fn compute_end_instant(start: EpochMillis, days: u32, minutes: u32) -> EpochMillis {
    start.plus_days(days as i64).plus_minutes(minutes as i64)
}

/// Floor breakdown of the time left before a trial ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrialRemaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl TrialRemaining {
    pub const ZERO: TrialRemaining = TrialRemaining {
        days: 0,
        hours: 0,
        minutes: 0,
    };

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Time left until `end`. Never negative: an ended trial reports all zeros.
pub fn remaining(end: EpochMillis, now: EpochMillis) -> TrialRemaining {
    let diff = now.millis_until(end);
    if diff <= 0 {
        return TrialRemaining::ZERO;
    }
    TrialRemaining {
        days: diff / MILLIS_PER_DAY,
        hours: (diff % MILLIS_PER_DAY) / MILLIS_PER_HOUR,
        minutes: (diff % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE,
    }
}

/// Whole days left, rounding any partial day up.
pub fn days_remaining_ceil(end: EpochMillis, now: EpochMillis) -> i64 {
    let diff = now.millis_until(end);
    let whole = diff.div_euclid(MILLIS_PER_DAY);
    if diff.rem_euclid(MILLIS_PER_DAY) == 0 {
        whole
    } else {
        whole + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NOW: EpochMillis = EpochMillis::new(1_700_000_000_000);

    #[test]
    fn end_instant_adds_days_and_minutes() {
        let end = compute_end_instant(NOW, 14, 30);
        assert_eq!(NOW.millis_until(end), 14 * 86_400_000 + 30 * 60_000);
    }

    #[test]
    fn remaining_breaks_down_with_floor() {
        let end = NOW.plus_millis(2 * MILLIS_PER_DAY + 5 * MILLIS_PER_HOUR + 7 * MILLIS_PER_MINUTE + 59_999);
        assert_eq!(
            remaining(end, NOW),
            TrialRemaining {
                days: 2,
                hours: 5,
                minutes: 7
            }
        );
    }

    #[test]
    fn remaining_is_zero_once_ended() {
        assert!(remaining(NOW, NOW).is_zero());
        assert!(remaining(NOW.plus_millis(-1), NOW).is_zero());
    }

    #[test]
    fn ceiling_counts_partial_day() {
        let end = NOW.plus_millis((4.2 * MILLIS_PER_DAY as f64) as i64);
        assert_eq!(days_remaining_ceil(end, NOW), 5);
        assert_eq!(days_remaining_ceil(NOW.plus_days(3), NOW), 3);
        assert_eq!(days_remaining_ceil(NOW.plus_millis(1), NOW), 1);
    }

    #[test]
    fn floor_and_ceiling_differ_for_partial_days() {
        let end = NOW.plus_millis(MILLIS_PER_DAY + MILLIS_PER_HOUR);
        assert_eq!(remaining(end, NOW).days, 1);
        assert_eq!(days_remaining_ceil(end, NOW), 2);
    }

    proptest! {
        #[test]
        fn end_instant_is_exact(days in 0u32..10_000, minutes in 0u32..10_000) {
            let end = compute_end_instant(NOW, days, minutes);
            prop_assert_eq!(
                NOW.millis_until(end),
                days as i64 * MILLIS_PER_DAY + minutes as i64 * MILLIS_PER_MINUTE
            );
        }

        #[test]
        fn breakdown_components_stay_in_range(diff in 1i64..(400 * MILLIS_PER_DAY)) {
            let r = remaining(NOW.plus_millis(diff), NOW);
            prop_assert!(r.hours >= 0 && r.hours < 24);
            prop_assert!(r.minutes >= 0 && r.minutes < 60);
            prop_assert!(r.days * MILLIS_PER_DAY + r.hours * MILLIS_PER_HOUR + r.minutes * MILLIS_PER_MINUTE <= diff);
        }

        #[test]
        fn ceiling_is_floor_or_floor_plus_one(diff in 1i64..(400 * MILLIS_PER_DAY)) {
            let end = NOW.plus_millis(diff);
            let floor = remaining(end, NOW).days;
            let ceil = days_remaining_ceil(end, NOW);
            prop_assert!(ceil == floor || ceil == floor + 1);
            prop_assert!(ceil >= 1);
        }

        #[test]
        fn ended_trials_never_report_negative(diff in -(400 * MILLIS_PER_DAY)..=0i64) {
            prop_assert!(remaining(NOW.plus_millis(diff), NOW).is_zero());
        }
    }
}
