//! Clock adapters.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use crate::domain::foundation::EpochMillis;
use crate::ports::Clock;

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> EpochMillis {
        EpochMillis::from_datetime(Utc::now())
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    millis: AtomicI64,
}

impl FixedClock {
    pub fn new(at: EpochMillis) -> Self {
        Self {
            millis: AtomicI64::new(at.as_millis()),
        }
    }

    pub fn set(&self, at: EpochMillis) {
        self.millis.store(at.as_millis(), Ordering::SeqCst);
    }

    pub fn advance_millis(&self, delta: i64) {
        self.millis.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> EpochMillis {
        EpochMillis::new(self.millis.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::MILLIS_PER_DAY;

    #[test]
    fn fixed_clock_moves_only_when_told() {
        let clock = FixedClock::new(EpochMillis::new(1_000));
        assert_eq!(clock.now(), EpochMillis::new(1_000));

        clock.advance_millis(MILLIS_PER_DAY);
        assert_eq!(clock.now(), EpochMillis::new(1_000 + MILLIS_PER_DAY));

        clock.set(EpochMillis::new(5));
        assert_eq!(clock.now(), EpochMillis::new(5));
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now().as_millis() > 1_577_836_800_000);
    }
}
