//! [`Clock`] abstractions.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use crate::DateTime;

/// Source of the current [`DateTime`].
pub trait Clock {
    /// Returns the current [`DateTime`].
    fn now(&self) -> DateTime;
}

/// [`Clock`] reading the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime {
        DateTime::now()
    }
}

/// [`Clock`] which time is moved manually.
///
/// Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<DateTime>>);

impl ManualClock {
    /// Creates a new [`ManualClock`] stopped at the provided [`DateTime`].
    #[must_use]
    pub fn new(at: DateTime) -> Self {
        Self(Arc::new(Mutex::new(at)))
    }

    /// Moves this [`ManualClock`] forward by the provided [`Duration`].
    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *now = *now + by;
    }

    /// Sets this [`ManualClock`] to the provided [`DateTime`].
    pub fn set(&self, at: DateTime) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime {
        (**self).now()
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::{Clock as _, ManualClock};
    use crate::DateTime;

    #[test]
    fn manual_clock_moves_only_when_asked() {
        let start = DateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let clock = ManualClock::new(start);

        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_secs(60));
        assert_eq!(
            clock.now().saturating_duration_since(start),
            Duration::from_secs(60),
        );
    }

    #[test]
    fn clones_share_time() {
        let start = DateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let clock = ManualClock::new(start);
        let other = clock.clone();

        other.advance(Duration::from_secs(11 * 60));
        assert_eq!(clock.now(), other.now());

        clock.set(start);
        assert_eq!(other.now(), start);
    }
}
