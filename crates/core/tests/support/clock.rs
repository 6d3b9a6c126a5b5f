//! Pinned mock clock.

use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone};
use chrono_tz::Tz;
use chime_core::session::ports::Clock;

/// A `Clock` that returns a pinned instant until the test moves it.
pub struct MockClock {
    now: Mutex<DateTime<Tz>>,
}

impl MockClock {
    pub fn new(now: DateTime<Tz>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Tz>) {
        *self.now.lock().expect("clock lock") = now;
    }

    pub fn advance(&self, delta: Duration) {
        let mut guard = self.now.lock().expect("clock lock");
        *guard = guard.clone() + delta;
    }
}

impl Clock<Tz> for MockClock {
    fn now(&self) -> DateTime<Tz> {
        self.now.lock().expect("clock lock").clone()
    }
}

/// Pinned helper used by most lifecycle tests: 2026-03-02 (a Monday)
/// 07:00 in New York.
pub fn monday_morning() -> DateTime<Tz> {
    chrono_tz::America::New_York
        .with_ymd_and_hms(2026, 3, 2, 7, 0, 0)
        .single()
        .expect("unambiguous test instant")
}
