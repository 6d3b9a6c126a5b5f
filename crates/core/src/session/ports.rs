//! Port interfaces for the session state machine
//!
//! These traits define the boundaries between the core lifecycle logic
//! and infrastructure implementations (persistence, platform wake
//! resource, wall clock, event subscribers).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use chime_domain::{Alarm, Result, SessionEvent};

/// Trait for alarm persistence
///
/// The storage engine itself is a collaborator concern; only this
/// read/write contract matters to the core.
#[async_trait]
pub trait AlarmStore: Send + Sync {
    /// Write an alarm snapshot.
    async fn save(&self, alarm: &Alarm) -> Result<()>;

    /// Remove an alarm entirely.
    async fn delete(&self, alarm_id: i64) -> Result<()>;

    /// Fetch a single alarm.
    async fn find(&self, alarm_id: i64) -> Result<Option<Alarm>>;

    /// All enabled alarms, for soonest-occurrence queries.
    async fn enabled_alarms(&self) -> Result<Vec<Alarm>>;

    /// Alarms still flagged active, longest-active first; consulted by
    /// the arbitration step after a session ends.
    async fn active_alarms(&self) -> Result<Vec<Alarm>>;
}

/// Trait for the platform wake resource
///
/// Acquisition and release are the only externally blocking calls in the
/// core; both are expected to be bounded and fast.
#[async_trait]
pub trait WakeSource: Send + Sync {
    /// Hold the device awake for at most `timeout`.
    async fn acquire(&self, timeout: Duration) -> Result<()>;

    /// Release the held wake resource.
    async fn release(&self) -> Result<()>;
}

/// Trait for observing the wall clock
///
/// The engine never reads ambient time; "now" always arrives through
/// this port so tests can pin it.
pub trait Clock<Tz: TimeZone>: Send + Sync {
    fn now(&self) -> DateTime<Tz>;
}

/// System clock in the local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock<Local> for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Trait for the session event stream
///
/// A single subscriber receives every side-effect the state machine
/// emits and dispatches to the platform layers it fronts.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SessionEvent);
}
