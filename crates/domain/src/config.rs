//! Configuration structures
//!
//! Loaded by the infra config loader; every knob the session and wakeup
//! layers consult is passed in explicitly rather than read from ambient
//! state mid-algorithm.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_SNOOZE_DURATION_MINUTES, MEDIA_WATCHDOG_INTERVAL_SECS, TIMER_GUARD_INTERVAL_MS,
    VOLUME_RESTRICT_INTERVAL_SECS,
};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub wakeup: WakeupConfig,
}

/// Database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "chime.db".into(), pool_size: 4 }
    }
}

/// Session state-machine timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Margin subtracted from auto-dismiss/auto-snooze delays so the
    /// timer lands inside the wake guard's window.
    pub guard_interval_ms: u64,
    /// Snooze duration applied when an alarm has none configured.
    pub default_snooze_minutes: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            guard_interval_ms: TIMER_GUARD_INTERVAL_MS,
            default_snooze_minutes: DEFAULT_SNOOZE_DURATION_MINUTES,
        }
    }
}

/// Wakeup actuator coordinator cadences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WakeupConfig {
    /// Seconds between media watchdog polls.
    pub watchdog_interval_secs: u64,
    /// Seconds between restrict-volume clamps.
    pub volume_restrict_interval_secs: u64,
}

impl Default for WakeupConfig {
    fn default() -> Self {
        Self {
            watchdog_interval_secs: MEDIA_WATCHDOG_INTERVAL_SECS,
            volume_restrict_interval_secs: VOLUME_RESTRICT_INTERVAL_SECS,
        }
    }
}
