//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! alarm engine.

// Session timing
pub const TIMER_GUARD_INTERVAL_MS: u64 = 500;
pub const DEFAULT_SNOOZE_DURATION_MINUTES: u32 = 10;
pub const DEFAULT_AUTO_DISMISS_SECONDS: u32 = 300;
pub const MAX_SNOOZE_COUNT: u32 = 99;

// Wakeup actuator cadences
pub const MEDIA_WATCHDOG_INTERVAL_SECS: u64 = 10;
pub const VOLUME_RESTRICT_INTERVAL_SECS: u64 = 1;
pub const DEFAULT_VOLUME_RAMP_STEP_SECONDS: u32 = 5;
pub const VIBRATION_PULSE_ON_MS: u64 = 800;
pub const VIBRATION_PULSE_OFF_MS: u64 = 1200;
pub const DEFAULT_FLASHLIGHT_ON_MS: u64 = 500;
pub const DEFAULT_FLASHLIGHT_OFF_MS: u64 = 500;

// Volume bounds (percent of the alarm stream)
pub const VOLUME_MIN: u8 = 0;
pub const VOLUME_MAX: u8 = 100;
