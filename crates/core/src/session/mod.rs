//! Active-alarm session lifecycle
//!
//! The state machine that owns whichever alarm is currently ringing:
//! entry on trigger, exits via dismiss/snooze/auto-dismiss/auto-snooze,
//! the swap path for a second alarm arriving mid-ring, and the
//! arbitration step that resumes another still-active alarm afterwards.

pub mod ports;
pub mod service;
