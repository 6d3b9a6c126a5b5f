//! # Chime Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The recurrence engine (next-occurrence computation)
//! - The active-alarm state machine and its session lifecycle
//! - The wakeup actuator coordinator
//! - Port/adapter interfaces (traits) for every collaborator
//!
//! ## Architecture Principles
//! - Only depends on `chime-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod recurrence;
pub mod session;
pub mod wakeup;

// Re-export specific items to avoid ambiguity
pub use recurrence::engine::{candidate_instants, earliest_across, next_occurrence, NextOccurrence};
pub use session::ports::{AlarmStore, Clock, EventSink, SystemClock, WakeSource};
pub use session::service::{ActiveAlarmService, SessionOutcome, SessionState};
pub use wakeup::coordinator::{WakeupActuators, WakeupCoordinator, WakeupHandle};
pub use wakeup::ports::{AudioSink, Flashlight, SpeechSynthesizer, Vibrator, VolumeControl};
