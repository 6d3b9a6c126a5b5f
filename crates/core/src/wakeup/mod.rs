//! Wakeup actuator coordination
//!
//! Everything that must run concurrently while an alarm rings: volume
//! management, media playback and its watchdog, text-to-speech cycles,
//! vibration, and the flashlight. Started on entry to the ringing state
//! and torn down deterministically on any exit.

pub mod coordinator;
pub mod ports;
