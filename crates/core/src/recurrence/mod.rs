//! Recurrence engine
//!
//! Pure computation of future trigger instants. Given an alarm
//! configuration and "now", produces candidate instants, the next
//! occurrence, and the soonest occurrence across a collection. No I/O,
//! no hidden state.

pub mod clock;
pub mod engine;
