//! Scheduling adapters

pub mod error;
pub mod ring_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use ring_scheduler::{RingJob, RingScheduler, RingSchedulerConfig};
