//! Domain types and models

pub mod alarm;
pub mod events;

pub use alarm::{
    Alarm, AlarmDate, FlashlightMode, RepeatUnit, ScheduleKind, WakeupSettings, WeekdaySet,
    ALL_WEEKDAYS,
};
pub use events::{SessionEvent, StatKind};
