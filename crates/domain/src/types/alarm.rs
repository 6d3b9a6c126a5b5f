//! Alarm configuration types
//!
//! The persistent alarm model plus the small value types it is built
//! from. Scheduling mode is derived, never stored: a fixed date, a
//! weekday selection, or neither (a one-shot alarm).

use chrono::Weekday;
use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{
    DEFAULT_AUTO_DISMISS_SECONDS, DEFAULT_SNOOZE_DURATION_MINUTES,
    DEFAULT_VOLUME_RAMP_STEP_SECONDS, VOLUME_MAX,
};
use crate::errors::{ChimeError, Result};
use crate::impl_domain_status_conversions;

/// Unit of a custom repeat cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

impl_domain_status_conversions!(RepeatUnit {
    Minute => "minute",
    Hour => "hour",
    Day => "day",
    Week => "week",
    Month => "month",
});

/// A calendar date for fixed-date alarms.
///
/// Plain year/month/day fields; resolution against a time zone happens in
/// the recurrence engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// Set over the fixed 7-weekday domain.
///
/// Internally a bitmask (Sunday = bit 0 through Saturday = bit 6), but the
/// engine only ever sees set operations; the raw bits exist for the
/// persistence layer via [`WeekdaySet::to_bits`] / [`WeekdaySet::from_bits`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeekdaySet(u8);

const ALL_DAYS_MASK: u8 = 0b0111_1111;

impl WeekdaySet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build a set from the given weekdays.
    pub fn from_days(days: &[Weekday]) -> Self {
        let mut set = Self::empty();
        for day in days {
            set.insert(*day);
        }
        set
    }

    /// Add a weekday to the set.
    pub fn insert(&mut self, day: Weekday) {
        self.0 |= bit_for(day);
    }

    /// Remove a weekday from the set.
    pub fn remove(&mut self, day: Weekday) {
        self.0 &= !bit_for(day);
    }

    /// Whether the set contains `day`.
    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & bit_for(day) != 0
    }

    /// Number of selected weekdays.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether no weekday is selected.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Iterate selected weekdays, Sunday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        ALL_WEEKDAYS.iter().copied().filter(|day| self.contains(*day))
    }

    /// Raw bitmask for persistence (Sunday = bit 0).
    pub fn to_bits(self) -> u8 {
        self.0
    }

    /// Rebuild from a persisted bitmask; bits above Saturday are ignored.
    pub fn from_bits(bits: u8) -> Self {
        Self(bits & ALL_DAYS_MASK)
    }
}

/// Sunday-first domain order, matching the persisted bit layout.
pub const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

fn bit_for(day: Weekday) -> u8 {
    1 << day.num_days_from_sunday()
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "sun",
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
    }
}

impl Serialize for WeekdaySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for day in self.iter() {
            seq.serialize_element(day_name(day))?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for WeekdaySet {
    fn deserialize<D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        struct DayListVisitor;

        impl<'de> Visitor<'de> for DayListVisitor {
            type Value = WeekdaySet;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a list of weekday names")
            }

            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut set = WeekdaySet::empty();
                while let Some(name) = seq.next_element::<String>()? {
                    let day = parse_day_name(&name).ok_or_else(|| {
                        serde::de::Error::custom(format!("unknown weekday: {name}"))
                    })?;
                    set.insert(day);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_seq(DayListVisitor)
    }
}

fn parse_day_name(name: &str) -> Option<Weekday> {
    ALL_WEEKDAYS
        .iter()
        .copied()
        .find(|day| day_name(*day).eq_ignore_ascii_case(name.trim()))
}

/// Flashlight behaviour while the alarm rings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FlashlightMode {
    Off,
    Steady,
    Blink { on_ms: u64, off_ms: u64 },
}

/// Actuator configuration carried by every alarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WakeupSettings {
    pub has_media: bool,
    pub media_path: Option<String>,
    /// Target volume for the alarm stream, 0–100.
    pub volume: u8,
    pub ramp_volume: bool,
    /// Seconds between volume ramp steps.
    pub ramp_step_seconds: u32,
    /// Re-clamp the live volume once per second while ringing.
    pub restrict_volume: bool,
    pub vibrate: bool,
    pub flashlight: FlashlightMode,
    pub tts: bool,
    /// Minutes between repeated utterances; 0 speaks once.
    pub tts_interval_minutes: u32,
    pub say_current_time: bool,
    pub say_label: bool,
}

impl Default for WakeupSettings {
    fn default() -> Self {
        Self {
            has_media: true,
            media_path: None,
            volume: VOLUME_MAX,
            ramp_volume: false,
            ramp_step_seconds: DEFAULT_VOLUME_RAMP_STEP_SECONDS,
            restrict_volume: false,
            vibrate: false,
            flashlight: FlashlightMode::Off,
            tts: false,
            tts_interval_minutes: 0,
            say_current_time: true,
            say_label: false,
        }
    }
}

/// Derived scheduling mode of an alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleKind {
    /// A single fixed-date trigger.
    FixedDate(AlarmDate),
    /// One candidate per selected weekday.
    Weekdays,
    /// No date, no days: fires today or tomorrow at hour:minute.
    OneShot,
}

/// Persistent alarm configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    /// Stable identifier; 0 means "unsaved".
    pub id: i64,
    pub label: String,
    pub hour: u8,
    pub minute: u8,
    /// When present, the alarm is a single fixed-date trigger.
    pub date: Option<AlarmDate>,
    /// Selected weekdays; empty together with no date means one-shot.
    pub days: WeekdaySet,
    pub should_repeat: bool,
    pub repeat_frequency: u32,
    pub repeat_unit: RepeatUnit,
    /// Weekdays allowed to fire during the first interval of a custom
    /// multi-week cadence.
    pub lead_in_days: WeekdaySet,
    pub should_skip_next: bool,
    /// Epoch millis of the most recent early dismissal; 0 = unset.
    pub dismissed_early_at_ms: i64,
    pub is_enabled: bool,
    pub is_active: bool,
    pub is_snoozed: bool,
    pub snooze_count: u32,
    pub snooze_duration_minutes: u32,
    /// 0 disables auto-dismiss.
    pub auto_dismiss_seconds: u32,
    /// 0 disables auto-snooze.
    pub auto_snooze_seconds: u32,
    /// Accumulated ringing time across interruptions.
    pub time_active_ms: i64,
    pub can_snooze: bool,
    pub delete_after_dismiss: bool,
    pub wakeup: WakeupSettings,
}

impl Default for Alarm {
    fn default() -> Self {
        Self {
            id: 0,
            label: String::new(),
            hour: 0,
            minute: 0,
            date: None,
            days: WeekdaySet::empty(),
            should_repeat: true,
            repeat_frequency: 1,
            repeat_unit: RepeatUnit::Week,
            lead_in_days: WeekdaySet::empty(),
            should_skip_next: false,
            dismissed_early_at_ms: 0,
            is_enabled: true,
            is_active: false,
            is_snoozed: false,
            snooze_count: 0,
            snooze_duration_minutes: DEFAULT_SNOOZE_DURATION_MINUTES,
            auto_dismiss_seconds: DEFAULT_AUTO_DISMISS_SECONDS,
            auto_snooze_seconds: 0,
            time_active_ms: 0,
            can_snooze: true,
            delete_after_dismiss: false,
            wakeup: WakeupSettings::default(),
        }
    }
}

impl Alarm {
    /// Derive the scheduling mode from the configured date/days.
    pub fn schedule_kind(&self) -> ScheduleKind {
        match self.date {
            Some(date) => ScheduleKind::FixedDate(date),
            None if !self.days.is_empty() => ScheduleKind::Weekdays,
            None => ScheduleKind::OneShot,
        }
    }

    /// Number of independent candidate sources for this alarm.
    pub fn candidate_count(&self) -> usize {
        match self.schedule_kind() {
            ScheduleKind::Weekdays => self.days.len(),
            ScheduleKind::FixedDate(_) | ScheduleKind::OneShot => 1,
        }
    }

    /// A skipped-and-final alarm has its only occurrence suppressed and
    /// nothing after it; it must be excluded from soonest-alarm queries.
    pub fn is_skipped_and_final(&self) -> bool {
        self.should_skip_next && !self.should_repeat && self.candidate_count() <= 1
    }

    /// Whether the cadence is a custom multi-week repeat, which gates the
    /// lead-in weekday handling in the recurrence engine.
    pub fn has_custom_week_cadence(&self) -> bool {
        self.repeat_unit == RepeatUnit::Week && self.repeat_frequency != 1
    }

    /// Validate the configuration before it is persisted.
    ///
    /// Rejected configurations never reach the recurrence engine.
    pub fn validate(&self) -> Result<()> {
        if self.hour > 23 {
            return Err(invalid(format!("hour out of range: {}", self.hour)));
        }
        if self.minute > 59 {
            return Err(invalid(format!("minute out of range: {}", self.minute)));
        }
        if self.repeat_frequency < 1 {
            return Err(invalid("repeat frequency must be at least 1".into()));
        }
        if self.date.is_some() && !self.days.is_empty() {
            return Err(invalid(
                "an alarm cannot have both a fixed date and weekdays".into(),
            ));
        }
        if let Some(date) = self.date {
            if date.month < 1 || date.month > 12 || date.day < 1 || date.day > 31 {
                return Err(invalid(format!(
                    "invalid date: {:04}-{:02}-{:02}",
                    date.year, date.month, date.day
                )));
            }
        }
        if self.wakeup.volume > VOLUME_MAX {
            return Err(invalid(format!("volume out of range: {}", self.wakeup.volume)));
        }
        Ok(())
    }
}

fn invalid(message: String) -> ChimeError {
    ChimeError::InvalidConfiguration(message)
}
