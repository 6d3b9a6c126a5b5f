//! Calendar-aware instant arithmetic
//!
//! All recurrence math works on local wall-clock fields: adding "one
//! week" means the same hour:minute seven calendar days later, not
//! +604800 seconds. That keeps schedules stable across daylight-saving
//! transitions.
//!
//! Resolution policy for local times that a DST transition makes
//! irregular: a time inside a gap rolls forward to the first valid local
//! time; an ambiguous time during a fold resolves to the earlier offset.

use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Weekday,
};
use chime_domain::RepeatUnit;

/// Resolve a naive local datetime against a time zone.
///
/// Gap times step forward in 30-minute increments until a valid local
/// time is found; fold times take the earlier of the two instants. The
/// final fallback (pathological zone data) interprets the fields as UTC
/// so the function stays total.
pub fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    let mut probe = naive;
    for _ in 0..16 {
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(dt) => return dt,
            LocalResult::Ambiguous(earlier, _) => return earlier,
            LocalResult::None => probe = probe + Duration::minutes(30),
        }
    }
    tz.from_utc_datetime(&naive)
}

/// Build the instant for `date @ hour:minute` in the given zone.
pub fn wall_clock_on<Tz: TimeZone>(tz: &Tz, date: NaiveDate, hour: u8, minute: u8) -> DateTime<Tz> {
    let time = NaiveTime::from_hms_opt(u32::from(hour), u32::from(minute), 0)
        .unwrap_or(NaiveTime::MIN);
    resolve_local(tz, date.and_time(time))
}

/// Advance an instant by `frequency` repeat units.
///
/// Minute and Hour are absolute durations; Day, Week and Month re-resolve
/// the wall-clock fields on the shifted calendar date. Month additions
/// clamp the day-of-month the way calendars do (Jan 31 + 1 month lands on
/// the last day of February).
pub fn add_interval<Tz: TimeZone>(
    dt: &DateTime<Tz>,
    frequency: u32,
    unit: RepeatUnit,
) -> DateTime<Tz> {
    match unit {
        RepeatUnit::Minute => dt.clone() + Duration::minutes(i64::from(frequency)),
        RepeatUnit::Hour => dt.clone() + Duration::hours(i64::from(frequency)),
        RepeatUnit::Day => add_calendar_days(dt, u64::from(frequency)),
        RepeatUnit::Week => add_calendar_days(dt, u64::from(frequency) * 7),
        RepeatUnit::Month => add_calendar_months(dt, frequency),
    }
}

/// Shift by whole calendar days, preserving the wall-clock time.
pub fn add_calendar_days<Tz: TimeZone>(dt: &DateTime<Tz>, days: u64) -> DateTime<Tz> {
    let local = dt.naive_local();
    match local.date().checked_add_days(Days::new(days)) {
        Some(date) => resolve_local(&dt.timezone(), date.and_time(local.time())),
        None => dt.clone(),
    }
}

fn add_calendar_months<Tz: TimeZone>(dt: &DateTime<Tz>, months: u32) -> DateTime<Tz> {
    let local = dt.naive_local();
    match local.date().checked_add_months(Months::new(months)) {
        Some(date) => resolve_local(&dt.timezone(), date.and_time(local.time())),
        None => dt.clone(),
    }
}

/// First date on or after `from` that falls on `target`.
pub fn next_weekday_on_or_after(from: NaiveDate, target: Weekday) -> NaiveDate {
    let ahead = (target.num_days_from_sunday() + 7 - from.weekday().num_days_from_sunday()) % 7;
    from.checked_add_days(Days::new(u64::from(ahead))).unwrap_or(from)
}

/// Epoch milliseconds of an instant, the unit used by the dismiss-early
/// bookkeeping on the alarm record.
pub fn epoch_ms<Tz: TimeZone>(dt: &DateTime<Tz>) -> i64 {
    dt.timestamp_millis()
}
