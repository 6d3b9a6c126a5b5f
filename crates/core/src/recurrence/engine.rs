//! Next-occurrence computation
//!
//! One candidate instant per "source" (each selected weekday, the fixed
//! date, or the single one-shot slot), then skip/dismiss-early rules on
//! top. Everything is a pure function of `(alarm, now)`; occurrences are
//! recomputed on demand and never cached across mutations.

use chrono::{DateTime, NaiveDate, TimeZone};
use chime_domain::{Alarm, ScheduleKind};

use super::clock;

/// An alarm paired with its computed next trigger instant.
#[derive(Debug, Clone, PartialEq)]
pub struct NextOccurrence<'a, Tz: TimeZone> {
    pub alarm: &'a Alarm,
    pub at: DateTime<Tz>,
}

/// Compute one candidate instant per scheduling source.
///
/// Candidates already account for the lead-in weekday rule of custom
/// multi-week cadences and for the dismissed-early timestamp; they do not
/// yet apply the skip-next flag (see [`next_occurrence`]).
///
/// A fixed date that does not exist on the calendar produces no
/// candidates; validation rejects such configurations before they are
/// saved.
pub fn candidate_instants<Tz: TimeZone>(alarm: &Alarm, now: &DateTime<Tz>) -> Vec<DateTime<Tz>> {
    let tz = now.timezone();

    match alarm.schedule_kind() {
        ScheduleKind::FixedDate(date) => {
            let Some(naive) = NaiveDate::from_ymd_opt(date.year, date.month, date.day) else {
                return Vec::new();
            };
            let instant = clock::wall_clock_on(&tz, naive, alarm.hour, alarm.minute);
            vec![push_past_early_dismissal(alarm, instant)]
        }
        ScheduleKind::Weekdays => {
            let today = now.date_naive();
            alarm
                .days
                .iter()
                .map(|day| {
                    let date = clock::next_weekday_on_or_after(today, day);
                    let naive = clock::wall_clock_on(&tz, date, alarm.hour, alarm.minute);

                    // Under a multi-week cadence, a weekday outside the
                    // lead-in set is not eligible during the starting
                    // period and jumps a full interval up front.
                    let instant = if alarm.has_custom_week_cadence()
                        && !alarm.lead_in_days.contains(day)
                    {
                        clock::add_interval(&naive, alarm.repeat_frequency, alarm.repeat_unit)
                    } else if naive < *now {
                        clock::add_calendar_days(&naive, 7)
                    } else {
                        naive
                    };

                    push_past_early_dismissal(alarm, instant)
                })
                .collect()
        }
        ScheduleKind::OneShot => {
            let today = now.date_naive();
            let instant = clock::wall_clock_on(&tz, today, alarm.hour, alarm.minute);
            let instant = if instant < *now || matches_early_dismissal(alarm, &instant) {
                clock::add_calendar_days(&instant, 1)
            } else {
                instant
            };
            vec![instant]
        }
    }
}

/// The earliest upcoming occurrence, with skip-next semantics applied.
///
/// Skip means "not this one, the one after": with a single candidate on a
/// repeating alarm the candidate advances by one repeat interval; with
/// several candidates the found one is excluded and the second-soonest
/// wins. Returns `None` for a skipped-and-final alarm (nothing scheduled,
/// not an error).
pub fn next_occurrence<Tz: TimeZone>(
    alarm: &Alarm,
    now: &DateTime<Tz>,
    ignore_skip: bool,
) -> Option<DateTime<Tz>> {
    let candidates = candidate_instants(alarm, now);
    let earliest = candidates.iter().min().cloned()?;

    if !alarm.should_skip_next || ignore_skip {
        return Some(earliest);
    }

    if candidates.len() == 1 && alarm.should_repeat {
        return Some(clock::add_interval(&earliest, alarm.repeat_frequency, alarm.repeat_unit));
    }

    candidates.into_iter().filter(|candidate| *candidate != earliest).min()
}

/// The soonest occurrence across a collection of alarms.
///
/// Disabled alarms and skipped-and-final alarms are excluded. Ties
/// resolve to the first alarm in iteration order.
pub fn earliest_across<'a, Tz, I>(alarms: I, now: &DateTime<Tz>) -> Option<NextOccurrence<'a, Tz>>
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a Alarm>,
{
    let mut soonest: Option<NextOccurrence<'a, Tz>> = None;

    for alarm in alarms {
        if !alarm.is_enabled || alarm.is_skipped_and_final() {
            continue;
        }
        let Some(at) = next_occurrence(alarm, now, false) else {
            continue;
        };
        let replace = soonest.as_ref().map_or(true, |current| at < current.at);
        if replace {
            soonest = Some(NextOccurrence { alarm, at });
        }
    }

    soonest
}

fn matches_early_dismissal<Tz: TimeZone>(alarm: &Alarm, instant: &DateTime<Tz>) -> bool {
    alarm.dismissed_early_at_ms != 0 && clock::epoch_ms(instant) == alarm.dismissed_early_at_ms
}

/// The user already dismissed this exact firing ahead of time; jump past
/// it by one repeat interval.
fn push_past_early_dismissal<Tz: TimeZone>(alarm: &Alarm, instant: DateTime<Tz>) -> DateTime<Tz> {
    if matches_early_dismissal(alarm, &instant) {
        clock::add_interval(&instant, alarm.repeat_frequency, alarm.repeat_unit)
    } else {
        instant
    }
}
