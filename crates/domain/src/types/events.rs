//! Session event stream
//!
//! The state machine emits one flat event stream instead of a fan-out of
//! named listener interfaces; the platform layer subscribes once and
//! dispatches. Instants are carried as UTC so subscribers never need the
//! engine's time-zone parameter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::alarm::Alarm;
use crate::impl_domain_status_conversions;

/// Statistic categories recorded by the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Created,
    Dismissed,
    Missed,
    Snoozed,
    Deleted,
}

impl_domain_status_conversions!(StatKind {
    Created => "created",
    Dismissed => "dismissed",
    Missed => "missed",
    Snoozed => "snoozed",
    Deleted => "deleted",
});

/// Side-effects emitted by the active-alarm state machine.
///
/// Collaborators (persistence, platform timer, notification and ringing
/// surfaces, statistics) subscribe to this stream and act on the variants
/// they own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The alarm snapshot was written back to the store.
    PersistAlarm { alarm: Alarm },
    /// The alarm was removed (delete-after-dismiss).
    DeleteAlarm { alarm_id: i64 },
    /// Arm the platform timer for the given instant.
    ArmTimer { alarm_id: i64, at: DateTime<Utc> },
    /// Cancel any pending platform timer for the alarm.
    DisarmTimer { alarm_id: i64 },
    /// Present the ringing surface for the alarm.
    ShowRinging { alarm: Alarm },
    /// Hide the ringing surface.
    HideRinging,
    /// Post a missed-alarm notification.
    MissedNotification { alarm_id: i64, label: String },
    /// Record a statistic.
    Stat { kind: StatKind },
    /// Start or stop the foreground presentation.
    Foreground { active: bool },
    /// No alarm remains active after arbitration.
    NoMoreActiveAlarms,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_kind_conversions_round_trip() {
        for kind in [
            StatKind::Created,
            StatKind::Dismissed,
            StatKind::Missed,
            StatKind::Snoozed,
            StatKind::Deleted,
        ] {
            let parsed: StatKind = kind.to_string().parse().expect("parse stat kind");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn events_serialize_with_tagged_variant_names() {
        let event = SessionEvent::Foreground { active: true };
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains(r#""event":"foreground""#));
    }
}
