//! SQLite alarm repository integration tests.

use std::sync::Arc;

use chime_core::session::ports::AlarmStore;
use chime_domain::{Alarm, AlarmDate, FlashlightMode, RepeatUnit, WeekdaySet};
use chime_infra::database::{DbManager, SqliteAlarmRepository};
use chrono::Weekday;

fn repository() -> SqliteAlarmRepository {
    let db = DbManager::in_memory().expect("in-memory database");
    db.run_migrations().expect("schema");
    SqliteAlarmRepository::new(Arc::new(db))
}

fn sample_alarm() -> Alarm {
    Alarm {
        label: "Weekday run".into(),
        hour: 6,
        minute: 15,
        days: WeekdaySet::from_days(&[Weekday::Mon, Weekday::Wed, Weekday::Fri]),
        lead_in_days: WeekdaySet::from_days(&[Weekday::Mon]),
        repeat_frequency: 2,
        repeat_unit: RepeatUnit::Week,
        should_skip_next: true,
        dismissed_early_at_ms: 1_772_000_000_000,
        snooze_duration_minutes: 5,
        auto_dismiss_seconds: 120,
        ..Alarm::default()
    }
}

#[tokio::test]
async fn create_assigns_an_id_and_round_trips_every_field() {
    let repo = repository();
    let mut alarm = sample_alarm();
    alarm.wakeup.ramp_volume = true;
    alarm.wakeup.flashlight = FlashlightMode::Blink { on_ms: 250, off_ms: 750 };
    alarm.wakeup.media_path = Some("tones/sunrise.ogg".into());

    let id = repo.create(&alarm).await.expect("create");
    assert!(id > 0);

    alarm.id = id;
    let loaded = repo.find(id).await.expect("find").expect("present");
    assert_eq!(loaded, alarm);
}

#[tokio::test]
async fn save_upserts_under_the_existing_id() {
    let repo = repository();
    let mut alarm = sample_alarm();
    alarm.id = repo.create(&alarm).await.expect("create");

    alarm.snooze_count = 3;
    alarm.is_snoozed = true;
    alarm.time_active_ms = 42_000;
    repo.save(&alarm).await.expect("save");

    let loaded = repo.find(alarm.id).await.expect("find").expect("present");
    assert_eq!(loaded.snooze_count, 3);
    assert!(loaded.is_snoozed);
    assert_eq!(loaded.time_active_ms, 42_000);
}

#[tokio::test]
async fn saving_an_unsaved_alarm_is_rejected() {
    let repo = repository();
    let alarm = sample_alarm();

    let err = repo.save(&alarm).await.expect_err("id 0 must be rejected");
    assert!(matches!(err, chime_domain::ChimeError::InvalidInput(_)));
}

#[tokio::test]
async fn invalid_configurations_never_reach_the_database() {
    let repo = repository();
    let mut alarm = sample_alarm();
    alarm.date = Some(AlarmDate { year: 2026, month: 4, day: 1 });
    // Conflicting date + days combination.

    let err = repo.create(&alarm).await.expect_err("invalid config");
    assert!(matches!(err, chime_domain::ChimeError::InvalidConfiguration(_)));
    assert!(repo.all().await.expect("all").is_empty());
}

#[tokio::test]
async fn delete_removes_the_row() {
    let repo = repository();
    let mut alarm = sample_alarm();
    alarm.id = repo.create(&alarm).await.expect("create");

    repo.delete(alarm.id).await.expect("delete");
    assert!(repo.find(alarm.id).await.expect("find").is_none());
}

#[tokio::test]
async fn enabled_query_filters_disabled_alarms() {
    let repo = repository();
    let mut enabled = sample_alarm();
    enabled.id = repo.create(&enabled).await.expect("create enabled");

    let mut disabled = sample_alarm();
    disabled.is_enabled = false;
    repo.create(&disabled).await.expect("create disabled");

    let found = repo.enabled_alarms().await.expect("query");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, enabled.id);
}

#[tokio::test]
async fn active_query_orders_by_longest_active_first() {
    let repo = repository();

    let mut short = sample_alarm();
    short.is_active = true;
    short.time_active_ms = 1_000;
    let short_id = repo.create(&short).await.expect("create short");

    let mut long = sample_alarm();
    long.is_active = true;
    long.time_active_ms = 30_000;
    let long_id = repo.create(&long).await.expect("create long");

    let mut idle = sample_alarm();
    idle.is_active = false;
    repo.create(&idle).await.expect("create idle");

    let actives = repo.active_alarms().await.expect("query");
    let ids: Vec<i64> = actives.iter().map(|alarm| alarm.id).collect();
    assert_eq!(ids, vec![long_id, short_id]);
}

#[tokio::test]
async fn fixed_date_columns_round_trip_as_null_or_values() {
    let repo = repository();
    let mut dated = sample_alarm();
    dated.days = WeekdaySet::empty();
    dated.lead_in_days = WeekdaySet::empty();
    dated.date = Some(AlarmDate { year: 2026, month: 12, day: 24 });
    dated.id = repo.create(&dated).await.expect("create");

    let loaded = repo.find(dated.id).await.expect("find").expect("present");
    assert_eq!(loaded.date, Some(AlarmDate { year: 2026, month: 12, day: 24 }));

    let mut undated = sample_alarm();
    undated.id = repo.create(&undated).await.expect("create undated");
    let loaded = repo.find(undated.id).await.expect("find").expect("present");
    assert_eq!(loaded.date, None);
}
