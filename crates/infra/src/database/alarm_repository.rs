//! Alarm repository implementation over SQLite
//!
//! Implements the core `AlarmStore` port. All rusqlite work runs on the
//! blocking pool; weekday sets round-trip through their persisted
//! bitmask form.

use std::sync::Arc;

use async_trait::async_trait;
use chime_core::session::ports::AlarmStore;
use chime_domain::{
    Alarm, AlarmDate, ChimeError, RepeatUnit, Result as DomainResult, WakeupSettings, WeekdaySet,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row, ToSql};
use tokio::task;

use super::manager::DbManager;
use crate::errors::{map_join_error, InfraError};

/// SQLite-backed implementation of `AlarmStore`.
pub struct SqliteAlarmRepository {
    db: Arc<DbManager>,
}

impl SqliteAlarmRepository {
    /// Create a new repository instance.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Insert a new alarm (id 0) and return the assigned id.
    pub async fn create(&self, alarm: &Alarm) -> DomainResult<i64> {
        alarm.validate()?;
        let db = Arc::clone(&self.db);
        let alarm = alarm.clone();

        task::spawn_blocking(move || -> DomainResult<i64> {
            let conn = db.get_connection()?;
            insert_alarm(&conn, &alarm).map_err(InfraError::from).map_err(ChimeError::from)
        })
        .await
        .map_err(map_join_error)?
    }

    /// All alarms, in id order.
    pub async fn all(&self) -> DomainResult<Vec<Alarm>> {
        self.query_alarms("SELECT * FROM alarms ORDER BY id").await
    }

    async fn query_alarms(&self, sql: &'static str) -> DomainResult<Vec<Alarm>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<Alarm>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(sql).map_err(InfraError::from)?;
            let alarms = stmt
                .query_map([], map_alarm_row)
                .and_then(|rows| rows.collect::<rusqlite::Result<Vec<Alarm>>>())
                .map_err(InfraError::from)?;
            Ok(alarms)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl AlarmStore for SqliteAlarmRepository {
    async fn save(&self, alarm: &Alarm) -> DomainResult<()> {
        alarm.validate()?;
        if alarm.id == 0 {
            return Err(ChimeError::InvalidInput(
                "cannot save an unsaved alarm; use create".into(),
            ));
        }

        let db = Arc::clone(&self.db);
        let alarm = alarm.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            upsert_alarm(&conn, &alarm).map_err(InfraError::from)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete(&self, alarm_id: i64) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            conn.execute("DELETE FROM alarms WHERE id = ?1", params![alarm_id])
                .map_err(InfraError::from)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find(&self, alarm_id: i64) -> DomainResult<Option<Alarm>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Option<Alarm>> {
            let conn = db.get_connection()?;
            let result = conn.query_row(
                "SELECT * FROM alarms WHERE id = ?1",
                params![alarm_id],
                map_alarm_row,
            );

            match result {
                Ok(alarm) => Ok(Some(alarm)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(err) => Err(InfraError::from(err).into()),
            }
        })
        .await
        .map_err(map_join_error)?
    }

    async fn enabled_alarms(&self) -> DomainResult<Vec<Alarm>> {
        self.query_alarms("SELECT * FROM alarms WHERE is_enabled = 1 ORDER BY id").await
    }

    async fn active_alarms(&self) -> DomainResult<Vec<Alarm>> {
        self.query_alarms(
            "SELECT * FROM alarms WHERE is_active = 1 ORDER BY time_active_ms DESC, id",
        )
        .await
    }
}

/* -------------------------------------------------------------------------- */
/* Helper Functions */
/* -------------------------------------------------------------------------- */

const ALARM_COLUMNS: &str = "label, hour, minute, date_year, date_month, date_day, days_bits, \
     should_repeat, repeat_frequency, repeat_unit, lead_in_days_bits, should_skip_next, \
     dismissed_early_at_ms, is_enabled, is_active, is_snoozed, snooze_count, \
     snooze_duration_minutes, auto_dismiss_seconds, auto_snooze_seconds, time_active_ms, \
     can_snooze, delete_after_dismiss, wakeup_json";

/// Map a `SELECT *` row to an `Alarm`.
fn map_alarm_row(row: &Row<'_>) -> rusqlite::Result<Alarm> {
    let date = match (
        row.get::<_, Option<i32>>("date_year")?,
        row.get::<_, Option<u32>>("date_month")?,
        row.get::<_, Option<u32>>("date_day")?,
    ) {
        (Some(year), Some(month), Some(day)) => Some(AlarmDate { year, month, day }),
        _ => None,
    };

    let unit_text: String = row.get("repeat_unit")?;
    let repeat_unit: RepeatUnit = unit_text.parse().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(StoredValueError(err)))
    })?;

    let wakeup_text: String = row.get("wakeup_json")?;
    let wakeup: WakeupSettings = serde_json::from_str(&wakeup_text).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(23, Type::Text, Box::new(err))
    })?;

    Ok(Alarm {
        id: row.get("id")?,
        label: row.get("label")?,
        hour: row.get("hour")?,
        minute: row.get("minute")?,
        date,
        days: WeekdaySet::from_bits(row.get("days_bits")?),
        should_repeat: row.get("should_repeat")?,
        repeat_frequency: row.get("repeat_frequency")?,
        repeat_unit,
        lead_in_days: WeekdaySet::from_bits(row.get("lead_in_days_bits")?),
        should_skip_next: row.get("should_skip_next")?,
        dismissed_early_at_ms: row.get("dismissed_early_at_ms")?,
        is_enabled: row.get("is_enabled")?,
        is_active: row.get("is_active")?,
        is_snoozed: row.get("is_snoozed")?,
        snooze_count: row.get("snooze_count")?,
        snooze_duration_minutes: row.get("snooze_duration_minutes")?,
        auto_dismiss_seconds: row.get("auto_dismiss_seconds")?,
        auto_snooze_seconds: row.get("auto_snooze_seconds")?,
        time_active_ms: row.get("time_active_ms")?,
        can_snooze: row.get("can_snooze")?,
        delete_after_dismiss: row.get("delete_after_dismiss")?,
        wakeup,
    })
}

fn alarm_params(alarm: &Alarm, wakeup_json: &str) -> Vec<Box<dyn ToSql>> {
    vec![
        Box::new(alarm.label.clone()),
        Box::new(alarm.hour),
        Box::new(alarm.minute),
        Box::new(alarm.date.map(|d| d.year)),
        Box::new(alarm.date.map(|d| d.month)),
        Box::new(alarm.date.map(|d| d.day)),
        Box::new(alarm.days.to_bits()),
        Box::new(alarm.should_repeat),
        Box::new(alarm.repeat_frequency),
        Box::new(alarm.repeat_unit.to_string()),
        Box::new(alarm.lead_in_days.to_bits()),
        Box::new(alarm.should_skip_next),
        Box::new(alarm.dismissed_early_at_ms),
        Box::new(alarm.is_enabled),
        Box::new(alarm.is_active),
        Box::new(alarm.is_snoozed),
        Box::new(alarm.snooze_count),
        Box::new(alarm.snooze_duration_minutes),
        Box::new(alarm.auto_dismiss_seconds),
        Box::new(alarm.auto_snooze_seconds),
        Box::new(alarm.time_active_ms),
        Box::new(alarm.can_snooze),
        Box::new(alarm.delete_after_dismiss),
        Box::new(wakeup_json.to_string()),
    ]
}

fn encode_wakeup(alarm: &Alarm) -> rusqlite::Result<String> {
    serde_json::to_string(&alarm.wakeup).map_err(|err| {
        rusqlite::Error::ToSqlConversionFailure(Box::new(err))
    })
}

/// Insert a new alarm and return the generated id.
fn insert_alarm(conn: &Connection, alarm: &Alarm) -> rusqlite::Result<i64> {
    let wakeup_json = encode_wakeup(alarm)?;
    let sql = format!(
        "INSERT INTO alarms ({ALARM_COLUMNS}) VALUES \
         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, \
          ?19, ?20, ?21, ?22, ?23, ?24)"
    );
    let values = alarm_params(alarm, &wakeup_json);
    conn.execute(&sql, rusqlite::params_from_iter(values.iter().map(Box::as_ref)))?;
    Ok(conn.last_insert_rowid())
}

/// Write an existing alarm back under its id.
fn upsert_alarm(conn: &Connection, alarm: &Alarm) -> rusqlite::Result<()> {
    let wakeup_json = encode_wakeup(alarm)?;
    let sql = format!(
        "INSERT OR REPLACE INTO alarms (id, {ALARM_COLUMNS}) VALUES \
         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, \
          ?19, ?20, ?21, ?22, ?23, ?24, ?25)"
    );
    let mut values: Vec<Box<dyn ToSql>> = vec![Box::new(alarm.id)];
    values.extend(alarm_params(alarm, &wakeup_json));
    conn.execute(&sql, rusqlite::params_from_iter(values.iter().map(Box::as_ref)))?;
    Ok(())
}

/// Wraps a domain parse failure so it satisfies rusqlite's error bounds.
#[derive(Debug)]
struct StoredValueError(ChimeError);

impl std::fmt::Display for StoredValueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StoredValueError {}
