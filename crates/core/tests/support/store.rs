//! In-memory mock for `AlarmStore`.

use std::sync::Mutex;

use async_trait::async_trait;
use chime_core::session::ports::AlarmStore;
use chime_domain::{Alarm, Result as DomainResult};

/// Stores alarms in a plain vector, preserving insertion order so
/// arbitration-order assertions stay deterministic.
#[derive(Default)]
pub struct MockAlarmStore {
    alarms: Mutex<Vec<Alarm>>,
}

impl MockAlarmStore {
    pub fn new(alarms: Vec<Alarm>) -> Self {
        Self { alarms: Mutex::new(alarms) }
    }

    /// Snapshot of a single alarm as currently persisted.
    pub fn get(&self, alarm_id: i64) -> Option<Alarm> {
        self.alarms
            .lock()
            .expect("store lock")
            .iter()
            .find(|alarm| alarm.id == alarm_id)
            .cloned()
    }
}

#[async_trait]
impl AlarmStore for MockAlarmStore {
    async fn save(&self, alarm: &Alarm) -> DomainResult<()> {
        let mut alarms = self.alarms.lock().expect("store lock");
        match alarms.iter_mut().find(|existing| existing.id == alarm.id) {
            Some(existing) => *existing = alarm.clone(),
            None => alarms.push(alarm.clone()),
        }
        Ok(())
    }

    async fn delete(&self, alarm_id: i64) -> DomainResult<()> {
        self.alarms.lock().expect("store lock").retain(|alarm| alarm.id != alarm_id);
        Ok(())
    }

    async fn find(&self, alarm_id: i64) -> DomainResult<Option<Alarm>> {
        Ok(self.get(alarm_id))
    }

    async fn enabled_alarms(&self) -> DomainResult<Vec<Alarm>> {
        Ok(self
            .alarms
            .lock()
            .expect("store lock")
            .iter()
            .filter(|alarm| alarm.is_enabled)
            .cloned()
            .collect())
    }

    async fn active_alarms(&self) -> DomainResult<Vec<Alarm>> {
        let mut actives: Vec<Alarm> = self
            .alarms
            .lock()
            .expect("store lock")
            .iter()
            .filter(|alarm| alarm.is_active)
            .cloned()
            .collect();
        // Longest-active first, matching the arbitration contract.
        actives.sort_by(|a, b| b.time_active_ms.cmp(&a.time_active_ms));
        Ok(actives)
    }
}
