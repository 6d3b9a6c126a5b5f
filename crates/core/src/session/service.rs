//! Active-alarm state machine
//!
//! Owns the single runtime session of whichever alarm is ringing. Entry
//! happens on a trigger request; exits run through dismiss, snooze, or
//! the auto-dismiss/auto-snooze timers. Every exit tears the session
//! down completely (actuators, timers, wake resource) before the
//! arbitration step looks for another still-active alarm to resume.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use chime_domain::constants::DEFAULT_AUTO_DISMISS_SECONDS;
use chime_domain::{Alarm, Result, SessionConfig, SessionEvent, StatKind};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::recurrence::engine;
use crate::session::ports::{AlarmStore, Clock, EventSink, WakeSource};
use crate::wakeup::coordinator::{WakeupCoordinator, WakeupHandle};

/// Lifecycle states of an alarm session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Ringing,
    Snoozed,
    Dismissed,
    Missed,
}

/// What a state-machine entry point did.
#[derive(Debug)]
pub enum SessionOutcome {
    /// A session entered the ringing state; `warnings` lists degraded
    /// actuator or wake-resource starts.
    Ringing { session_id: Uuid, warnings: Vec<String> },
    /// The ringing surface was re-shown without touching timers or
    /// actuators (duplicate or re-entrant trigger).
    Resurfaced,
    /// The ringing session exited; arbitration may have resumed another
    /// still-active alarm.
    Exited { state: SessionState, resumed_alarm_id: Option<i64> },
    /// The call did not apply to any session (redundant transition);
    /// absorbed as a no-op.
    NoSession,
}

enum ExitKind {
    Dismissed { used_alternate_method: bool },
    Missed,
    Snoozed,
}

/// One ringing alarm and the handles that must die with it.
struct ActiveSession {
    alarm: Alarm,
    session_id: Uuid,
    generation: u64,
    started_at: Instant,
    wake_held: bool,
    wakeup: Option<WakeupHandle>,
    /// Cancels the auto-dismiss/auto-snooze timers as a set.
    timers: CancellationToken,
}

/// The active-alarm state machine.
///
/// Exclusively owns the current [`ActiveSession`]; at most one exists at
/// a time, and all transitions serialize on its lock.
pub struct ActiveAlarmService<Tz: TimeZone> {
    store: Arc<dyn AlarmStore>,
    clock: Arc<dyn Clock<Tz>>,
    wake: Arc<dyn WakeSource>,
    events: Arc<dyn EventSink>,
    wakeup: WakeupCoordinator<Tz>,
    config: SessionConfig,
    session: Mutex<Option<ActiveSession>>,
    generation: AtomicU64,
}

impl<Tz> ActiveAlarmService<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send + Sync,
{
    pub fn new(
        store: Arc<dyn AlarmStore>,
        clock: Arc<dyn Clock<Tz>>,
        wake: Arc<dyn WakeSource>,
        events: Arc<dyn EventSink>,
        wakeup: WakeupCoordinator<Tz>,
        config: SessionConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            clock,
            wake,
            events,
            wakeup,
            config,
            session: Mutex::new(None),
            generation: AtomicU64::new(0),
        })
    }

    /// Current machine state; `Idle` whenever no session exists.
    pub async fn state(&self) -> SessionState {
        if self.session.lock().await.is_some() {
            SessionState::Ringing
        } else {
            SessionState::Idle
        }
    }

    /// An alarm fired: enter ringing, or handle the duplicate/swap cases
    /// when a session already exists.
    pub async fn on_alarm_triggered(self: &Arc<Self>, alarm: Alarm) -> Result<SessionOutcome> {
        let mut guard = self.session.lock().await;

        if let Some(current) = guard.as_ref() {
            if current.alarm == alarm {
                // Duplicate trigger for the very alarm that is ringing:
                // re-surface only, never restart actuators.
                debug!(alarm_id = alarm.id, "duplicate trigger; re-surfacing ringing alarm");
                self.events.emit(SessionEvent::ShowRinging { alarm });
                return Ok(SessionOutcome::Resurfaced);
            }
            if current.alarm.id == alarm.id {
                // Same identity, different snapshot: a restart signal.
                // Timers and actuators keep running untouched.
                debug!(alarm_id = alarm.id, "re-entrant trigger; re-surfacing without reset");
                self.events.emit(SessionEvent::ShowRinging { alarm: current.alarm.clone() });
                return Ok(SessionOutcome::Resurfaced);
            }
        }

        if let Some(old) = guard.take() {
            self.suspend_for_swap(old).await;
        }

        self.enter_ringing(&mut guard, alarm).await
    }

    /// User or NFC dismissal of the ringing alarm.
    pub async fn on_dismiss(self: &Arc<Self>, used_alternate_method: bool) -> Result<SessionOutcome> {
        self.exit(ExitKind::Dismissed { used_alternate_method }, None).await
    }

    /// User snooze of the ringing alarm.
    pub async fn on_snooze(self: &Arc<Self>) -> Result<SessionOutcome> {
        self.exit(ExitKind::Snoozed, None).await
    }

    /// Auto-dismiss window elapsed without user action.
    pub async fn on_auto_dismiss_elapsed(self: &Arc<Self>) -> Result<SessionOutcome> {
        self.exit(ExitKind::Missed, None).await
    }

    /// Auto-snooze window elapsed without user action.
    pub async fn on_auto_snooze_elapsed(self: &Arc<Self>) -> Result<SessionOutcome> {
        self.exit(ExitKind::Snoozed, None).await
    }

    /// A different alarm fired mid-ring: bank the ringing time on the old
    /// alarm and destroy its session. The alarm stays `is_active` so the
    /// arbitration step can resume it after the newcomer ends.
    async fn suspend_for_swap(&self, mut session: ActiveSession) {
        let elapsed_ms = session.started_at.elapsed().as_millis() as i64;
        session.alarm.time_active_ms += elapsed_ms;

        info!(
            alarm_id = session.alarm.id,
            banked_ms = elapsed_ms,
            "suspending ringing alarm for a newer trigger"
        );
        if let Err(err) = self.store.save(&session.alarm).await {
            warn!(alarm_id = session.alarm.id, error = %err, "persisting suspended alarm failed");
        }
        self.events.emit(SessionEvent::PersistAlarm { alarm: session.alarm.clone() });

        self.teardown(&mut session).await;
    }

    /// Shared `Idle -> Ringing` entry logic.
    async fn enter_ringing(
        self: &Arc<Self>,
        guard: &mut Option<ActiveSession>,
        mut alarm: Alarm,
    ) -> Result<SessionOutcome> {
        let mut warnings = Vec::new();

        alarm.is_active = true;
        alarm.is_snoozed = false;
        if let Err(err) = self.store.save(&alarm).await {
            warn!(alarm_id = alarm.id, error = %err, "persisting active flag failed");
            warnings.push(format!("persisting active flag failed: {err}"));
        }
        self.events.emit(SessionEvent::PersistAlarm { alarm: alarm.clone() });

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let session_id = Uuid::new_v4();
        let timers = CancellationToken::new();

        // Hold the device awake for the ringing window; a denial degrades
        // the session but never aborts it, the dismissal path must work.
        let wake_secs = if alarm.auto_dismiss_seconds > 0 {
            alarm.auto_dismiss_seconds
        } else {
            DEFAULT_AUTO_DISMISS_SECONDS
        };
        let mut wake_held = true;
        if let Err(err) = self.wake.acquire(Duration::from_secs(u64::from(wake_secs))).await {
            warn!(alarm_id = alarm.id, error = %err, "wake resource denied; ringing degraded");
            warnings.push(format!("wake resource denied: {err}"));
            wake_held = false;
        }

        let wakeup = self.wakeup.start(&alarm);

        if alarm.auto_dismiss_seconds > 0 {
            let total_ms = u64::from(alarm.auto_dismiss_seconds) * 1000;
            let already_ms = u64::try_from(alarm.time_active_ms).unwrap_or(0);
            let delay_ms = total_ms
                .saturating_sub(already_ms)
                .saturating_sub(self.config.guard_interval_ms);
            self.spawn_auto_timer(&timers, delay_ms, generation, false);
        }
        if alarm.auto_snooze_seconds > 0 && alarm.can_snooze {
            let delay_ms = (u64::from(alarm.auto_snooze_seconds) * 1000)
                .saturating_sub(self.config.guard_interval_ms);
            self.spawn_auto_timer(&timers, delay_ms, generation, true);
        }

        self.events.emit(SessionEvent::ShowRinging { alarm: alarm.clone() });
        self.events.emit(SessionEvent::Foreground { active: true });
        info!(alarm_id = alarm.id, session_id = %session_id, "alarm ringing");

        *guard = Some(ActiveSession {
            alarm,
            session_id,
            generation,
            started_at: Instant::now(),
            wake_held,
            wakeup: Some(wakeup),
            timers,
        });

        Ok(SessionOutcome::Ringing { session_id, warnings })
    }

    /// Arm one of the auto-exit timers. The generation check makes a
    /// stale firing a no-op even if cancellation loses the race.
    fn spawn_auto_timer(
        self: &Arc<Self>,
        timers: &CancellationToken,
        delay_ms: u64,
        generation: u64,
        snooze: bool,
    ) {
        let service = Arc::clone(self);
        let token = timers.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => {
                    let kind = if snooze {
                        ExitKind::Snoozed
                    } else {
                        ExitKind::Missed
                    };
                    if let Err(err) = service.exit(kind, Some(generation)).await {
                        warn!(error = %err, "auto exit transition failed");
                    }
                }
            }
        });
    }

    /// Run an exit transition for the current session.
    ///
    /// `expected_generation` is set by the auto timers so a timer that
    /// outlived its session cannot touch a successor.
    async fn exit(
        self: &Arc<Self>,
        kind: ExitKind,
        expected_generation: Option<u64>,
    ) -> Result<SessionOutcome> {
        let mut guard = self.session.lock().await;

        let Some(current) = guard.as_ref() else {
            debug!("transition requested on idle machine; ignoring");
            return Ok(SessionOutcome::NoSession);
        };
        if let Some(expected) = expected_generation {
            if current.generation != expected {
                debug!("stale auto timer fired for an ended session; ignoring");
                return Ok(SessionOutcome::NoSession);
            }
        }
        if matches!(kind, ExitKind::Snoozed) && !current.alarm.can_snooze {
            debug!(alarm_id = current.alarm.id, "snooze requested but alarm cannot snooze");
            return Ok(SessionOutcome::NoSession);
        }

        let Some(mut session) = guard.take() else {
            return Ok(SessionOutcome::NoSession);
        };

        // Full teardown before any persistence or arbitration: no timer
        // or actuator may outlive the session.
        self.teardown(&mut session).await;

        let mut alarm = session.alarm;
        let now = self.clock.now();
        let state = match &kind {
            ExitKind::Dismissed { .. } => SessionState::Dismissed,
            ExitKind::Missed => SessionState::Missed,
            ExitKind::Snoozed => SessionState::Snoozed,
        };

        match kind {
            ExitKind::Dismissed { used_alternate_method } => {
                info!(
                    alarm_id = alarm.id,
                    used_alternate_method,
                    session_id = %session.session_id,
                    "alarm dismissed"
                );
                self.finish_ring(&mut alarm, &now).await;
                self.events.emit(SessionEvent::Stat { kind: StatKind::Dismissed });
            }
            ExitKind::Missed => {
                info!(alarm_id = alarm.id, session_id = %session.session_id, "alarm missed");
                self.finish_ring(&mut alarm, &now).await;
                self.events.emit(SessionEvent::Stat { kind: StatKind::Missed });
                self.events.emit(SessionEvent::MissedNotification {
                    alarm_id: alarm.id,
                    label: alarm.label.clone(),
                });
            }
            ExitKind::Snoozed => {
                let minutes = if alarm.snooze_duration_minutes > 0 {
                    alarm.snooze_duration_minutes
                } else {
                    self.config.default_snooze_minutes
                };
                let ring_again_at = now.clone() + chrono::Duration::minutes(i64::from(minutes));

                alarm.is_active = false;
                alarm.is_snoozed = true;
                alarm.snooze_count += 1;
                info!(
                    alarm_id = alarm.id,
                    snooze_count = alarm.snooze_count,
                    minutes,
                    "alarm snoozed"
                );

                if let Err(err) = self.store.save(&alarm).await {
                    warn!(alarm_id = alarm.id, error = %err, "persisting snoozed alarm failed");
                }
                self.events.emit(SessionEvent::PersistAlarm { alarm: alarm.clone() });
                self.events.emit(SessionEvent::ArmTimer {
                    alarm_id: alarm.id,
                    at: ring_again_at.with_timezone(&Utc),
                });
                self.events.emit(SessionEvent::Stat { kind: StatKind::Snoozed });
            }
        }

        let resumed_alarm_id = self.arbitrate(&mut guard).await;
        Ok(SessionOutcome::Exited { state, resumed_alarm_id })
    }

    /// Persistence shared by dismissal and the missed path: clear the
    /// runtime flags, then either delete the alarm or schedule its next
    /// occurrence.
    async fn finish_ring(&self, alarm: &mut Alarm, now: &chrono::DateTime<Tz>) {
        alarm.is_active = false;
        alarm.is_snoozed = false;
        alarm.snooze_count = 0;
        alarm.time_active_ms = 0;
        alarm.should_skip_next = false;

        if alarm.delete_after_dismiss {
            if let Err(err) = self.store.delete(alarm.id).await {
                warn!(alarm_id = alarm.id, error = %err, "deleting alarm failed");
            }
            self.events.emit(SessionEvent::DeleteAlarm { alarm_id: alarm.id });
            self.events.emit(SessionEvent::DisarmTimer { alarm_id: alarm.id });
            self.events.emit(SessionEvent::Stat { kind: StatKind::Deleted });
            return;
        }

        if let Err(err) = self.store.save(alarm).await {
            warn!(alarm_id = alarm.id, error = %err, "persisting dismissed alarm failed");
        }
        self.events.emit(SessionEvent::PersistAlarm { alarm: alarm.clone() });

        match engine::next_occurrence(alarm, now, false) {
            Some(at) => self.events.emit(SessionEvent::ArmTimer {
                alarm_id: alarm.id,
                at: at.with_timezone(&Utc),
            }),
            None => self.events.emit(SessionEvent::DisarmTimer { alarm_id: alarm.id }),
        }
    }

    /// After any exit: resume another still-active alarm, or report that
    /// the machine is idle.
    async fn arbitrate(self: &Arc<Self>, guard: &mut Option<ActiveSession>) -> Option<i64> {
        let actives = match self.store.active_alarms().await {
            Ok(alarms) => alarms,
            Err(err) => {
                warn!(error = %err, "active-alarm query failed during arbitration");
                Vec::new()
            }
        };

        if let Some(next_alarm) = actives.into_iter().next() {
            let id = next_alarm.id;
            info!(alarm_id = id, "arbitration resuming still-active alarm");
            if let Err(err) = self.enter_ringing(guard, next_alarm).await {
                warn!(alarm_id = id, error = %err, "resuming active alarm failed");
                return None;
            }
            return Some(id);
        }

        self.events.emit(SessionEvent::HideRinging);
        self.events.emit(SessionEvent::Foreground { active: false });
        self.events.emit(SessionEvent::NoMoreActiveAlarms);
        debug!("no active alarms remain; machine idle");
        None
    }

    /// Cancel the timer set, stop the actuators, release the wake
    /// resource. Idempotent per session because the session is consumed
    /// by its exit transition.
    async fn teardown(&self, session: &mut ActiveSession) {
        session.timers.cancel();
        if let Some(wakeup) = session.wakeup.take() {
            wakeup.stop().await;
        }
        if session.wake_held {
            session.wake_held = false;
            if let Err(err) = self.wake.release().await {
                warn!(error = %err, "releasing wake resource failed");
            }
        }
    }
}
