//! Wakeup actuator coordinator
//!
//! One driver task owns every periodic duty of a ringing alarm: volume
//! ramp, restrict-volume clamping, the media watchdog, TTS cycles,
//! vibration pulses, and flashlight blinking. Each duty is a named
//! cooperative task whose tick runs a state transition and returns its
//! next delay; all ticks are serialized onto the driver loop, so shared
//! actuator state (last set volume, blink phase) needs no locking.
//!
//! Teardown cancels the whole set, stops every actuator, and restores the
//! volume snapshot after the last audio-touching duty has stopped.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeZone;
use chime_domain::constants::{VIBRATION_PULSE_OFF_MS, VIBRATION_PULSE_ON_MS};
use chime_domain::{Alarm, FlashlightMode, WakeupConfig, WakeupSettings};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::session::ports::Clock;
use crate::wakeup::ports::{AudioSink, Flashlight, SpeechSynthesizer, Vibrator, VolumeControl};

/// The actuator adapters a coordinator drives.
#[derive(Clone)]
pub struct WakeupActuators {
    pub audio: Arc<dyn AudioSink>,
    pub volume: Arc<dyn VolumeControl>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub vibrator: Arc<dyn Vibrator>,
    pub flashlight: Arc<dyn Flashlight>,
}

/// Named periodic duties of a ringing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Duty {
    VolumeRamp,
    VolumeRestrict,
    MediaWatchdog,
    Speak,
    VibratePulse,
    FlashToggle,
}

/// Factory for per-session wakeup drivers.
pub struct WakeupCoordinator<Tz: TimeZone> {
    actuators: WakeupActuators,
    clock: Arc<dyn Clock<Tz>>,
    config: WakeupConfig,
}

impl<Tz> WakeupCoordinator<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send,
{
    pub fn new(
        actuators: WakeupActuators,
        clock: Arc<dyn Clock<Tz>>,
        config: WakeupConfig,
    ) -> Self {
        Self { actuators, clock, config }
    }

    /// Start the actuator set for a ringing alarm.
    ///
    /// Never fails: individual actuator errors are logged and the session
    /// proceeds in degraded mode, since the dismissal path must keep
    /// working regardless.
    pub fn start(&self, alarm: &Alarm) -> WakeupHandle {
        let cancel = CancellationToken::new();
        let driver = Driver {
            actuators: self.actuators.clone(),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
            settings: alarm.wakeup.clone(),
            label: alarm.label.clone(),
            last_set_volume: 0,
            original_volume: None,
            flash_on: false,
        };

        let token = cancel.clone();
        let handle = tokio::spawn(async move { driver.run(token).await });

        debug!(alarm_id = alarm.id, "wakeup coordinator started");
        WakeupHandle { cancel, handle: Some(handle) }
    }
}

/// Handle to a running wakeup driver.
///
/// [`WakeupHandle::stop`] tears the driver down and waits for it, so a
/// caller that awaits it observes every actuator stopped and the volume
/// restored before proceeding.
pub struct WakeupHandle {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl WakeupHandle {
    /// Cancel the duty set and wait for teardown to complete.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "wakeup driver join failed");
            }
        }
    }

    /// Whether the driver task is still alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |handle| !handle.is_finished())
    }
}

impl Drop for WakeupHandle {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("wakeup handle dropped while running; cancelling duties");
            self.cancel.cancel();
        }
    }
}

struct Driver<Tz: TimeZone> {
    actuators: WakeupActuators,
    clock: Arc<dyn Clock<Tz>>,
    config: WakeupConfig,
    settings: WakeupSettings,
    label: String,
    /// Last volume this coordinator set; restrict-volume clamps back to it.
    last_set_volume: u8,
    /// Stream volume before the session, restored on teardown.
    original_volume: Option<u8>,
    flash_on: bool,
}

impl<Tz> Driver<Tz>
where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send,
{
    async fn run(mut self, cancel: CancellationToken) {
        let mut duties = self.arm_initial().await;

        loop {
            // Earliest deadline first; the set is at most six entries.
            let due = duties
                .iter()
                .enumerate()
                .min_by_key(|(_, entry)| entry.1)
                .map(|(idx, entry)| (idx, entry.0, entry.1));

            let Some((idx, duty, at)) = due else {
                // No periodic duties configured; hold until teardown.
                cancel.cancelled().await;
                break;
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep_until(at) => {
                    match self.tick(duty).await {
                        Some(delay) => duties[idx].1 = Instant::now() + delay,
                        None => {
                            duties.swap_remove(idx);
                        }
                    }
                }
            }
        }

        self.teardown().await;
    }

    /// Start the always-on actuators and schedule the periodic duties.
    async fn arm_initial(&mut self) -> Vec<(Duty, Instant)> {
        let mut duties = Vec::new();
        let now = Instant::now();
        let audio_in_use = self.settings.has_media || self.settings.tts;

        if audio_in_use {
            match self.actuators.volume.current_volume().await {
                Ok(level) => self.original_volume = Some(level),
                Err(err) => warn!(error = %err, "could not snapshot stream volume"),
            }

            let initial = if self.settings.ramp_volume { 0 } else { self.settings.volume };
            self.set_stream_volume(initial).await;

            if self.settings.ramp_volume {
                duties.push((
                    Duty::VolumeRamp,
                    now + Duration::from_secs(u64::from(self.settings.ramp_step_seconds.max(1))),
                ));
            }
            if self.settings.restrict_volume {
                duties.push((
                    Duty::VolumeRestrict,
                    now + Duration::from_secs(self.config.volume_restrict_interval_secs),
                ));
            }
        }

        if self.settings.has_media {
            if let Err(err) = self.actuators.audio.start(self.settings.media_path.as_deref()).await
            {
                warn!(error = %err, "media playback failed to start");
            }
            duties.push((
                Duty::MediaWatchdog,
                now + Duration::from_secs(self.config.watchdog_interval_secs),
            ));
        }

        if self.settings.tts {
            duties.push((Duty::Speak, now));
        }
        if self.settings.vibrate {
            duties.push((Duty::VibratePulse, now));
        }
        match self.settings.flashlight {
            FlashlightMode::Steady => {
                self.flash_on = true;
                if let Err(err) = self.actuators.flashlight.set_on(true).await {
                    warn!(error = %err, "flashlight failed to turn on");
                }
            }
            FlashlightMode::Blink { .. } => duties.push((Duty::FlashToggle, now)),
            FlashlightMode::Off => {}
        }

        duties
    }

    /// Run one duty tick; returns the delay until its next run, or `None`
    /// when the duty is finished for this session.
    async fn tick(&mut self, duty: Duty) -> Option<Duration> {
        match duty {
            Duty::VolumeRamp => self.tick_volume_ramp().await,
            Duty::VolumeRestrict => self.tick_volume_restrict().await,
            Duty::MediaWatchdog => self.tick_watchdog().await,
            Duty::Speak => self.tick_speak().await,
            Duty::VibratePulse => self.tick_vibrate().await,
            Duty::FlashToggle => self.tick_flash().await,
        }
    }

    async fn tick_volume_ramp(&mut self) -> Option<Duration> {
        let target = self.settings.volume;
        if self.last_set_volume >= target {
            return None;
        }
        // Ten steps from silence to target.
        let step = (target / 10).max(1);
        let next = self.last_set_volume.saturating_add(step).min(target);
        self.set_stream_volume(next).await;
        Some(Duration::from_secs(u64::from(self.settings.ramp_step_seconds.max(1))))
    }

    async fn tick_volume_restrict(&mut self) -> Option<Duration> {
        match self.actuators.volume.current_volume().await {
            Ok(level) if level != self.last_set_volume => {
                debug!(live = level, held = self.last_set_volume, "clamping stream volume");
                self.set_stream_volume(self.last_set_volume).await;
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "restrict-volume poll failed"),
        }
        Some(Duration::from_secs(self.config.volume_restrict_interval_secs))
    }

    async fn tick_watchdog(&mut self) -> Option<Duration> {
        // TTS runs inline on this loop, so an utterance can never be
        // in flight when the watchdog observes silence.
        if !self.actuators.audio.is_playing().await {
            warn!("media fell silent; watchdog restarting playback");
            if let Err(err) =
                self.actuators.audio.start(self.settings.media_path.as_deref()).await
            {
                warn!(error = %err, "watchdog restart failed");
            }
        }
        Some(Duration::from_secs(self.config.watchdog_interval_secs))
    }

    async fn tick_speak(&mut self) -> Option<Duration> {
        if self.settings.has_media {
            if let Err(err) = self.actuators.audio.pause().await {
                warn!(error = %err, "could not pause media for speech");
            }
        }
        if self.settings.vibrate {
            if let Err(err) = self.actuators.vibrator.stop().await {
                warn!(error = %err, "could not stop vibration for speech");
            }
        }

        let phrase = self.build_phrase();
        if let Err(err) = self.actuators.speech.speak(&phrase).await {
            warn!(error = %err, "speech synthesis failed");
        }

        if self.settings.has_media {
            if let Err(err) = self.actuators.audio.resume().await {
                warn!(error = %err, "could not resume media after speech");
            }
        }
        // Vibration resumes on its own next pulse tick.

        if self.settings.tts_interval_minutes > 0 {
            Some(Duration::from_secs(u64::from(self.settings.tts_interval_minutes) * 60))
        } else {
            None
        }
    }

    async fn tick_vibrate(&mut self) -> Option<Duration> {
        if let Err(err) = self.actuators.vibrator.pulse(VIBRATION_PULSE_ON_MS).await {
            warn!(error = %err, "vibration pulse failed");
        }
        Some(Duration::from_millis(VIBRATION_PULSE_ON_MS + VIBRATION_PULSE_OFF_MS))
    }

    async fn tick_flash(&mut self) -> Option<Duration> {
        let FlashlightMode::Blink { on_ms, off_ms } = self.settings.flashlight else {
            return None;
        };
        self.flash_on = !self.flash_on;
        if let Err(err) = self.actuators.flashlight.set_on(self.flash_on).await {
            warn!(error = %err, "flashlight toggle failed");
        }
        Some(Duration::from_millis(if self.flash_on { on_ms } else { off_ms }))
    }

    fn build_phrase(&self) -> String {
        let mut parts = Vec::new();
        if self.settings.say_label && !self.label.is_empty() {
            parts.push(format!("Alarm {}.", self.label));
        }
        if self.settings.say_current_time {
            let now = self.clock.now();
            parts.push(format!("It is {}.", now.naive_local().format("%H:%M")));
        }
        if parts.is_empty() {
            parts.push("Alarm.".to_string());
        }
        parts.join(" ")
    }

    async fn set_stream_volume(&mut self, level: u8) {
        self.last_set_volume = level;
        if let Err(err) = self.actuators.volume.set_volume(level).await {
            warn!(error = %err, level, "setting stream volume failed");
        }
    }

    /// Stop every actuator, then restore the volume snapshot. The volume
    /// write comes last so nothing can change the stream after it.
    async fn teardown(&mut self) {
        if self.settings.tts {
            if let Err(err) = self.actuators.speech.stop().await {
                warn!(error = %err, "stopping speech failed");
            }
        }
        if self.settings.vibrate {
            if let Err(err) = self.actuators.vibrator.stop().await {
                warn!(error = %err, "stopping vibration failed");
            }
        }
        if self.settings.flashlight != FlashlightMode::Off {
            if let Err(err) = self.actuators.flashlight.set_on(false).await {
                warn!(error = %err, "turning flashlight off failed");
            }
        }
        if self.settings.has_media {
            if let Err(err) = self.actuators.audio.stop().await {
                warn!(error = %err, "stopping media failed");
            }
        }
        if let Some(level) = self.original_volume.take() {
            if let Err(err) = self.actuators.volume.set_volume(level).await {
                warn!(error = %err, level, "restoring stream volume failed");
            }
        }
        debug!("wakeup coordinator torn down");
    }
}
