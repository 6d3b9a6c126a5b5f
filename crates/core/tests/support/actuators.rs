//! Recording mock actuators.
//!
//! All mocks share one chronological log so ordering contracts (pause
//! before speak, restore after stop) can be asserted across actuators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chime_core::wakeup::coordinator::WakeupActuators;
use chime_core::wakeup::ports::{
    AudioSink, Flashlight, SpeechSynthesizer, Vibrator, VolumeControl,
};
use chime_domain::Result as DomainResult;

/// Chronological record of every actuator call.
#[derive(Default)]
pub struct ActuatorLog {
    entries: Mutex<Vec<String>>,
}

impl ActuatorLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().expect("log lock").push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().expect("log lock").clone()
    }

    /// Index of the first entry equal to `needle`, if any.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.entries().iter().position(|entry| entry == needle)
    }

    pub fn count(&self, needle: &str) -> usize {
        self.entries().iter().filter(|entry| entry.as_str() == needle).count()
    }
}

pub struct MockAudioSink {
    log: Arc<ActuatorLog>,
    playing: AtomicBool,
}

impl MockAudioSink {
    pub fn new(log: Arc<ActuatorLog>) -> Self {
        Self { log, playing: AtomicBool::new(false) }
    }

    /// Simulate the underlying player stalling without notice.
    pub fn silence(&self) {
        self.playing.store(false, Ordering::SeqCst);
        self.log.push("audio.stalled");
    }
}

#[async_trait]
impl AudioSink for MockAudioSink {
    async fn start(&self, _media_path: Option<&str>) -> DomainResult<()> {
        self.playing.store(true, Ordering::SeqCst);
        self.log.push("audio.start");
        Ok(())
    }

    async fn pause(&self) -> DomainResult<()> {
        self.playing.store(false, Ordering::SeqCst);
        self.log.push("audio.pause");
        Ok(())
    }

    async fn resume(&self) -> DomainResult<()> {
        self.playing.store(true, Ordering::SeqCst);
        self.log.push("audio.resume");
        Ok(())
    }

    async fn stop(&self) -> DomainResult<()> {
        self.playing.store(false, Ordering::SeqCst);
        self.log.push("audio.stop");
        Ok(())
    }

    async fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

pub struct MockVolumeControl {
    log: Arc<ActuatorLog>,
    level: Mutex<u8>,
}

impl MockVolumeControl {
    pub fn new(log: Arc<ActuatorLog>, level: u8) -> Self {
        Self { log, level: Mutex::new(level) }
    }

    /// Simulate the user or OS changing the stream volume behind the
    /// coordinator's back.
    pub fn override_level(&self, level: u8) {
        *self.level.lock().expect("volume lock") = level;
        self.log.push(format!("volume.external({level})"));
    }

    pub fn level(&self) -> u8 {
        *self.level.lock().expect("volume lock")
    }
}

#[async_trait]
impl VolumeControl for MockVolumeControl {
    async fn current_volume(&self) -> DomainResult<u8> {
        Ok(self.level())
    }

    async fn set_volume(&self, volume: u8) -> DomainResult<()> {
        *self.level.lock().expect("volume lock") = volume;
        self.log.push(format!("volume.set({volume})"));
        Ok(())
    }
}

pub struct MockSpeech {
    log: Arc<ActuatorLog>,
    utterance: Duration,
}

impl MockSpeech {
    pub fn new(log: Arc<ActuatorLog>, utterance: Duration) -> Self {
        Self { log, utterance }
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeech {
    async fn speak(&self, phrase: &str) -> DomainResult<()> {
        self.log.push(format!("tts.speak({phrase})"));
        tokio::time::sleep(self.utterance).await;
        self.log.push("tts.done");
        Ok(())
    }

    async fn stop(&self) -> DomainResult<()> {
        self.log.push("tts.stop");
        Ok(())
    }
}

pub struct MockVibrator {
    log: Arc<ActuatorLog>,
}

impl MockVibrator {
    pub fn new(log: Arc<ActuatorLog>) -> Self {
        Self { log }
    }
}

#[async_trait]
impl Vibrator for MockVibrator {
    async fn pulse(&self, _duration_ms: u64) -> DomainResult<()> {
        self.log.push("vibrate.pulse");
        Ok(())
    }

    async fn stop(&self) -> DomainResult<()> {
        self.log.push("vibrate.stop");
        Ok(())
    }
}

pub struct MockFlashlight {
    log: Arc<ActuatorLog>,
}

impl MockFlashlight {
    pub fn new(log: Arc<ActuatorLog>) -> Self {
        Self { log }
    }
}

#[async_trait]
impl Flashlight for MockFlashlight {
    async fn set_on(&self, on: bool) -> DomainResult<()> {
        self.log.push(format!("flash.set({on})"));
        Ok(())
    }
}

/// A full recording actuator set sharing one log.
pub struct RecordingActuators {
    pub log: Arc<ActuatorLog>,
    pub audio: Arc<MockAudioSink>,
    pub volume: Arc<MockVolumeControl>,
    pub speech: Arc<MockSpeech>,
    pub vibrator: Arc<MockVibrator>,
    pub flashlight: Arc<MockFlashlight>,
}

impl RecordingActuators {
    /// Build a set with the given pre-session stream volume and TTS
    /// utterance length.
    pub fn new(initial_volume: u8, utterance: Duration) -> Self {
        let log = Arc::new(ActuatorLog::default());
        Self {
            audio: Arc::new(MockAudioSink::new(Arc::clone(&log))),
            volume: Arc::new(MockVolumeControl::new(Arc::clone(&log), initial_volume)),
            speech: Arc::new(MockSpeech::new(Arc::clone(&log), utterance)),
            vibrator: Arc::new(MockVibrator::new(Arc::clone(&log))),
            flashlight: Arc::new(MockFlashlight::new(Arc::clone(&log))),
            log,
        }
    }

    pub fn ports(&self) -> WakeupActuators {
        WakeupActuators {
            audio: self.audio.clone(),
            volume: self.volume.clone(),
            speech: self.speech.clone(),
            vibrator: self.vibrator.clone(),
            flashlight: self.flashlight.clone(),
        }
    }
}
