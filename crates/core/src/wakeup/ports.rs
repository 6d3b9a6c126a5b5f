//! Port interfaces for wakeup actuators
//!
//! These traits define the boundaries between the actuator coordinator
//! and the platform's audio/speech/haptic/camera facilities. Adapters may
//! fail at any call; the coordinator logs and degrades instead of
//! aborting the ringing session.

use async_trait::async_trait;
use chime_domain::Result;

/// Trait for alarm media playback
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Start (or force-restart) playback of the configured media.
    async fn start(&self, media_path: Option<&str>) -> Result<()>;

    /// Pause playback, keeping the underlying player ready to resume.
    async fn pause(&self) -> Result<()>;

    /// Resume paused playback.
    async fn resume(&self) -> Result<()>;

    /// Stop playback and release the player.
    async fn stop(&self) -> Result<()>;

    /// Whether audio is currently audible; polled by the watchdog.
    async fn is_playing(&self) -> bool;
}

/// Trait for the alarm stream volume
#[async_trait]
pub trait VolumeControl: Send + Sync {
    /// Read the live stream volume (0-100).
    async fn current_volume(&self) -> Result<u8>;

    /// Set the stream volume (0-100).
    async fn set_volume(&self, volume: u8) -> Result<()>;
}

/// Trait for text-to-speech output
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak the phrase, returning once the utterance has finished.
    async fn speak(&self, phrase: &str) -> Result<()>;

    /// Abort any in-flight utterance.
    async fn stop(&self) -> Result<()>;
}

/// Trait for haptic output
#[async_trait]
pub trait Vibrator: Send + Sync {
    /// Run a single pulse of the given length.
    async fn pulse(&self, duration_ms: u64) -> Result<()>;

    /// Stop vibrating immediately.
    async fn stop(&self) -> Result<()>;
}

/// Trait for the camera flashlight
#[async_trait]
pub trait Flashlight: Send + Sync {
    /// Switch the torch on or off.
    async fn set_on(&self, on: bool) -> Result<()>;
}
