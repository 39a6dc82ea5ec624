//! # Audio Seam
//!
//! Sound commands are dispatched to an [`AudioSink`]. The sink receives the
//! sound looked up from the sound store, so it never touches the store
//! itself. Until a real backend is plugged in, [`SilentAudio`] accepts every
//! request and plays nothing.

use noodle_core::Sound;

/// Receiver of sound commands.
pub trait AudioSink: Send + Sync {
    /// Starts or resumes a sound.
    fn play(&self, sound: &Sound);

    /// Pauses a sound.
    fn pause(&self, sound: &Sound);

    /// Stops a sound.
    fn stop(&self, sound: &Sound);
}

/// Sink that logs requests and plays nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&self, sound: &Sound) {
        tracing::debug!(id = %sound.id(), path = %sound.path().display(), volume = sound.volume(), "play (silent)");
    }

    fn pause(&self, sound: &Sound) {
        tracing::debug!(id = %sound.id(), "pause (silent)");
    }

    fn stop(&self, sound: &Sound) {
        tracing::debug!(id = %sound.id(), "stop (silent)");
    }
}
