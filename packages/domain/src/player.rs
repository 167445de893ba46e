//! Playback seam between request handling and the output device.

use std::sync::Arc;

use crate::audio_buffer::PlayableAudioBuffer;
use crate::voice_error::VoiceError;

/// Lifecycle of the single playback slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing has been played yet.
    #[default]
    Idle,
    Playing,
    Stopped,
}

/// Something that can play one buffer at a time.
///
/// Implementations own their state behind `&self` so that a render loop can
/// observe it while a request is in flight.
pub trait AudioPlayer {
    /// Start `buffer`, superseding whatever is playing.
    fn play(&self, buffer: Arc<PlayableAudioBuffer>) -> Result<(), VoiceError>;

    /// Halt the active playback. Calling this when nothing plays is a no-op.
    fn stop(&self);

    fn state(&self) -> PlaybackState;

    fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }
}

impl<P: AudioPlayer + ?Sized> AudioPlayer for &P {
    fn play(&self, buffer: Arc<PlayableAudioBuffer>) -> Result<(), VoiceError> {
        (**self).play(buffer)
    }

    fn stop(&self) {
        (**self).stop()
    }

    fn state(&self) -> PlaybackState {
        (**self).state()
    }
}
