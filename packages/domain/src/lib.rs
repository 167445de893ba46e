//! # Voice Synth Domain
//!
//! Shared domain objects for the voice-synth workspace.
//!
//! This crate holds the pieces every other package agrees on: the error
//! taxonomy, the voice catalogue, request shapes, and the pure audio stages
//! (PCM decoding and buffer construction) that sit between the speech
//! service and the output device.

pub mod audio_buffer;
pub mod audio_chunk;
pub mod audio_format;
pub mod pcm;
pub mod player;
pub mod script;
pub mod speech_request;
pub mod voice_error;
pub mod voice_id;
pub mod voice_profile;

// Re-export core types
pub use audio_buffer::{PlayableAudioBuffer, build_from_pcm};
pub use audio_chunk::AudioChunk;
pub use audio_format::{ByteEncoding, PcmFormat};
pub use player::{AudioPlayer, PlaybackState};
pub use script::{ConversationScript, ScriptLine};
pub use speech_request::{ReferenceAudio, SpeakerVoice, SynthesisMode, SynthesisRequest};
pub use voice_error::VoiceError;
pub use voice_id::VoiceId;
pub use voice_profile::{Gender, VOICE_PROFILES, VoiceProfile};

/// Prelude module containing commonly used types.
pub mod prelude {
    pub use crate::{
        AudioChunk, AudioPlayer, ByteEncoding, PcmFormat, PlayableAudioBuffer, PlaybackState,
        ReferenceAudio, SpeakerVoice, SynthesisMode, SynthesisRequest, VoiceError, VoiceId,
        VoiceProfile,
    };
}
