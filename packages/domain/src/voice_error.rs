//! Unified error for every stage between the request and the speaker.
use thiserror::Error;

/// Top-level error covering decoding, streaming, remote calls and playback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceError {
    /// Byte payload cannot be read as whole samples.
    #[error("malformed audio: {0}")]
    MalformedAudio(String),
    /// Declared sample rate or channel count cannot describe audio.
    #[error("unsupported format: sample_rate={sample_rate}, channels={channels}")]
    UnsupportedFormat { sample_rate: u32, channels: u16 },
    /// Streaming session closed before any audio arrived.
    #[error("no audio produced: the session closed without generating audio")]
    EmptyStream,
    /// Remote service answered without a usable audio payload.
    #[error("remote service: {0}")]
    RemoteService(String),
    /// Connection-level failure talking to the remote service.
    #[error("transport: {0}")]
    Transport(String),
    /// Configuration-related failure reason.
    #[error("configuration: {0}")]
    Configuration(String),
    /// User input rejected before any work was attempted.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Output device could not be opened or driven.
    #[error("audio device: {0}")]
    AudioDevice(String),
}

impl VoiceError {
    /// Message suitable for showing to the person who asked for the audio.
    pub fn user_message(&self) -> String {
        match self {
            Self::RemoteService(msg) | Self::InvalidInput(msg) => msg.clone(),
            Self::EmptyStream => "Connection closed without generating audio.".to_string(),
            other => other.to_string(),
        }
    }
}
