//! PCM layouts and byte encodings negotiated with the speech service.

use serde::{Deserialize, Serialize};

/// Sample rate and channel layout of a 16-bit PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmFormat {
    /// What the speech service emits: 16-bit PCM at 24 kHz, mono.
    pub const GEMINI_OUTPUT: PcmFormat = PcmFormat {
        sample_rate: 24_000,
        channels: 1,
    };

    pub const fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// MIME type announced when streaming raw samples in this format.
    pub fn pcm_mime_type(&self) -> String {
        format!("audio/pcm;rate={}", self.sample_rate)
    }
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::GEMINI_OUTPUT
    }
}

/// How the PCM bytes reach the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteEncoding {
    /// Plain little-endian bytes.
    #[default]
    Raw,
    /// Standard-alphabet base64 text wrapping the bytes.
    Base64,
}
