//! 16-bit little-endian PCM <-> normalized f32 conversion.
//!
//! Decoding maps every signed sample `s` to `s / 32768.0`, so results lie in
//! `[-1.0, 1.0)`. Encoding is the quantizer used for outbound reference
//! audio and is deliberately asymmetric (negative values scale by 32768,
//! positive by 32767) so that `1.0` and `-1.0` both land on valid samples.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::audio_format::ByteEncoding;
use crate::voice_error::VoiceError;

/// Bytes per 16-bit sample.
pub const SAMPLE_WIDTH: usize = 2;

const DECODE_SCALE: f32 = 32768.0;

/// Decode raw 16-bit little-endian bytes into normalized samples.
pub fn decode_pcm16le(bytes: &[u8]) -> Result<Vec<f32>, VoiceError> {
    if bytes.len() % SAMPLE_WIDTH != 0 {
        return Err(VoiceError::MalformedAudio(format!(
            "{} bytes is not a whole number of {SAMPLE_WIDTH}-byte samples",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(SAMPLE_WIDTH)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / DECODE_SCALE)
        .collect())
}

/// Decode base64 text that wraps 16-bit little-endian PCM.
pub fn decode_base64_pcm16le(text: &str) -> Result<Vec<f32>, VoiceError> {
    let bytes = decode_base64(text)?;
    decode_pcm16le(&bytes)
}

/// Decode `input` according to how it was transported.
pub fn decode(input: &[u8], encoding: ByteEncoding) -> Result<Vec<f32>, VoiceError> {
    match encoding {
        ByteEncoding::Raw => decode_pcm16le(input),
        ByteEncoding::Base64 => {
            let text = std::str::from_utf8(input).map_err(|e| {
                VoiceError::MalformedAudio(format!("base64 payload is not utf-8: {e}"))
            })?;
            decode_base64_pcm16le(text)
        }
    }
}

/// Strip base64 transport encoding without interpreting the bytes.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, VoiceError> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| VoiceError::MalformedAudio(format!("invalid base64 audio: {e}")))
}

/// Quantize normalized samples to 16-bit little-endian bytes.
pub fn encode_pcm16le(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * SAMPLE_WIDTH);
    for &sample in samples {
        let s = sample.clamp(-1.0, 1.0);
        let value = if s < 0.0 {
            s * 32768.0
        } else {
            s * 32767.0
        };
        out.extend_from_slice(&(value as i16).to_le_bytes());
    }
    out
}

/// Quantize and base64-encode samples for transmission.
pub fn encode_base64_pcm16le(samples: &[f32]) -> String {
    STANDARD.encode(encode_pcm16le(samples))
}
