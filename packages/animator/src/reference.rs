//! Loading the reference clip for voice cloning.

use rodio::{Decoder, Source};
use std::io::Cursor;
use std::path::Path;
use voice_synth_domain::{ReferenceAudio, VoiceError};

/// Largest reference file accepted, in bytes.
pub const MAX_REFERENCE_BYTES: u64 = 10 * 1024 * 1024;

pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("wav" | "wave") => "audio/wav",
        Some("ogg" | "oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

/// Read, size-check and decode a reference clip from disk.
pub fn load_reference(path: &Path) -> Result<ReferenceAudio, VoiceError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        VoiceError::InvalidInput(format!("Cannot read {}: {e}", path.display()))
    })?;
    if metadata.len() > MAX_REFERENCE_BYTES {
        return Err(VoiceError::InvalidInput(
            "File size too large. Please upload a file smaller than 10MB.".to_string(),
        ));
    }

    let bytes = std::fs::read(path).map_err(|e| {
        VoiceError::InvalidInput(format!("Cannot read {}: {e}", path.display()))
    })?;

    let reference = decode_reference(bytes, mime_type_for(path))?;
    tracing::info!(
        path = %path.display(),
        sample_rate = reference.sample_rate,
        seconds = reference.duration_seconds(),
        "reference audio loaded"
    );
    Ok(reference)
}

/// Decode an in-memory container and keep only its first channel.
pub fn decode_reference(bytes: Vec<u8>, mime_type: &str) -> Result<ReferenceAudio, VoiceError> {
    if bytes.len() as u64 > MAX_REFERENCE_BYTES {
        return Err(VoiceError::InvalidInput(
            "File size too large. Please upload a file smaller than 10MB.".to_string(),
        ));
    }

    let decoder = Decoder::new(Cursor::new(bytes)).map_err(|e| {
        VoiceError::InvalidInput(format!("Could not decode reference audio: {e}"))
    })?;

    let channels = decoder.channels().max(1) as usize;
    let sample_rate = decoder.sample_rate();
    if sample_rate == 0 {
        return Err(VoiceError::UnsupportedFormat {
            sample_rate,
            channels: channels as u16,
        });
    }

    let samples: Vec<f32> = decoder.step_by(channels).collect();
    if samples.is_empty() {
        return Err(VoiceError::InvalidInput(
            "Reference audio contains no samples.".to_string(),
        ));
    }

    Ok(ReferenceAudio::new(samples, sample_rate, mime_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal 16-bit PCM WAV.
    fn wav(channels: u16, rate: u32, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVEfmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&rate.to_le_bytes());
        out.extend_from_slice(&(rate * channels as u32 * 2).to_le_bytes());
        out.extend_from_slice(&(channels * 2).to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    #[test]
    fn keeps_first_channel_of_stereo() {
        let interleaved: Vec<i16> = (0..200).map(|i| if i % 2 == 0 { 16384 } else { -16384 }).collect();
        let reference = decode_reference(wav(2, 22_050, &interleaved), "audio/wav").unwrap();
        assert_eq!(reference.sample_rate, 22_050);
        assert_eq!(reference.samples.len(), 100);
        assert!(reference.samples.iter().all(|&s| s > 0.0));
        assert_eq!(reference.mime_type, "audio/wav");
    }

    #[test]
    fn garbage_is_rejected() {
        let err = decode_reference(b"definitely not audio".to_vec(), "audio/mpeg").unwrap_err();
        assert!(matches!(err, VoiceError::InvalidInput(_)));
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(mime_type_for(Path::new("voice.MP3")), "audio/mpeg");
        assert_eq!(mime_type_for(Path::new("a/b.wav")), "audio/wav");
        assert_eq!(mime_type_for(Path::new("clip.flac")), "audio/flac");
        assert_eq!(mime_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn missing_file_is_invalid_input() {
        let err = load_reference(Path::new("/nonexistent/voice.wav")).unwrap_err();
        assert!(matches!(err, VoiceError::InvalidInput(_)));
    }
}
