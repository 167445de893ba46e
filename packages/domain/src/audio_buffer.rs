//! Playable audio buffers assembled from decoded samples.

use crate::audio_format::{ByteEncoding, PcmFormat};
use crate::pcm;
use crate::voice_error::VoiceError;

/// Decoded audio ready to hand to an output device.
///
/// Samples are stored de-interleaved, one vector per channel, all of equal
/// length. The interleaved form is rebuilt on demand for playback.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayableAudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
    duration_seconds: f64,
}

impl PlayableAudioBuffer {
    /// Build a buffer from interleaved samples.
    ///
    /// Fails with `UnsupportedFormat` when the rate or channel count is zero
    /// and with `MalformedAudio` when the sample count does not divide evenly
    /// into frames.
    pub fn from_interleaved(
        samples: Vec<f32>,
        sample_rate: u32,
        channel_count: u16,
    ) -> Result<Self, VoiceError> {
        if sample_rate == 0 || channel_count == 0 {
            return Err(VoiceError::UnsupportedFormat {
                sample_rate,
                channels: channel_count,
            });
        }

        let channel_count = channel_count as usize;
        if samples.len() % channel_count != 0 {
            return Err(VoiceError::MalformedAudio(format!(
                "{} samples cannot be split evenly across {channel_count} channels",
                samples.len()
            )));
        }

        let frames = samples.len() / channel_count;
        let channels = if channel_count == 1 {
            vec![samples]
        } else {
            let mut channels = vec![Vec::with_capacity(frames); channel_count];
            for frame in samples.chunks_exact(channel_count) {
                for (channel, &sample) in channels.iter_mut().zip(frame) {
                    channel.push(sample);
                }
            }
            channels
        };

        Ok(Self {
            sample_rate,
            channels,
            duration_seconds: frames as f64 / sample_rate as f64,
        })
    }

    /// Build a buffer in a given PCM layout.
    pub fn with_format(samples: Vec<f32>, format: PcmFormat) -> Result<Self, VoiceError> {
        Self::from_interleaved(samples, format.sample_rate, format.channels)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Total samples across every channel.
    pub fn len(&self) -> usize {
        self.frames() * self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn channel_data(&self, channel: usize) -> Option<&[f32]> {
        self.channels.get(channel).map(Vec::as_slice)
    }

    /// Sample `frame` of `channel`, if both exist.
    pub fn sample(&self, channel: usize, frame: usize) -> Option<f32> {
        self.channels.get(channel)?.get(frame).copied()
    }

    /// Samples in playback order (frame by frame, channel by channel).
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.len());
        for frame in 0..self.frames() {
            for channel in &self.channels {
                out.push(channel[frame]);
            }
        }
        out
    }
}

/// Decode PCM bytes and build a buffer in one step.
pub fn build_from_pcm(
    bytes: &[u8],
    encoding: ByteEncoding,
    format: PcmFormat,
) -> Result<PlayableAudioBuffer, VoiceError> {
    // Reject the layout before paying for the decode.
    if format.sample_rate == 0 || format.channels == 0 {
        return Err(VoiceError::UnsupportedFormat {
            sample_rate: format.sample_rate,
            channels: format.channels,
        });
    }
    let samples = pcm::decode(bytes, encoding)?;
    tracing::debug!(
        samples = samples.len(),
        sample_rate = format.sample_rate,
        channels = format.channels,
        "built playable buffer from pcm"
    );
    PlayableAudioBuffer::with_format(samples, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_seconds_of_mono_at_24khz() {
        let buffer = PlayableAudioBuffer::from_interleaved(vec![0.0; 48_000], 24_000, 1).unwrap();
        assert!((buffer.duration_seconds() - 2.0).abs() < 1e-9);
        assert_eq!(buffer.frames(), 48_000);
        assert_eq!(buffer.channel_count(), 1);
    }

    #[test]
    fn mono_samples_are_used_directly() {
        let samples = vec![0.1, -0.2, 0.3];
        let buffer = PlayableAudioBuffer::from_interleaved(samples.clone(), 24_000, 1).unwrap();
        assert_eq!(buffer.channel_data(0), Some(samples.as_slice()));
        assert_eq!(buffer.interleaved(), samples);
    }

    #[test]
    fn stereo_is_deinterleaved() {
        let buffer =
            PlayableAudioBuffer::from_interleaved(vec![1.0, -1.0, 0.5, -0.5], 48_000, 2).unwrap();
        assert_eq!(buffer.channel_data(0), Some(&[1.0, 0.5][..]));
        assert_eq!(buffer.channel_data(1), Some(&[-1.0, -0.5][..]));
        assert_eq!(buffer.len(), 4);
        assert_eq!(buffer.interleaved(), vec![1.0, -1.0, 0.5, -0.5]);
        assert!((buffer.duration_seconds() - 2.0 / 48_000.0).abs() < 1e-12);
    }

    #[test]
    fn zero_rate_or_channels_is_unsupported() {
        assert_eq!(
            PlayableAudioBuffer::from_interleaved(vec![0.0; 4], 0, 1),
            Err(VoiceError::UnsupportedFormat {
                sample_rate: 0,
                channels: 1
            })
        );
        assert!(matches!(
            PlayableAudioBuffer::from_interleaved(vec![0.0; 4], 24_000, 0),
            Err(VoiceError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn ragged_frames_are_rejected() {
        assert!(matches!(
            PlayableAudioBuffer::from_interleaved(vec![0.0; 3], 24_000, 2),
            Err(VoiceError::MalformedAudio(_))
        ));
    }

    #[test]
    fn build_from_pcm_decodes_then_builds() {
        let bytes: Vec<u8> = [0i16, 16384, -16384]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let buffer = build_from_pcm(&bytes, ByteEncoding::Raw, PcmFormat::GEMINI_OUTPUT).unwrap();
        assert_eq!(buffer.channel_data(0), Some(&[0.0, 0.5, -0.5][..]));
    }

    #[test]
    fn build_from_pcm_checks_format_first() {
        let err = build_from_pcm(&[0x00], ByteEncoding::Raw, PcmFormat::new(0, 1)).unwrap_err();
        assert!(matches!(err, VoiceError::UnsupportedFormat { .. }));
    }
}
