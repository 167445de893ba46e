//! The three request shapes a user can ask for.

use crate::audio_format::PcmFormat;
use crate::pcm;
use crate::voice_error::VoiceError;
use crate::voice_id::VoiceId;

/// One named participant in a conversation and the voice they use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerVoice {
    pub name: String,
    pub voice: VoiceId,
}

impl SpeakerVoice {
    pub fn new(name: impl Into<String>, voice: VoiceId) -> Self {
        Self {
            name: name.into(),
            voice,
        }
    }
}

/// Decoded reference clip used to clone a voice.
///
/// Only the first channel of the source file is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// MIME type of the file the samples were decoded from.
    pub mime_type: String,
}

impl ReferenceAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32, mime_type: impl Into<String>) -> Self {
        Self {
            samples,
            sample_rate,
            mime_type: mime_type.into(),
        }
    }

    /// MIME type announced for the re-encoded 16-bit stream.
    pub fn transmit_mime_type(&self) -> String {
        PcmFormat::new(self.sample_rate, 1).pcm_mime_type()
    }

    /// Samples re-encoded to 16-bit PCM, wrapped in base64.
    pub fn to_base64_pcm(&self) -> String {
        pcm::encode_base64_pcm16le(&self.samples)
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisMode {
    Single,
    Conversation,
    Clone,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisRequest {
    /// One text read by one prebuilt voice.
    Single { text: String, voice: VoiceId },
    /// A `Name: line` script read by two speakers.
    Conversation {
        script: String,
        speakers: [SpeakerVoice; 2],
    },
    /// Text read in the voice heard in a reference clip.
    Clone {
        text: String,
        reference: ReferenceAudio,
    },
}

impl SynthesisRequest {
    pub fn mode(&self) -> SynthesisMode {
        match self {
            Self::Single { .. } => SynthesisMode::Single,
            Self::Conversation { .. } => SynthesisMode::Conversation,
            Self::Clone { .. } => SynthesisMode::Clone,
        }
    }

    /// Reject requests that cannot produce audio before any network work.
    pub fn validate(&self) -> Result<(), VoiceError> {
        match self {
            Self::Single { text, .. } => require_text(text, "Please enter some text to speak."),
            Self::Conversation { script, speakers } => {
                require_text(script, "Please enter a conversation script.")?;
                if speakers.iter().any(|s| s.name.trim().is_empty()) {
                    return Err(VoiceError::InvalidInput(
                        "Both speakers need a name.".to_string(),
                    ));
                }
                Ok(())
            }
            Self::Clone { text, reference } => {
                require_text(text, "Please enter some text to speak.")?;
                if reference.samples.is_empty() {
                    return Err(VoiceError::InvalidInput(
                        "Please upload a reference audio file.".to_string(),
                    ));
                }
                if reference.sample_rate == 0 {
                    return Err(VoiceError::UnsupportedFormat {
                        sample_rate: 0,
                        channels: 1,
                    });
                }
                Ok(())
            }
        }
    }
}

fn require_text(text: &str, message: &str) -> Result<(), VoiceError> {
    if text.trim().is_empty() {
        Err(VoiceError::InvalidInput(message.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ReferenceAudio {
        ReferenceAudio::new(vec![0.0, 0.5, -0.5], 48_000, "audio/wav")
    }

    #[test]
    fn blank_text_is_rejected() {
        let request = SynthesisRequest::Single {
            text: "   \n".into(),
            voice: VoiceId::Puck,
        };
        assert!(matches!(request.validate(), Err(VoiceError::InvalidInput(_))));
    }

    #[test]
    fn conversation_needs_named_speakers() {
        let request = SynthesisRequest::Conversation {
            script: "Joe: hi".into(),
            speakers: [
                SpeakerVoice::new("Joe", VoiceId::Kore),
                SpeakerVoice::new(" ", VoiceId::Puck),
            ],
        };
        assert!(matches!(request.validate(), Err(VoiceError::InvalidInput(_))));
    }

    #[test]
    fn clone_needs_reference_samples() {
        let request = SynthesisRequest::Clone {
            text: "Read this".into(),
            reference: ReferenceAudio::new(vec![], 48_000, "audio/wav"),
        };
        assert_eq!(
            request.validate(),
            Err(VoiceError::InvalidInput(
                "Please upload a reference audio file.".into()
            ))
        );

        let ok = SynthesisRequest::Clone {
            text: "Read this".into(),
            reference: reference(),
        };
        assert!(ok.validate().is_ok());
        assert_eq!(ok.mode(), SynthesisMode::Clone);
    }

    #[test]
    fn reference_transmits_as_rate_tagged_pcm() {
        let reference = reference();
        assert_eq!(reference.transmit_mime_type(), "audio/pcm;rate=48000");
        let bytes = pcm::decode_base64(&reference.to_base64_pcm()).unwrap();
        assert_eq!(bytes.len(), reference.samples.len() * 2);
    }
}
