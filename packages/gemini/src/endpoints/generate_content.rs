//! `models/{model}:generateContent` with audio output.

use super::*;
use voice_synth_domain::{SpeakerVoice, VoiceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Audio,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

impl From<VoiceId> for VoiceConfig {
    fn from(voice: VoiceId) -> Self {
        Self {
            prebuilt_voice_config: PrebuiltVoiceConfig {
                voice_name: voice.wire_name().to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerVoiceConfig {
    pub speaker: String,
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSpeakerVoiceConfig {
    pub speaker_voice_configs: Vec<SpeakerVoiceConfig>,
}

/// Voice selection for a generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_config: Option<VoiceConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_speaker_voice_config: Option<MultiSpeakerVoiceConfig>,
}

impl SpeechConfig {
    pub fn single(voice: VoiceId) -> Self {
        Self {
            voice_config: Some(voice.into()),
            multi_speaker_voice_config: None,
        }
    }

    /// Each speaker's lines are read by that speaker's voice.
    pub fn multi_speaker(speakers: &[SpeakerVoice]) -> Self {
        Self {
            voice_config: None,
            multi_speaker_voice_config: Some(MultiSpeakerVoiceConfig {
                speaker_voice_configs: speakers
                    .iter()
                    .map(|s| SpeakerVoiceConfig {
                        speaker: s.name.clone(),
                        voice_config: s.voice.into(),
                    })
                    .collect(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<Modality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

impl GenerationConfig {
    pub fn audio(speech_config: Option<SpeechConfig>) -> Self {
        Self {
            response_modalities: vec![Modality::Audio],
            speech_config,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentBody {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Base64 audio at `candidates[0].content.parts[0].inlineData.data`.
    pub fn first_inline_audio(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .inline_data
            .as_ref()
            .map(|blob| blob.data.as_str())
            .filter(|data| !data.is_empty())
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates.first()?.finish_reason.as_deref()
    }
}

/// One text-to-speech call.
#[derive(Debug, Clone)]
pub struct GenerateContent {
    pub model: String,
    pub body: GenerateContentBody,
}

impl GenerateContent {
    pub fn speech(model: impl Into<String>, text: impl Into<String>, speech: SpeechConfig) -> Self {
        Self {
            model: model.into(),
            body: GenerateContentBody {
                contents: vec![Content::from_text(text)],
                generation_config: GenerationConfig::audio(Some(speech)),
            },
        }
    }
}

impl GeminiEndpoint for GenerateContent {
    const PATH: &'static str = "/v1beta/models/{model}:generateContent";

    const METHOD: Method = Method::POST;

    type ResponseBody = GenerateContentResponse;

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("{model}", self.model.as_str())]
    }

    fn request_body(&self) -> Result<RequestBody> {
        Ok(RequestBody::Json(serde_json::to_value(&self.body)?))
    }

    async fn response_body(self, resp: Response) -> Result<Self::ResponseBody> {
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_voice_body_shape() {
        let endpoint = GenerateContent::speech(
            "gemini-2.5-flash-preview-tts",
            "Hello!",
            SpeechConfig::single(VoiceId::Kore),
        );
        let body = serde_json::to_value(&endpoint.body).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{"parts": [{"text": "Hello!"}]}],
                "generationConfig": {
                    "responseModalities": ["AUDIO"],
                    "speechConfig": {
                        "voiceConfig": {"prebuiltVoiceConfig": {"voiceName": "Kore"}}
                    }
                }
            })
        );
    }

    #[test]
    fn multi_speaker_body_shape() {
        let speakers = [
            SpeakerVoice::new("Joe", VoiceId::Kore),
            SpeakerVoice::new("Jane", VoiceId::Puck),
        ];
        let config = serde_json::to_value(SpeechConfig::multi_speaker(&speakers)).unwrap();
        assert_eq!(
            config,
            json!({
                "multiSpeakerVoiceConfig": {
                    "speakerVoiceConfigs": [
                        {"speaker": "Joe", "voiceConfig": {"prebuiltVoiceConfig": {"voiceName": "Kore"}}},
                        {"speaker": "Jane", "voiceConfig": {"prebuiltVoiceConfig": {"voiceName": "Puck"}}}
                    ]
                }
            })
        );
    }

    #[test]
    fn url_substitutes_model() {
        let endpoint = GenerateContent::speech("tts-model", "x", SpeechConfig::single(VoiceId::Puck));
        let url = endpoint
            .url("https://generativelanguage.googleapis.com")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/tts-model:generateContent"
        );
    }

    #[test]
    fn extracts_first_inline_audio() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"inlineData": {"mimeType": "audio/L16;codec=pcm;rate=24000", "data": "AAEC"}}]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(resp.first_inline_audio(), Some("AAEC"));
        assert_eq!(resp.finish_reason(), Some("STOP"));
    }

    #[test]
    fn missing_or_empty_audio_is_none() {
        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.first_inline_audio(), None);

        let text_only: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "sorry"}]}}]
        }))
        .unwrap();
        assert_eq!(text_only.first_inline_audio(), None);

        let blank: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "audio/pcm", "data": ""}}]}}]
        }))
        .unwrap();
        assert_eq!(blank.first_inline_audio(), None);
    }
}
