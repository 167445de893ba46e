use crate::client::{DEFAULT_LIVE_MODEL, DEFAULT_TTS_MODEL, GeminiClient};
use crate::endpoints::generate_content::SpeechConfig;
use crate::live::{LiveConnection, LiveSetup};
use voice_synth_domain::{SynthesisMode, VoiceError};

/// The remote speech generator as seen by the orchestrator.
#[allow(async_fn_in_trait)]
pub trait SpeechService {
    /// One non-streaming call. Returns base64 16-bit PCM.
    async fn generate_speech(&self, text: &str, speech: SpeechConfig)
    -> Result<String, VoiceError>;

    /// Open a streaming session.
    async fn connect_live(&self, setup: LiveSetup) -> Result<LiveConnection, VoiceError>;

    fn model_for(&self, mode: SynthesisMode) -> &str {
        match mode {
            SynthesisMode::Single | SynthesisMode::Conversation => DEFAULT_TTS_MODEL,
            SynthesisMode::Clone => DEFAULT_LIVE_MODEL,
        }
    }
}

impl SpeechService for GeminiClient {
    async fn generate_speech(
        &self,
        text: &str,
        speech: SpeechConfig,
    ) -> Result<String, VoiceError> {
        self.generate_content(text, speech).await
    }

    async fn connect_live(&self, setup: LiveSetup) -> Result<LiveConnection, VoiceError> {
        Ok(self.open_live(setup).await?)
    }

    fn model_for(&self, mode: SynthesisMode) -> &str {
        self.config().model_for(mode)
    }
}

impl<S: SpeechService> SpeechService for &S {
    async fn generate_speech(
        &self,
        text: &str,
        speech: SpeechConfig,
    ) -> Result<String, VoiceError> {
        (**self).generate_speech(text, speech).await
    }

    async fn connect_live(&self, setup: LiveSetup) -> Result<LiveConnection, VoiceError> {
        (**self).connect_live(setup).await
    }

    fn model_for(&self, mode: SynthesisMode) -> &str {
        (**self).model_for(mode)
    }
}
