//! Turns a [`SynthesisRequest`] into a playing buffer.

use crate::endpoints::generate_content::SpeechConfig;
use crate::live::{LiveConnection, LiveSetup, MediaBlob, SessionEvent};
use crate::reassembler::{ReassemblyStep, Reassembler};
use crate::service::SpeechService;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use voice_synth_domain::{
    AudioPlayer, ByteEncoding, ConversationScript, PcmFormat, PlayableAudioBuffer,
    ReferenceAudio, SpeakerVoice, SynthesisMode, SynthesisRequest, VoiceError, build_from_pcm,
};

/// Snapshot of the request side, polled by the UI.
#[derive(Debug, Clone, Default)]
pub struct GenerationState {
    pub is_loading: bool,
    /// User-facing message of the last failure.
    pub error: Option<String>,
    pub audio: Option<Arc<PlayableAudioBuffer>>,
}

pub struct Orchestrator<S, P> {
    service: S,
    player: P,
    format: PcmFormat,
    state: Mutex<GenerationState>,
}

impl<S, P> Orchestrator<S, P>
where
    S: SpeechService,
    P: AudioPlayer,
{
    pub fn new(service: S, player: P) -> Self {
        Self {
            service,
            player,
            format: PcmFormat::GEMINI_OUTPUT,
            state: Mutex::new(GenerationState::default()),
        }
    }

    pub fn state(&self) -> GenerationState {
        self.state.lock().clone()
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn model_label(&self, mode: SynthesisMode) -> &str {
        self.service.model_for(mode)
    }

    pub fn summary(&self) -> String {
        match &self.state.lock().audio {
            Some(audio) => format!("Generated {:.2}s of audio", audio.duration_seconds()),
            None => "Ready to generate".to_string(),
        }
    }

    /// Run one request end to end. Ends in `play()` or a stored error.
    pub async fn generate(
        &self,
        request: SynthesisRequest,
    ) -> Result<Arc<PlayableAudioBuffer>, VoiceError> {
        {
            let mut state = self.state.lock();
            state.error = None;
            state.audio = None;
            state.is_loading = true;
        }
        self.player.stop();

        let mode = request.mode();
        info!(?mode, model = self.model_label(mode), "generation started");

        let outcome = match self.synthesize(request).await {
            Ok(buffer) => {
                let buffer = Arc::new(buffer);
                self.state.lock().audio = Some(Arc::clone(&buffer));
                self.player.play(Arc::clone(&buffer)).map(|()| buffer)
            }
            Err(e) => Err(e),
        };

        let mut state = self.state.lock();
        state.is_loading = false;
        match &outcome {
            Ok(buffer) => info!(
                seconds = buffer.duration_seconds(),
                "generation finished"
            ),
            Err(e) => {
                error!(error = %e, ?mode, "generation failed");
                state.error = Some(e.user_message());
            }
        }
        outcome
    }

    /// Play the last generated buffer again.
    pub fn replay(&self) -> Result<(), VoiceError> {
        let audio = self.state.lock().audio.clone();
        match audio {
            Some(buffer) => self.player.play(buffer),
            None => Err(VoiceError::InvalidInput(
                "Nothing has been generated yet.".to_string(),
            )),
        }
    }

    pub fn stop(&self) {
        self.player.stop();
    }

    async fn synthesize(&self, request: SynthesisRequest) -> Result<PlayableAudioBuffer, VoiceError> {
        request.validate()?;

        match request {
            SynthesisRequest::Single { text, voice } => {
                let audio = self
                    .service
                    .generate_speech(&text, SpeechConfig::single(voice))
                    .await?;
                build_from_pcm(audio.as_bytes(), ByteEncoding::Base64, self.format)
            }
            SynthesisRequest::Conversation { script, speakers } => {
                warn_unknown_speakers(&script, &speakers);
                let audio = self
                    .service
                    .generate_speech(&script, SpeechConfig::multi_speaker(&speakers))
                    .await?;
                build_from_pcm(audio.as_bytes(), ByteEncoding::Base64, self.format)
            }
            SynthesisRequest::Clone { text, reference } => self.clone_voice(&text, &reference).await,
        }
    }

    async fn clone_voice(
        &self,
        text: &str,
        reference: &ReferenceAudio,
    ) -> Result<PlayableAudioBuffer, VoiceError> {
        let setup = LiveSetup::voice_clone(self.service.model_for(SynthesisMode::Clone), text);
        let conn = self.service.connect_live(setup).await?;
        drive_clone_session(conn, reference, self.format).await
    }
}

/// Feed a live session into a [`Reassembler`] until it closes.
pub async fn drive_clone_session(
    mut conn: LiveConnection,
    reference: &ReferenceAudio,
    format: PcmFormat,
) -> Result<PlayableAudioBuffer, VoiceError> {
    let mut reassembler = Reassembler::new(format);
    let mut reference_sent = false;

    loop {
        let event = conn.next_event().await.unwrap_or_else(|| SessionEvent::Closed {
            reason: Some("session ended without a close event".to_string()),
        });

        if event == SessionEvent::Opened && !reference_sent {
            reference_sent = true;
            let media = MediaBlob {
                mime_type: reference.transmit_mime_type(),
                data: reference.to_base64_pcm(),
            };
            debug!(
                mime_type = %media.mime_type,
                seconds = reference.duration_seconds(),
                "sending reference audio"
            );
            if let Err(e) = conn.send_realtime_input(media) {
                conn.close();
                return Err(e);
            }
        }

        match reassembler.observe(event) {
            ReassemblyStep::Continue => {}
            ReassemblyStep::RequestClose => conn.close(),
            ReassemblyStep::Complete(result) => return result,
        }
    }
}

fn warn_unknown_speakers(script: &str, speakers: &[SpeakerVoice]) {
    let names: Vec<&str> = speakers.iter().map(|s| s.name.trim()).collect();
    let parsed = ConversationScript::parse(script);
    let unknown = parsed.unknown_speakers(&names);
    if !unknown.is_empty() {
        warn!(
            ?unknown,
            configured = ?names,
            "script names speakers without a configured voice"
        );
    }
}
