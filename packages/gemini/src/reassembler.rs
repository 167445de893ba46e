use crate::live::SessionEvent;
use tracing::{debug, warn};
use voice_synth_domain::{
    AudioChunk, ByteEncoding, PcmFormat, PlayableAudioBuffer, VoiceError, build_from_pcm,
};

/// What the session driver should do after an event.
#[derive(Debug, Clone, PartialEq)]
pub enum ReassemblyStep {
    Continue,
    /// The model finished its turn; ask the session to close.
    RequestClose,
    /// The session closed. Produced exactly once.
    Complete(Result<PlayableAudioBuffer, VoiceError>),
}

/// Collects streamed PCM chunks and builds one buffer when the session closes.
#[derive(Debug)]
pub struct Reassembler {
    format: PcmFormat,
    chunks: Vec<AudioChunk>,
    errors: usize,
    done: bool,
}

impl Reassembler {
    pub fn new(format: PcmFormat) -> Self {
        Self {
            format,
            chunks: Vec::new(),
            errors: 0,
            done: false,
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn byte_len(&self) -> usize {
        self.chunks.iter().map(AudioChunk::len).sum()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn observe(&mut self, event: SessionEvent) -> ReassemblyStep {
        if self.done {
            return ReassemblyStep::Continue;
        }

        match event {
            SessionEvent::Opened => ReassemblyStep::Continue,
            SessionEvent::Audio(chunk) => {
                self.chunks.push(chunk);
                ReassemblyStep::Continue
            }
            SessionEvent::TurnComplete => ReassemblyStep::RequestClose,
            SessionEvent::Error(message) => {
                self.errors += 1;
                warn!(%message, chunks = self.chunks.len(), "live session reported an error");
                ReassemblyStep::Continue
            }
            SessionEvent::Closed { reason } => {
                self.done = true;
                debug!(
                    ?reason,
                    chunks = self.chunks.len(),
                    errors = self.errors,
                    "live session closed, assembling audio"
                );
                ReassemblyStep::Complete(self.assemble())
            }
        }
    }

    fn assemble(&mut self) -> Result<PlayableAudioBuffer, VoiceError> {
        if self.chunks.is_empty() {
            return Err(VoiceError::EmptyStream);
        }

        let mut bytes = Vec::with_capacity(self.byte_len());
        for chunk in self.chunks.drain(..) {
            bytes.extend_from_slice(chunk.data());
        }

        build_from_pcm(&bytes, ByteEncoding::Raw, self.format)
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new(PcmFormat::GEMINI_OUTPUT)
    }
}
