//! Gemini text-to-speech client.
//!
//! REST `generateContent` for single and multi-speaker speech, a channel-driven
//! live session for voice cloning, the chunk [`Reassembler`] that turns a live
//! stream into one buffer, and the [`Orchestrator`] that ties a request to an
//! [`voice_synth_domain::AudioPlayer`].

pub mod client;
pub mod endpoints;
pub mod error;
pub mod live;
pub mod orchestrator;
pub mod reassembler;
pub mod service;

pub use client::{ClientConfig, GeminiClient, api_key_from_env};
pub use endpoints::generate_content::SpeechConfig;
pub use error::ClientError;
pub use live::{
    LiveConnection, LiveSetup, MediaBlob, SessionCommand, SessionEvent, SessionState,
};
pub use orchestrator::{GenerationState, Orchestrator, drive_clone_session};
pub use reassembler::{ReassemblyStep, Reassembler};
pub use service::SpeechService;
