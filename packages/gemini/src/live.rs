//! Live session: one task owns the socket, callers talk to it over channels.

use crate::endpoints::generate_content::GenerationConfig;
use crate::endpoints::live::{ClientMessage, RealtimeInput, ServerMessage, SetupMessage};
use crate::endpoints::{Blob, Content};
use crate::error::WebSocketError;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};
use voice_synth_domain::{AudioChunk, VoiceError, pcm};

pub type MediaBlob = Blob;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Connecting,
    /// Setup acknowledged; waiting for input to send.
    Sending,
    /// Input sent; model output expected.
    Receiving,
    Closed,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Opened,
    Audio(AudioChunk),
    TurnComplete,
    /// Non-fatal notice. The session stays up until `Closed`.
    Error(String),
    Closed { reason: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    SendRealtimeInput(MediaBlob),
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSetup {
    pub model: String,
    pub system_instruction: String,
}

impl LiveSetup {
    pub fn new(model: impl Into<String>, system_instruction: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_instruction: system_instruction.into(),
        }
    }

    /// Instruction asking the model to read `text` in the voice of the streamed sample.
    pub fn voice_clone(model: impl Into<String>, text: &str) -> Self {
        let instruction = format!(
            "You are a professional voice actor. I am sending you a continuous audio stream \
             which contains a voice sample. Listen to it and analyze the speaker's voice, tone, \
             pitch and cadence.\n\n\
             Then speak the following text, mimicking that exact voice:\n\"{text}\"\n\n\
             Do not respond to the content of the audio sample. Do not say anything else. \
             Only speak the target text in the cloned voice."
        );
        Self::new(model, instruction)
    }

    pub(crate) fn to_message(&self) -> ClientMessage {
        let model = if self.model.starts_with("models/") {
            self.model.clone()
        } else {
            format!("models/{}", self.model)
        };
        ClientMessage::Setup(SetupMessage {
            model,
            generation_config: GenerationConfig::audio(None),
            system_instruction: Some(Content::from_text(self.system_instruction.clone())),
        })
    }
}

/// Pure transition logic, kept apart from socket I/O.
#[derive(Debug, Default)]
pub(crate) struct SessionMachine {
    state: SessionState,
    sequence: u64,
}

impl SessionMachine {
    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn on_frame(&mut self, payload: &[u8]) -> Vec<SessionEvent> {
        let msg = match ServerMessage::parse(payload) {
            Ok(msg) => msg,
            Err(e) => return vec![SessionEvent::Error(format!("unreadable frame: {e}"))],
        };

        let mut events = Vec::new();

        if msg.setup_complete.is_some() && self.state == SessionState::Connecting {
            self.state = SessionState::Sending;
            events.push(SessionEvent::Opened);
        }

        for data in msg.inline_audio() {
            match pcm::decode_base64(data) {
                Ok(bytes) if bytes.is_empty() => {}
                Ok(bytes) => {
                    debug!(sequence = self.sequence, bytes = bytes.len(), "audio chunk");
                    events.push(SessionEvent::Audio(AudioChunk::new(bytes, self.sequence)));
                    self.sequence += 1;
                }
                Err(e) => events.push(SessionEvent::Error(e.to_string())),
            }
        }

        if msg.turn_complete() {
            events.push(SessionEvent::TurnComplete);
        }

        if let Some(go_away) = msg.go_away {
            events.push(SessionEvent::Error(format!(
                "server is about to disconnect (time left {})",
                go_away.time_left.as_deref().unwrap_or("unknown")
            )));
        }

        events
    }

    pub(crate) fn on_input_sent(&mut self) {
        if self.state == SessionState::Sending {
            self.state = SessionState::Receiving;
        }
    }

    pub(crate) fn on_closed(&mut self, reason: Option<String>, clean: bool) -> SessionEvent {
        self.state = if clean {
            SessionState::Closed
        } else {
            SessionState::Failed
        };
        SessionEvent::Closed { reason }
    }
}

/// Caller side of a live session.
#[derive(Debug)]
pub struct LiveConnection {
    events: mpsc::UnboundedReceiver<SessionEvent>,
    commands: mpsc::UnboundedSender<SessionCommand>,
    state: watch::Receiver<SessionState>,
}

impl LiveConnection {
    /// Wrap channels that some other producer drives.
    pub fn from_channels(
        events: mpsc::UnboundedReceiver<SessionEvent>,
        commands: mpsc::UnboundedSender<SessionCommand>,
    ) -> Self {
        let (_, state) = watch::channel(SessionState::Connecting);
        Self {
            events,
            commands,
            state,
        }
    }

    /// Spawn the socket task. Requires a running tokio runtime.
    pub fn spawn<S>(socket: S, setup: LiveSetup) -> Self
    where
        S: Stream<Item = Result<Message, tungstenite::Error>>
            + Sink<Message, Error = tungstenite::Error>
            + Unpin
            + Send
            + 'static,
    {
        let (event_tx, events) = mpsc::unbounded_channel();
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(SessionState::Connecting);

        tokio::spawn(run_session(socket, setup, event_tx, command_rx, state_tx));

        Self {
            events,
            commands,
            state,
        }
    }

    /// Next event in arrival order; `None` once the session task is gone.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    pub fn send_realtime_input(&self, media: MediaBlob) -> Result<(), VoiceError> {
        self.commands
            .send(SessionCommand::SendRealtimeInput(media))
            .map_err(|_| VoiceError::Transport("live session is no longer running".into()))
    }

    /// Ask the session to close. A no-op once the task has exited.
    pub fn close(&self) {
        let _ = self.commands.send(SessionCommand::Close);
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }
}

async fn run_session<S>(
    socket: S,
    setup: LiveSetup,
    events: mpsc::UnboundedSender<SessionEvent>,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    state: watch::Sender<SessionState>,
) where
    S: Stream<Item = Result<Message, tungstenite::Error>>
        + Sink<Message, Error = tungstenite::Error>
        + Unpin,
{
    let (mut sink, mut stream) = socket.split();
    let mut machine = SessionMachine::default();
    let emit = |event: SessionEvent| {
        let _ = events.send(event);
    };

    let setup_sent = match setup.to_message().to_json() {
        Ok(json) => sink.send(Message::text(json)).await.map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    if let Err(reason) = setup_sent {
        warn!(%reason, "live setup failed");
        emit(SessionEvent::Error(reason.clone()));
        emit(machine.on_closed(Some(reason), false));
        state.send_replace(machine.state());
        return;
    }

    let mut closing = false;

    loop {
        tokio::select! {
            frame = stream.next() => {
                let payload = match frame {
                    Some(Ok(Message::Text(text))) => text.as_bytes().to_vec(),
                    Some(Ok(Message::Binary(bytes))) => bytes.to_vec(),
                    Some(Ok(Message::Close(frame))) => {
                        let reason = close_reason(frame.as_ref());
                        info!(?reason, "live session closed");
                        emit(machine.on_closed(reason, true));
                        break;
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    Some(Ok(Message::Frame(_))) => {
                        emit(SessionEvent::Error(WebSocketError::UnexpectedMessageType.to_string()));
                        continue;
                    }
                    Some(Err(tungstenite::Error::ConnectionClosed)) if closing => {
                        emit(machine.on_closed(None, true));
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "live socket failed");
                        emit(SessionEvent::Error(e.to_string()));
                        emit(machine.on_closed(Some(e.to_string()), false));
                        break;
                    }
                    None => {
                        let reason = (!closing)
                            .then(|| WebSocketError::ClosedWithoutCloseFrame.to_string());
                        emit(machine.on_closed(reason, closing));
                        break;
                    }
                };
                for event in machine.on_frame(&payload) {
                    emit(event);
                }
            }
            command = commands.recv(), if !closing => match command {
                Some(SessionCommand::SendRealtimeInput(media)) => {
                    let sent = ClientMessage::RealtimeInput(RealtimeInput { media_chunks: vec![media] })
                        .to_json()
                        .map_err(|e| e.to_string());
                    let sent = match sent {
                        Ok(json) => sink.send(Message::text(json)).await.map_err(|e| e.to_string()),
                        Err(e) => Err(e),
                    };
                    match sent {
                        Ok(()) => machine.on_input_sent(),
                        Err(reason) => {
                            warn!(%reason, "realtime input not sent");
                            emit(SessionEvent::Error(reason.clone()));
                            emit(machine.on_closed(Some(reason), false));
                            break;
                        }
                    }
                }
                Some(SessionCommand::Close) | None => {
                    closing = true;
                    let frame = CloseFrame {
                        code: CloseCode::Normal,
                        reason: "".into(),
                    };
                    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                        debug!(error = %e, "close frame not sent");
                        emit(machine.on_closed(None, true));
                        break;
                    }
                }
            },
        }
        state.send_replace(machine.state());
    }

    state.send_replace(machine.state());
}

fn close_reason(frame: Option<&CloseFrame>) -> Option<String> {
    let frame = frame?;
    if frame.code == CloseCode::Normal {
        return (!frame.reason.is_empty()).then(|| frame.reason.to_string());
    }
    Some(WebSocketError::NonNormalCloseCode(format!("{}: {}", frame.code, frame.reason)).to_string())
}
