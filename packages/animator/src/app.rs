use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Terminal,
    backend::Backend,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Cell, Paragraph, Row, Table},
};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use voice_synth_domain::{
    AudioPlayer, PlaybackState, SynthesisMode, SynthesisRequest, VoiceProfile,
};
use voice_synth_gemini::{GenerationState, Orchestrator, SpeechService};

use crate::{
    display::{SpectrumBars, accent_color},
    playback::{AudioOutput, PlaybackController},
    visualizer::{Visualizer, VisualizerConfig},
};

pub type ControllerOrchestrator<'c, S, O> = Orchestrator<S, &'c PlaybackController<O>>;

/// What a key press asks the loop to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    TogglePlayback,
    Replay,
    ToggleHeader,
    None,
}

pub fn key_action(key: KeyEvent) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        // mimic other programs shortcuts to quit
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') | KeyCode::Char('w') => KeyAction::Quit,
            _ => KeyAction::None,
        };
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char(' ') => KeyAction::TogglePlayback,
        KeyCode::Char('r') => KeyAction::Replay,
        KeyCode::Char('h') => KeyAction::ToggleHeader,
        _ => KeyAction::None,
    }
}

pub fn mode_label(mode: SynthesisMode) -> &'static str {
    match mode {
        SynthesisMode::Single => "speak",
        SynthesisMode::Conversation => "converse",
        SynthesisMode::Clone => "clone",
    }
}

/// Status text and its colour for the current request state.
pub fn status_line(state: &GenerationState, summary: &str) -> (String, Color) {
    if state.is_loading {
        ("Generating...".to_string(), Color::Yellow)
    } else if let Some(error) = &state.error {
        (error.clone(), Color::Red)
    } else {
        (summary.to_string(), Color::Green)
    }
}

/// Bar colour for a request, taken from its first voice.
pub fn request_accent(request: &SynthesisRequest) -> Color {
    match request {
        SynthesisRequest::Single { voice, .. } => accent_color(VoiceProfile::lookup(*voice).color_tag),
        SynthesisRequest::Conversation { speakers, .. } => {
            accent_color(VoiceProfile::lookup(speakers[0].voice).color_tag)
        }
        SynthesisRequest::Clone { .. } => Color::Cyan,
    }
}

pub struct TerminalApp {
    visualizer: Visualizer,
    mode: SynthesisMode,
    accent: Color,
    show_header: bool,
    /// Transient message from the last key action.
    notice: Option<String>,
}

impl TerminalApp {
    pub fn new(config: VisualizerConfig, mode: SynthesisMode) -> Self {
        Self {
            visualizer: Visualizer::new(config),
            mode,
            accent: Color::Cyan,
            show_header: true,
            notice: None,
        }
    }

    pub fn with_accent(mut self, accent: Color) -> Self {
        self.accent = accent;
        self
    }

    /// Run `request` and keep drawing until the user quits.
    pub async fn run<B, S, O>(
        &mut self,
        orchestrator: &ControllerOrchestrator<'_, S, O>,
        request: SynthesisRequest,
        terminal: &mut Terminal<B>,
    ) -> Result<()>
    where
        B: Backend,
        S: SpeechService,
        O: AudioOutput,
    {
        let generation = orchestrator.generate(request);
        tokio::pin!(generation);
        let mut pending = true;

        let mut ticker = tokio::time::interval(self.visualizer.config().frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut frames = 0;
        let mut framerate = 0;
        let mut last_poll = Instant::now();

        loop {
            tokio::select! {
                result = &mut generation, if pending => {
                    pending = false;
                    if let Err(e) = result {
                        tracing::debug!(error = %e, "request ended with an error");
                    }
                }
                _ = ticker.tick() => {
                    frames += 1;
                    if last_poll.elapsed().as_secs() >= 1 {
                        framerate = frames;
                        frames = 0;
                        last_poll = Instant::now();
                    }

                    self.draw(orchestrator, terminal, framerate)?;

                    // process all enqueued events
                    while event::poll(Duration::from_millis(0))? {
                        if let Event::Key(key) = event::read()? {
                            if self.apply(key_action(key), orchestrator) {
                                return Ok(());
                            }
                        }
                    }
                }
            }
        }
    }

    /// Returns true when the loop should end.
    pub fn apply<S, O>(
        &mut self,
        action: KeyAction,
        orchestrator: &ControllerOrchestrator<'_, S, O>,
    ) -> bool
    where
        S: SpeechService,
        O: AudioOutput,
    {
        self.notice = None;
        match action {
            KeyAction::Quit => {
                orchestrator.stop();
                return true;
            }
            KeyAction::TogglePlayback if orchestrator.player().is_playing() => orchestrator.stop(),
            KeyAction::TogglePlayback | KeyAction::Replay => {
                if let Err(e) = orchestrator.replay() {
                    self.notice = Some(e.user_message());
                }
            }
            KeyAction::ToggleHeader => self.show_header = !self.show_header,
            KeyAction::None => {}
        }
        false
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    fn draw<B, S, O>(
        &self,
        orchestrator: &ControllerOrchestrator<'_, S, O>,
        terminal: &mut Terminal<B>,
        framerate: usize,
    ) -> Result<()>
    where
        B: Backend,
        S: SpeechService,
        O: AudioOutput,
    {
        let controller = *orchestrator.player();
        let playback = controller.state();
        let analyser = controller.analyser();
        let frame = self
            .visualizer
            .frame(analyser.as_deref(), playback == PlaybackState::Playing);

        let state = orchestrator.state();
        let (status, status_color) = match &self.notice {
            Some(notice) => (notice.clone(), Color::Yellow),
            None => status_line(&state, &orchestrator.summary()),
        };
        let model = orchestrator.model_label(self.mode).to_string();

        terminal
            .draw(|f| {
                let mut size = f.area();
                if self.show_header && size.height > 2 {
                    f.render_widget(
                        make_header(self.mode, &model, framerate, playback),
                        Rect { height: 1, ..size },
                    );
                    f.render_widget(
                        Paragraph::new(status.as_str()).style(Style::default().fg(status_color)),
                        Rect {
                            y: size.y + 1,
                            height: 1,
                            ..size
                        },
                    );
                    size.height -= 2;
                    size.y += 2;
                }
                f.render_widget(SpectrumBars::new(&frame).bar_color(self.accent), size);
            })
            .map_err(|e| anyhow::anyhow!("Terminal draw error: {}", e))?;
        Ok(())
    }
}

fn make_header<'a>(
    mode: SynthesisMode,
    model: &'a str,
    fps: usize,
    playback: PlaybackState,
) -> Table<'a> {
    Table::new(
        vec![Row::new(vec![
            Cell::from("voice-synth").style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Cell::from(mode_label(mode)),
            Cell::from(model),
            Cell::from(format!("{fps}fps")),
            Cell::from(match playback {
                PlaybackState::Playing => "|>",
                PlaybackState::Stopped => "||",
                PlaybackState::Idle => "--",
            }),
        ])],
        vec![
            Constraint::Percentage(20),
            Constraint::Percentage(12),
            Constraint::Percentage(50),
            Constraint::Percentage(10),
            Constraint::Percentage(8),
        ],
    )
    .style(Style::default().fg(Color::Gray))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{MemoryOutput, PlaybackContext};
    use std::sync::Arc;
    use voice_synth_domain::{PcmFormat, PlayableAudioBuffer, VoiceError};
    use voice_synth_gemini::{LiveConnection, LiveSetup, SpeechConfig};

    struct Unreachable;

    impl SpeechService for Unreachable {
        async fn generate_speech(&self, _: &str, _: SpeechConfig) -> Result<String, VoiceError> {
            Err(VoiceError::Transport("offline".into()))
        }

        async fn connect_live(&self, _: LiveSetup) -> Result<LiveConnection, VoiceError> {
            Err(VoiceError::Transport("offline".into()))
        }
    }

    fn controller() -> (PlaybackController<MemoryOutput>, MemoryOutput) {
        let output = MemoryOutput::new();
        let handle = output.clone();
        (
            PlaybackController::new(PlaybackContext::new(move || Ok(handle.clone()))),
            output,
        )
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn quit_keys() {
        assert_eq!(key_action(key(KeyCode::Char('q'), KeyModifiers::NONE)), KeyAction::Quit);
        assert_eq!(key_action(key(KeyCode::Esc, KeyModifiers::NONE)), KeyAction::Quit);
        assert_eq!(key_action(key(KeyCode::Char('c'), KeyModifiers::CONTROL)), KeyAction::Quit);
        assert_eq!(key_action(key(KeyCode::Char('x'), KeyModifiers::CONTROL)), KeyAction::None);
    }

    #[test]
    fn playback_keys() {
        assert_eq!(
            key_action(key(KeyCode::Char(' '), KeyModifiers::NONE)),
            KeyAction::TogglePlayback
        );
        assert_eq!(key_action(key(KeyCode::Char('r'), KeyModifiers::NONE)), KeyAction::Replay);
    }

    #[test]
    fn accent_follows_the_chosen_voice() {
        use voice_synth_domain::{ReferenceAudio, SpeakerVoice, VoiceId};

        let single = SynthesisRequest::Single {
            text: "hi".into(),
            voice: VoiceId::Kore,
        };
        assert_eq!(request_accent(&single), Color::Green);

        let conversation = SynthesisRequest::Conversation {
            script: "A: hi".into(),
            speakers: [
                SpeakerVoice::new("A", VoiceId::Fenrir),
                SpeakerVoice::new("B", VoiceId::Puck),
            ],
        };
        assert_eq!(request_accent(&conversation), Color::Red);

        let clone = SynthesisRequest::Clone {
            text: "hi".into(),
            reference: ReferenceAudio::new(vec![0.0], 16_000, "audio/wav"),
        };
        assert_eq!(request_accent(&clone), Color::Cyan);
    }

    #[test]
    fn status_prefers_loading_then_error() {
        let mut state = GenerationState {
            is_loading: true,
            error: Some("boom".into()),
            audio: None,
        };
        assert_eq!(status_line(&state, "Ready to generate").1, Color::Yellow);
        state.is_loading = false;
        assert_eq!(status_line(&state, "Ready to generate"), ("boom".to_string(), Color::Red));
        state.error = None;
        assert_eq!(status_line(&state, "Ready to generate").0, "Ready to generate");
    }

    #[test]
    fn replay_without_audio_leaves_a_notice() {
        let (controller, _output) = controller();
        let orchestrator = Orchestrator::new(Unreachable, &controller);
        let mut app = TerminalApp::new(VisualizerConfig::default(), SynthesisMode::Single);

        assert!(!app.apply(KeyAction::Replay, &orchestrator));
        assert_eq!(app.notice(), Some("Nothing has been generated yet."));
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn space_stops_active_playback() {
        let (controller, _output) = controller();
        let orchestrator = Orchestrator::new(Unreachable, &controller);
        let mut app = TerminalApp::new(VisualizerConfig::default(), SynthesisMode::Single);

        let buffer = PlayableAudioBuffer::with_format(vec![0.1; 64], PcmFormat::GEMINI_OUTPUT).unwrap();
        controller.play(Arc::new(buffer)).unwrap();
        assert!(!app.apply(KeyAction::TogglePlayback, &orchestrator));
        assert_eq!(controller.state(), PlaybackState::Stopped);

        assert!(app.apply(KeyAction::Quit, &orchestrator));
    }

    #[tokio::test]
    async fn failed_request_shows_its_message() {
        let (controller, _output) = controller();
        let orchestrator = Orchestrator::new(Unreachable, &controller);
        let request = SynthesisRequest::Single {
            text: "hi".into(),
            voice: Default::default(),
        };
        assert!(orchestrator.generate(request).await.is_err());

        let state = orchestrator.state();
        let (status, color) = status_line(&state, &orchestrator.summary());
        assert_eq!(color, Color::Red);
        assert!(!status.is_empty());
    }
}
