//! Single-slot playback controller.
//!
//! Every `play` halts and detaches the previous session before the next one
//! is attached to the analyser, so at most one session ever reaches the
//! output device.

use crate::analysis::AnalysisNode;
use parking_lot::Mutex;
use rodio::{OutputStream, OutputStreamBuilder, Sink, Source};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Duration;
use voice_synth_domain::{AudioPlayer, PlayableAudioBuffer, PlaybackState, VoiceError};

/// Samples forwarded to the analyser per write.
const ANALYSIS_BLOCK: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// State shared between the controller and the source on the audio thread.
#[derive(Debug)]
struct SessionShared {
    state: AtomicU8,
    halted: AtomicBool,
}

const STATE_PLAYING: u8 = 1;
const STATE_STOPPED: u8 = 2;

impl SessionShared {
    fn playing() -> Self {
        Self {
            state: AtomicU8::new(STATE_PLAYING),
            halted: AtomicBool::new(false),
        }
    }

    fn state(&self) -> PlaybackState {
        match self.state.load(Ordering::Acquire) {
            STATE_PLAYING => PlaybackState::Playing,
            _ => PlaybackState::Stopped,
        }
    }

    /// Playing -> Stopped. False if it was already stopped.
    fn finish(&self) -> bool {
        self.state
            .compare_exchange(
                STATE_PLAYING,
                STATE_STOPPED,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// Handle on audio that an [`AudioOutput`] is producing.
pub trait OutputVoice {
    /// Silence it now.
    fn halt(&self);
}

impl OutputVoice for Sink {
    fn halt(&self) {
        self.stop();
    }
}

/// Something that can render a [`SessionSource`].
pub trait AudioOutput {
    type Voice: OutputVoice;

    fn start(&self, source: SessionSource) -> Result<Self::Voice, VoiceError>;
}

/// Default system output through rodio.
pub struct RodioOutput {
    stream: OutputStream,
}

impl RodioOutput {
    pub fn open_default() -> Result<Self, VoiceError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| VoiceError::AudioDevice(format!("Failed to open audio output: {e}")))?;
        // The drop message would land on top of the terminal UI.
        stream.log_on_drop(false);
        tracing::info!("audio output opened");
        Ok(Self { stream })
    }
}

impl AudioOutput for RodioOutput {
    type Voice = Sink;

    fn start(&self, source: SessionSource) -> Result<Sink, VoiceError> {
        let sink = Sink::connect_new(self.stream.mixer());
        sink.append(source);
        Ok(sink)
    }
}

/// In-memory output. Sources queue up and are pulled with [`MemoryOutput::drain`].
#[derive(Clone, Default)]
pub struct MemoryOutput {
    queue: Arc<Mutex<Vec<SessionSource>>>,
}

pub struct MemoryVoice;

impl OutputVoice for MemoryVoice {
    fn halt(&self) {}
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pull up to `max` samples from every queued source, newest last.
    /// Exhausted sources are removed.
    pub fn drain(&self, max: usize) -> Vec<Vec<f32>> {
        let mut queue = self.queue.lock();
        let pulled = queue
            .iter_mut()
            .map(|source| source.by_ref().take(max).collect::<Vec<f32>>())
            .collect();
        queue.retain(|source| !source.is_exhausted());
        pulled
    }

    pub fn queued(&self) -> usize {
        self.queue.lock().len()
    }
}

impl AudioOutput for MemoryOutput {
    type Voice = MemoryVoice;

    fn start(&self, source: SessionSource) -> Result<MemoryVoice, VoiceError> {
        self.queue.lock().push(source);
        Ok(MemoryVoice)
    }
}

/// Buffer source that taps the analyser and reports its natural end.
pub struct SessionSource {
    id: SessionId,
    buffer: Arc<PlayableAudioBuffer>,
    analyser: Arc<AnalysisNode>,
    shared: Arc<SessionShared>,
    position: usize,
    total: usize,
    frame_sum: f32,
    block: Vec<f32>,
    exhausted: bool,
}

impl SessionSource {
    fn new(
        id: SessionId,
        buffer: Arc<PlayableAudioBuffer>,
        analyser: Arc<AnalysisNode>,
        shared: Arc<SessionShared>,
    ) -> Self {
        let total = buffer.len();
        Self {
            id,
            buffer,
            analyser,
            shared,
            position: 0,
            total,
            frame_sum: 0.0,
            block: Vec::with_capacity(ANALYSIS_BLOCK),
            exhausted: false,
        }
    }

    pub fn session(&self) -> SessionId {
        self.id
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn flush(&mut self) {
        if !self.block.is_empty() {
            self.analyser.write(self.id, &self.block);
            self.block.clear();
        }
    }

    fn end(&mut self, natural: bool) {
        self.exhausted = true;
        if natural {
            self.flush();
            if self.shared.finish() {
                tracing::debug!(session = self.id.get(), "playback finished");
            }
            self.analyser.detach(self.id);
        }
    }
}

impl Iterator for SessionSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.exhausted {
            return None;
        }
        if self.shared.halted.load(Ordering::Acquire) {
            self.end(false);
            return None;
        }
        if self.position >= self.total {
            self.end(true);
            return None;
        }

        let channels = self.buffer.channel_count() as usize;
        let frame = self.position / channels;
        let channel = self.position % channels;
        let sample = self.buffer.sample(channel, frame).unwrap_or(0.0);
        self.position += 1;

        self.frame_sum += sample;
        if channel + 1 == channels {
            self.block.push(self.frame_sum / channels as f32);
            self.frame_sum = 0.0;
            if self.block.len() >= ANALYSIS_BLOCK {
                self.flush();
            }
        }

        Some(sample)
    }
}

impl Source for SessionSource {
    fn current_span_len(&self) -> Option<usize> {
        Some(self.total - self.position)
    }

    fn channels(&self) -> rodio::ChannelCount {
        self.buffer.channel_count()
    }

    fn sample_rate(&self) -> rodio::SampleRate {
        self.buffer.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f64(self.buffer.duration_seconds()))
    }
}

type OutputOpener<O> = Box<dyn Fn() -> Result<O, VoiceError>>;

/// Process-wide output device and analyser, both created on first use.
pub struct PlaybackContext<O: AudioOutput> {
    open_output: OutputOpener<O>,
    output: Option<O>,
    analyser: Option<Arc<AnalysisNode>>,
}

impl<O: AudioOutput> PlaybackContext<O> {
    pub fn new(open_output: impl Fn() -> Result<O, VoiceError> + 'static) -> Self {
        Self {
            open_output: Box::new(open_output),
            output: None,
            analyser: None,
        }
    }

    pub fn analyser(&self) -> Option<Arc<AnalysisNode>> {
        self.analyser.clone()
    }

    fn analyser_or_init(&mut self) -> Arc<AnalysisNode> {
        Arc::clone(
            self.analyser
                .get_or_insert_with(|| Arc::new(AnalysisNode::default())),
        )
    }

    fn output(&mut self) -> Result<&O, VoiceError> {
        if self.output.is_none() {
            self.output = Some((self.open_output)()?);
        }
        self.output
            .as_ref()
            .ok_or_else(|| VoiceError::AudioDevice("audio output unavailable".into()))
    }
}

impl PlaybackContext<RodioOutput> {
    pub fn system_default() -> Self {
        Self::new(RodioOutput::open_default)
    }
}

struct ActiveSession<V> {
    id: SessionId,
    shared: Arc<SessionShared>,
    voice: V,
}

struct Slot<O: AudioOutput> {
    context: PlaybackContext<O>,
    active: Option<ActiveSession<O::Voice>>,
    next_id: u64,
}

impl<O: AudioOutput> Slot<O> {
    fn halt_active(&mut self) {
        let Some(active) = &self.active else {
            return;
        };
        active.shared.halted.store(true, Ordering::Release);
        if active.shared.finish() {
            active.voice.halt();
            tracing::debug!(session = active.id.get(), "playback stopped");
        }
        if let Some(analyser) = &self.context.analyser {
            analyser.detach(active.id);
        }
    }
}

pub struct PlaybackController<O: AudioOutput> {
    slot: Mutex<Slot<O>>,
}

impl<O: AudioOutput> PlaybackController<O> {
    pub fn new(context: PlaybackContext<O>) -> Self {
        Self {
            slot: Mutex::new(Slot {
                context,
                active: None,
                next_id: 1,
            }),
        }
    }

    /// `None` until the first `play`.
    pub fn analyser(&self) -> Option<Arc<AnalysisNode>> {
        self.slot.lock().context.analyser()
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.slot.lock().active.as_ref().map(|a| a.id)
    }

    fn start(&self, buffer: Arc<PlayableAudioBuffer>) -> Result<SessionId, VoiceError> {
        let mut slot = self.slot.lock();

        slot.halt_active();

        let analyser = slot.context.analyser_or_init();
        let id = SessionId(slot.next_id);
        slot.next_id += 1;

        analyser.attach(id);
        let shared = Arc::new(SessionShared::playing());
        let source = SessionSource::new(id, Arc::clone(&buffer), Arc::clone(&analyser), Arc::clone(&shared));

        let started = slot.context.output().and_then(|output| output.start(source));
        match started {
            Ok(voice) => {
                slot.active = Some(ActiveSession { id, shared, voice });
                tracing::info!(
                    session = id.get(),
                    seconds = buffer.duration_seconds(),
                    "playback started"
                );
                Ok(id)
            }
            Err(e) => {
                shared.finish();
                analyser.detach(id);
                Err(e)
            }
        }
    }
}

impl<O: AudioOutput> AudioPlayer for PlaybackController<O> {
    fn play(&self, buffer: Arc<PlayableAudioBuffer>) -> Result<(), VoiceError> {
        self.start(buffer).map(|_| ())
    }

    fn stop(&self) {
        self.slot.lock().halt_active();
    }

    fn state(&self) -> PlaybackState {
        self.slot
            .lock()
            .active
            .as_ref()
            .map_or(PlaybackState::Idle, |a| a.shared.state())
    }
}
