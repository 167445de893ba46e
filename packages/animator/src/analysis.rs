//! Frequency analysis tap between the playing session and the output device.

use crate::playback::SessionId;
use parking_lot::Mutex;
use rustfft::{Fft, FftPlanner, num_complex::Complex};
use std::sync::Arc;

pub const DEFAULT_FFT_SIZE: usize = 2048;
pub const DEFAULT_SMOOTHING: f32 = 0.8;
pub const DEFAULT_MIN_DECIBELS: f32 = -100.0;
pub const DEFAULT_MAX_DECIBELS: f32 = -30.0;

/// Magnitudes below this are reported as this many dB.
const FLOOR_DECIBELS: f32 = -240.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    /// Power of two, at least 32.
    pub fft_size: usize,
    /// 0.0 = no smoothing, values near 1.0 = heavy smoothing
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            smoothing: DEFAULT_SMOOTHING,
            min_decibels: DEFAULT_MIN_DECIBELS,
            max_decibels: DEFAULT_MAX_DECIBELS,
        }
    }
}

impl AnalysisConfig {
    pub fn with_fft_size(mut self, fft_size: usize) -> Self {
        self.fft_size = fft_size;
        self
    }

    pub fn with_smoothing(mut self, smoothing: f32) -> Self {
        self.smoothing = smoothing.clamp(0.0, 1.0);
        self
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.fft_size < 32 || !self.fft_size.is_power_of_two() {
            return Err("FFT size must be a power of two of at least 32");
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err("Smoothing must be between 0.0 and 1.0");
        }
        if self.min_decibels >= self.max_decibels {
            return Err("Minimum decibels must be below maximum decibels");
        }
        Ok(())
    }
}

/// A fixed-size ring buffer of the most recent samples.
struct RingBuffer<T> {
    buffer: Vec<T>,
    capacity: usize,
    next_idx: usize,
}

impl<T: Default + Copy> RingBuffer<T> {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![T::default(); capacity],
            capacity,
            next_idx: 0,
        }
    }

    fn extend(&mut self, values: &[T]) {
        for &value in values {
            self.buffer[self.next_idx] = value;
            self.next_idx = (self.next_idx + 1) % self.capacity;
        }
    }

    /// Oldest to newest. Never-written slots read as default.
    fn ordered(&self) -> impl Iterator<Item = T> + '_ {
        self.buffer[self.next_idx..]
            .iter()
            .chain(&self.buffer[..self.next_idx])
            .copied()
    }

    fn clear(&mut self) {
        self.buffer.fill(T::default());
        self.next_idx = 0;
    }
}

struct AnalysisState {
    connected: Option<SessionId>,
    time_domain: RingBuffer<f32>,
    smoothed: Vec<f32>,
    window: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
}

/// Long-lived analyser shared by every playback session.
///
/// At most one session is attached at a time; writes from any other session
/// are dropped.
pub struct AnalysisNode {
    config: AnalysisConfig,
    state: Mutex<AnalysisState>,
}

impl std::fmt::Debug for AnalysisNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisNode")
            .field("config", &self.config)
            .field("connected", &self.connected_session())
            .finish()
    }
}

impl Default for AnalysisNode {
    fn default() -> Self {
        Self::build(AnalysisConfig::default())
    }
}

impl AnalysisNode {
    pub fn new(config: AnalysisConfig) -> Result<Self, &'static str> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: AnalysisConfig) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let scratch = vec![Complex::default(); fft.get_inplace_scratch_len()];

        Self {
            state: Mutex::new(AnalysisState {
                connected: None,
                time_domain: RingBuffer::new(config.fft_size),
                smoothed: vec![0.0; config.fft_size / 2],
                window: blackman_window(config.fft_size),
                fft,
                scratch,
            }),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.config.fft_size / 2
    }

    /// Connect `session`, replacing whatever was connected.
    pub fn attach(&self, session: SessionId) {
        let mut state = self.state.lock();
        if let Some(previous) = state.connected.replace(session) {
            if previous != session {
                tracing::debug!(?previous, ?session, "analyser switched session");
            }
        }
    }

    /// Disconnect `session` if it is the connected one. Returns whether it was.
    pub fn detach(&self, session: SessionId) -> bool {
        let mut state = self.state.lock();
        if state.connected != Some(session) {
            return false;
        }
        state.connected = None;
        state.time_domain.clear();
        tracing::debug!(?session, "analyser detached");
        true
    }

    pub fn connected_session(&self) -> Option<SessionId> {
        self.state.lock().connected
    }

    /// Feed mono samples from `session`. Ignored unless it is connected.
    pub fn write(&self, session: SessionId, samples: &[f32]) -> bool {
        let mut state = self.state.lock();
        if state.connected != Some(session) {
            return false;
        }
        state.time_domain.extend(samples);
        true
    }

    /// Most recent `fft_size` samples, oldest first.
    pub fn time_domain_data(&self) -> Vec<f32> {
        self.state.lock().time_domain.ordered().collect()
    }

    /// One analysis pass: smoothed magnitude per bin, in dB.
    pub fn float_frequency_data(&self) -> Vec<f32> {
        let mut state = self.state.lock();
        let state = &mut *state;
        let n = self.config.fft_size;

        let mut spectrum: Vec<Complex<f32>> = state
            .time_domain
            .ordered()
            .zip(&state.window)
            .map(|(sample, w)| Complex::new(sample * w, 0.0))
            .collect();
        state
            .fft
            .process_with_scratch(&mut spectrum, &mut state.scratch);

        let tau = self.config.smoothing;
        state
            .smoothed
            .iter_mut()
            .zip(&spectrum)
            .map(|(previous, bin)| {
                let magnitude = bin.norm() / n as f32;
                *previous = tau * *previous + (1.0 - tau) * magnitude;
                to_decibels(*previous)
            })
            .collect()
    }

    /// [`Self::float_frequency_data`] mapped onto `0..=255` across the dB range.
    pub fn byte_frequency_data(&self) -> Vec<u8> {
        let min = self.config.min_decibels;
        let range = self.config.max_decibels - min;
        self.float_frequency_data()
            .into_iter()
            .map(|db| ((db - min) / range * 255.0).clamp(0.0, 255.0) as u8)
            .collect()
    }
}

fn to_decibels(magnitude: f32) -> f32 {
    if magnitude > 0.0 {
        (20.0 * magnitude.log10()).max(FLOOR_DECIBELS)
    } else {
        FLOOR_DECIBELS
    }
}

pub fn blackman_window(size: usize) -> Vec<f32> {
    const ALPHA: f32 = 0.16;
    let a0 = 0.5 * (1.0 - ALPHA);
    let a1 = 0.5;
    let a2 = 0.5 * ALPHA;
    (0..size)
        .map(|i| {
            let x = i as f32 / size as f32;
            a0 - a1 * (std::f32::consts::TAU * x).cos() + a2 * (2.0 * std::f32::consts::TAU * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (std::f32::consts::TAU * freq * i as f32 / rate).sin() * 0.8)
            .collect()
    }

    fn peak_bin(data: &[f32]) -> usize {
        data.iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn sine_peaks_in_its_bin() {
        let node = AnalysisNode::new(AnalysisConfig::default().with_smoothing(0.0)).unwrap();
        let session = SessionId::new(1);
        node.attach(session);
        // 3000 Hz at 24 kHz with 2048 bins lands on bin 256.
        assert!(node.write(session, &sine(3000.0, 24_000.0, 2048)));

        let data = node.float_frequency_data();
        assert_eq!(data.len(), 1024);
        assert_eq!(peak_bin(&data), 256);
        assert!(data[256] > DEFAULT_MAX_DECIBELS);
    }

    #[test]
    fn writes_from_other_sessions_are_dropped() {
        let node = AnalysisNode::default();
        node.attach(SessionId::new(2));
        assert!(!node.write(SessionId::new(1), &[0.5; 64]));
        assert!(node.time_domain_data().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn detach_only_matches_connected_session() {
        let node = AnalysisNode::default();
        let a = SessionId::new(1);
        let b = SessionId::new(2);
        node.attach(a);
        node.write(a, &[0.25; 16]);

        assert!(!node.detach(b));
        assert_eq!(node.connected_session(), Some(a));

        assert!(node.detach(a));
        assert_eq!(node.connected_session(), None);
        assert!(node.time_domain_data().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn silence_maps_to_zero_bytes() {
        let node = AnalysisNode::default();
        let bytes = node.byte_frequency_data();
        assert_eq!(bytes.len(), node.frequency_bin_count());
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn smoothing_lags_behind_input() {
        let node = AnalysisNode::default();
        let session = SessionId::new(7);
        node.attach(session);
        node.write(session, &sine(3000.0, 24_000.0, 2048));
        let first = node.float_frequency_data()[256];
        let second = node.float_frequency_data()[256];
        assert!(second > first);
    }

    #[test]
    fn window_is_symmetric_and_tapered() {
        let w = blackman_window(8);
        assert!(w[0].abs() < 1e-6);
        assert!((w[4] - 1.0).abs() < 1e-6);
        assert!((w[1] - w[7]).abs() < 1e-6);
    }

    #[test]
    fn rejects_bad_config() {
        assert!(AnalysisConfig::default().with_fft_size(1000).validate().is_err());
        assert!(AnalysisConfig::default().validate().is_ok());
    }
}
