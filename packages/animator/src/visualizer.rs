//! Per-frame spectrum snapshots for the display.

use crate::analysis::AnalysisNode;
use std::time::Duration;

/// Configuration for the spectrum visualizer
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizerConfig {
    /// Number of bars drawn across the width
    pub bar_count: usize,
    /// Fraction of frequency bins shown, from the lowest up (speech sits low)
    pub frequency_ceiling: f32,
    /// Target refresh rate
    pub fps: u32,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            bar_count: 48,
            frequency_ceiling: 0.5,
            fps: 30,
        }
    }
}

impl VisualizerConfig {
    pub fn with_bar_count(mut self, bars: usize) -> Self {
        self.bar_count = bars.clamp(1, 512);
        self
    }

    pub fn with_frequency_ceiling(mut self, ceiling: f32) -> Self {
        self.frequency_ceiling = ceiling.clamp(0.05, 1.0);
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.clamp(1, 120);
        self
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.bar_count == 0 || self.bar_count > 512 {
            return Err("Bar count must be between 1 and 512");
        }
        if !(0.05..=1.0).contains(&self.frequency_ceiling) {
            return Err("Frequency ceiling must be between 0.05 and 1.0");
        }
        if self.fps == 0 || self.fps > 120 {
            return Err("FPS must be between 1 and 120");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VisualFrame {
    /// Nothing playing, or no analyser yet: a flat baseline.
    Idle { bars: usize },
    /// Bar heights in `0.0..=1.0`, lowest frequency first.
    Spectrum(Vec<f32>),
}

impl VisualFrame {
    pub fn bar_count(&self) -> usize {
        match self {
            Self::Idle { bars } => *bars,
            Self::Spectrum(levels) => levels.len(),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle { .. })
    }
}

/// Reads the analyser; never touches playback state.
#[derive(Debug, Clone, Default)]
pub struct Visualizer {
    config: VisualizerConfig,
}

impl Visualizer {
    pub fn new(config: VisualizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn frame(&self, analyser: Option<&AnalysisNode>, playing: bool) -> VisualFrame {
        let idle = VisualFrame::Idle {
            bars: self.config.bar_count,
        };
        let Some(node) = analyser.filter(|_| playing) else {
            return idle;
        };

        let bins = node.byte_frequency_data();
        let shown = ((bins.len() as f32 * self.config.frequency_ceiling).round() as usize)
            .clamp(1, bins.len().max(1));
        let Some(bins) = bins.get(..shown).filter(|b| !b.is_empty()) else {
            return idle;
        };

        VisualFrame::Spectrum(group_bins(bins, self.config.bar_count))
    }
}

/// Average `bins` into `bars` buckets, normalized to `0.0..=1.0`.
fn group_bins(bins: &[u8], bars: usize) -> Vec<f32> {
    (0..bars)
        .map(|bar| {
            let start = bar * bins.len() / bars;
            let end = ((bar + 1) * bins.len() / bars).max(start + 1).min(bins.len());
            let bucket = &bins[start.min(bins.len() - 1)..end];
            let sum: u32 = bucket.iter().map(|&b| b as u32).sum();
            sum as f32 / bucket.len() as f32 / 255.0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::SessionId;

    #[test]
    fn no_analyser_is_idle() {
        let visualizer = Visualizer::default();
        assert_eq!(visualizer.frame(None, true), VisualFrame::Idle { bars: 48 });
        assert_eq!(visualizer.frame(None, false), VisualFrame::Idle { bars: 48 });
    }

    #[test]
    fn stopped_playback_is_idle() {
        let node = AnalysisNode::default();
        let frame = Visualizer::default().frame(Some(&node), false);
        assert!(frame.is_idle());
    }

    #[test]
    fn playing_yields_requested_bar_count() {
        let node = AnalysisNode::default();
        let session = SessionId::new(1);
        node.attach(session);
        let tone: Vec<f32> = (0..2048)
            .map(|i| (std::f32::consts::TAU * 440.0 * i as f32 / 24_000.0).sin())
            .collect();
        node.write(session, &tone);

        let visualizer = Visualizer::new(VisualizerConfig::default().with_bar_count(16));
        match visualizer.frame(Some(&node), true) {
            VisualFrame::Spectrum(levels) => {
                assert_eq!(levels.len(), 16);
                assert!(levels.iter().all(|l| (0.0..=1.0).contains(l)));
                assert!(levels[1] > 0.0);
            }
            other => panic!("expected spectrum, got {other:?}"),
        }
    }

    #[test]
    fn more_bars_than_bins_still_fills() {
        let levels = group_bins(&[255, 0], 4);
        assert_eq!(levels, vec![1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn config_clamps_and_validates() {
        let config = VisualizerConfig::default().with_fps(0).with_bar_count(0);
        assert_eq!(config.fps, 1);
        assert_eq!(config.bar_count, 1);
        assert!(config.validate().is_ok());
        assert_eq!(VisualizerConfig::default().frame_interval(), Duration::from_secs_f64(1.0 / 30.0));
    }
}
