//! Playback, spectrum analysis and the terminal front end.

pub mod analysis;
pub mod app;
pub mod cfg;
pub mod display;
pub mod playback;
pub mod reference;
pub mod visualizer;

pub use analysis::{AnalysisConfig, AnalysisNode};
pub use app::TerminalApp;
pub use display::SpectrumBars;
pub use playback::{
    AudioOutput, MemoryOutput, PlaybackContext, PlaybackController, RodioOutput, SessionId,
};
pub use reference::load_reference;
pub use visualizer::{VisualFrame, Visualizer, VisualizerConfig};
