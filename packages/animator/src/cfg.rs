use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use voice_synth_domain::{SpeakerVoice, SynthesisRequest, VoiceError, VoiceId};

use crate::reference::load_reference;
use crate::visualizer::VisualizerConfig;

pub const DEFAULT_SINGLE_TEXT: &str = "Hello! This is a demonstration of the Gemini neural text-to-speech capabilities. I can read any text you type here.";

pub const DEFAULT_SCRIPT: &str = "Joe: Hi Jane, have you heard about the new Gemini update?\nJane: Yes Joe! The voice generation is incredible.\nJoe: It sounds so lifelike, doesn't it?";

const HELP_TEMPLATE: &str = "{before-help}\
{name} {version} -- by {author}
{about}

{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, help_template = HELP_TEMPLATE)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,

    /// Gemini API key (GOOGLE_API_KEY and API_KEY are also read)
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(flatten)]
    pub ui: UiOptions,
}

#[derive(Debug, Clone, Parser)]
pub struct UiOptions {
    /// skip the terminal UI, print the result and wait for playback
    #[arg(long, global = true, default_value_t = false)]
    pub no_ui: bool,

    /// spectrum refresh rate
    #[arg(long, global = true, value_name = "FPS", default_value_t = 30)]
    pub fps: u32,

    /// number of spectrum bars
    #[arg(long, global = true, value_name = "N", default_value_t = 48)]
    pub bars: usize,
}

impl UiOptions {
    pub fn visualizer_config(&self) -> VisualizerConfig {
        VisualizerConfig::default()
            .with_fps(self.fps)
            .with_bar_count(self.bars)
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// read text aloud with one prebuilt voice
    Speak {
        /// text to speak
        #[arg(default_value = DEFAULT_SINGLE_TEXT)]
        text: String,

        /// prebuilt voice (puck, charon, kore, fenrir, zephyr)
        #[arg(short, long, default_value = "puck")]
        voice: VoiceId,
    },
    /// perform a two-speaker "Name: line" script
    Converse {
        /// script text, one "Name: line" per line
        #[arg(conflicts_with = "file")]
        script: Option<String>,

        /// read the script from a file instead
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,

        #[arg(long, default_value = "Joe")]
        speaker1: String,

        #[arg(long, default_value = "kore")]
        voice1: VoiceId,

        #[arg(long, default_value = "Jane")]
        speaker2: String,

        #[arg(long, default_value = "puck")]
        voice2: VoiceId,
    },
    /// speak text in the voice of a reference recording
    Clone {
        /// text to speak
        text: String,

        /// reference clip (wav, mp3, ogg or flac, up to 10MB)
        #[arg(short, long, value_name = "PATH")]
        reference: PathBuf,
    },
    /// list the prebuilt voices and quit
    Voices,
}

impl Command {
    /// Build the request this command describes. `None` for `voices`.
    pub fn into_request(self) -> Result<Option<SynthesisRequest>, VoiceError> {
        let request = match self {
            Command::Speak { text, voice } => SynthesisRequest::Single { text, voice },
            Command::Converse {
                script,
                file,
                speaker1,
                voice1,
                speaker2,
                voice2,
            } => SynthesisRequest::Conversation {
                script: match (script, file) {
                    (_, Some(path)) => read_script(&path)?,
                    (Some(script), None) => script,
                    (None, None) => DEFAULT_SCRIPT.to_string(),
                },
                speakers: [
                    SpeakerVoice::new(speaker1, voice1),
                    SpeakerVoice::new(speaker2, voice2),
                ],
            },
            Command::Clone { text, reference } => SynthesisRequest::Clone {
                text,
                reference: load_reference(&reference)?,
            },
            Command::Voices => return Ok(None),
        };
        Ok(Some(request))
    }
}

fn read_script(path: &Path) -> Result<String, VoiceError> {
    std::fs::read_to_string(path)
        .map_err(|e| VoiceError::InvalidInput(format!("Cannot read {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_synth_domain::SynthesisMode;

    #[test]
    fn speak_defaults() {
        let cli = Cli::try_parse_from(["voice-synth", "speak"]).unwrap();
        let request = cli.command.into_request().unwrap().unwrap();
        assert_eq!(
            request,
            SynthesisRequest::Single {
                text: DEFAULT_SINGLE_TEXT.to_string(),
                voice: VoiceId::Puck,
            }
        );
        assert_eq!(cli.ui.fps, 30);
        assert!(!cli.ui.no_ui);
    }

    #[test]
    fn converse_uses_named_speakers() {
        let cli = Cli::try_parse_from([
            "voice-synth",
            "converse",
            "Ann: hi\nBob: hey",
            "--speaker1",
            "Ann",
            "--speaker2",
            "Bob",
            "--voice2",
            "charon",
        ])
        .unwrap();
        match cli.command.into_request().unwrap().unwrap() {
            SynthesisRequest::Conversation { script, speakers } => {
                assert_eq!(script, "Ann: hi\nBob: hey");
                assert_eq!(speakers[0], SpeakerVoice::new("Ann", VoiceId::Kore));
                assert_eq!(speakers[1], SpeakerVoice::new("Bob", VoiceId::Charon));
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn converse_without_script_uses_the_demo() {
        let cli = Cli::try_parse_from(["voice-synth", "converse"]).unwrap();
        let request = cli.command.into_request().unwrap().unwrap();
        assert_eq!(request.mode(), SynthesisMode::Conversation);
    }

    #[test]
    fn unknown_voice_is_a_parse_error() {
        assert!(Cli::try_parse_from(["voice-synth", "speak", "hi", "--voice", "nobody"]).is_err());
    }

    #[test]
    fn clone_requires_a_reference() {
        assert!(Cli::try_parse_from(["voice-synth", "clone", "hello"]).is_err());
    }

    #[test]
    fn voices_builds_no_request() {
        let cli = Cli::try_parse_from(["voice-synth", "--no-ui", "voices"]).unwrap();
        assert!(cli.ui.no_ui);
        assert!(cli.command.into_request().unwrap().is_none());
    }

    #[test]
    fn ui_options_clamp_into_visualizer_config() {
        let cli = Cli::try_parse_from(["voice-synth", "voices", "--fps", "500", "--bars", "12"]).unwrap();
        let config = cli.ui.visualizer_config();
        assert_eq!(config.fps, 120);
        assert_eq!(config.bar_count, 12);
    }
}
