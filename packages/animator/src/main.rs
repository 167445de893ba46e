use anyhow::{Context, Result};
use clap::Parser;
use crossterm::ExecutableCommand;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use voice_synth_animator::{
    app::{TerminalApp, request_accent},
    cfg::{Cli, UiOptions},
    playback::{PlaybackContext, PlaybackController, RodioOutput},
};
use voice_synth_domain::{AudioPlayer, SynthesisRequest, VOICE_PROFILES};
use voice_synth_gemini::{ClientConfig, GeminiClient, Orchestrator, api_key_from_env};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // stderr keeps log lines off the alternate screen
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let Some(request) = cli.command.into_request()? else {
        for profile in VOICE_PROFILES {
            println!(
                "{:<8} {:<7} {}",
                profile.display_name,
                profile.gender.to_string(),
                profile.description
            );
        }
        return Ok(());
    };

    let config = ClientConfig::from_env();
    config.validate()?;
    let api_key = match cli.api_key {
        Some(key) => key,
        None => api_key_from_env()?,
    };
    let client = GeminiClient::new_with_config(api_key, config)
        .context("Failed to create the Gemini client")?;

    let controller = PlaybackController::new(PlaybackContext::system_default());
    let orchestrator = Orchestrator::new(client, &controller);

    if cli.ui.no_ui {
        run_headless(&orchestrator, request).await
    } else {
        run_terminal(&orchestrator, request, &cli.ui).await
    }
}

async fn run_headless(
    orchestrator: &Orchestrator<GeminiClient, &PlaybackController<RodioOutput>>,
    request: SynthesisRequest,
) -> Result<()> {
    if let Err(e) = orchestrator.generate(request).await {
        anyhow::bail!(e.user_message());
    }
    println!("{}", orchestrator.summary());

    while orchestrator.player().is_playing() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    Ok(())
}

async fn run_terminal(
    orchestrator: &Orchestrator<GeminiClient, &PlaybackController<RodioOutput>>,
    request: SynthesisRequest,
    ui: &UiOptions,
) -> Result<()> {
    let mut app =
        TerminalApp::new(ui.visualizer_config(), request.mode()).with_accent(request_accent(&request));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(orchestrator, request, &mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Some(error) = orchestrator.state().error {
        eprintln!("{error}");
    }
    result
}
