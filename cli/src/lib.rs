//! Headless frontend: wires a terminal game and a model-driven session
//! together and prints the session's events to stdout as they happen.

mod cli;
mod event_renderer;

pub use cli::Cli;
pub use cli::Color;

use std::io::IsTerminal;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use autoquest_core::Config;
use autoquest_core::Session;
use autoquest_core::SessionEvent;
use autoquest_core::config::ConfigOverrides;
use autoquest_core::terminal::TerminalGame;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::event_renderer::EventRenderer;

/// Picked up from the current directory when `--config` is not given.
const CONFIG_FILE_NAME: &str = "autoquest.toml";

/// Capacity of the session event channel; the renderer keeps up easily, the
/// bound only matters if stdout blocks.
const EVENT_CHANNEL_CAPACITY: usize = 64;

pub async fn run_main(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        config,
        model,
        summary_model,
        summarize_after,
        system_prompt,
        summary_prompt,
        summary_log,
        cwd,
        color,
        game_command,
    } = cli;

    let (stdout_with_ansi, stderr_with_ansi) = match color {
        Color::Always => (true, true),
        Color::Never => (false, false),
        Color::Auto => (
            std::io::stdout().is_terminal(),
            std::io::stderr().is_terminal(),
        ),
    };

    let default_level = "error";
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(stderr_with_ansi)
        .with_writer(std::io::stderr)
        .try_init();

    let overrides = ConfigOverrides {
        model,
        summary_model,
        summarize_after,
        system_prompt_file: system_prompt,
        summary_prompt_file: summary_prompt,
        summary_log,
        game_command: (!game_command.is_empty()).then_some(game_command),
        game_cwd: cwd,
    };
    let config_path = resolve_config_path(config);
    let config = Config::load(config_path.as_deref(), overrides)
        .context("failed to load configuration")?;

    let game = TerminalGame::spawn(&config.game)
        .await
        .with_context(|| format!("failed to start game command {:?}", config.game.command))?;
    let session = Session::new(config).context("failed to initialize session")?;

    let (events_tx, mut events_rx) =
        tokio::sync::mpsc::channel::<SessionEvent>(EVENT_CHANNEL_CAPACITY);
    let renderer = EventRenderer::create_with_ansi(stdout_with_ansi);
    let session_task = tokio::spawn(session.run(game, events_tx));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                session_task.abort();
                return Ok(());
            }
            event = events_rx.recv() => match event {
                Some(event) => renderer.process_event(&event),
                // The sender lives inside the session task, so a closed
                // channel means the session itself is done.
                None => break,
            },
        }
    }

    session_task
        .await
        .context("session task panicked")?
        .context("session failed")
}

fn resolve_config_path(cli_path: Option<PathBuf>) -> Option<PathBuf> {
    cli_path.or_else(|| {
        let default = Path::new(CONFIG_FILE_NAME);
        default.exists().then(|| default.to_path_buf())
    })
}
