//! Strictly Chess - unified CLI.

#![warn(missing_docs)]

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Instant;
use strictly_chess::{Cli, Command, FrameRecorder, GameConfig, build_controller, console, tui};
use strictly_chess_core::ActionCodec;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let file_config = GameConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    let config = cli.apply(file_config);

    match cli.command() {
        Command::Play => tui::run_tui(config).await,
        Command::Console => run_console(config).await,
        Command::Actions => print_actions(),
    }
}

fn init_stderr_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Run the text front end on stdin/stdout.
#[instrument(skip_all, fields(human = %config.human_color(), difficulty = %config.difficulty()))]
async fn run_console(config: GameConfig) -> Result<()> {
    init_stderr_tracing();
    info!("Starting console session");

    let mut controller = build_controller(&config, Instant::now())?;
    let mut recorder = FrameRecorder::new(config.recording_path(), *config.max_recorded_frames());

    let mut recorder = tokio::task::spawn_blocking(move || -> Result<FrameRecorder> {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        console::run(&mut controller, &mut recorder, stdin.lock(), stdout.lock())?;
        Ok(recorder)
    })
    .await
    .context("Console task panicked")??;

    recorder.flush().context("Failed to save recording")?;
    Ok(())
}

/// Print the action table.
fn print_actions() -> Result<()> {
    init_stderr_tracing();
    let codec = ActionCodec::build().context("Failed to build action table")?;
    println!("Action space: {}", codec.action_space());
    println!("Table entries: {}", codec.len());
    for (index, template) in codec.iter() {
        println!("{:>5}  {}", index, template.uci());
    }
    Ok(())
}
