//! Terminal UI for Strictly Chess.

mod app;
mod input;
mod menu;
mod ui;

pub use app::{App, AppAction};
pub use input::{home_square, is_force_quit, move_cursor, promotion_choice};
pub use menu::{Menu, MenuAction};

use crate::config::GameConfig;
use crate::recording::{FrameRecorder, RecordedFrame};
use crate::session::build_controller;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// Log file the TUI writes to instead of the terminal.
pub const LOG_FILE: &str = "strictly_chess.log";

/// Run the TUI until the user quits.
pub async fn run_tui(config: GameConfig) -> Result<()> {
    // Setup logging to file to avoid interfering with TUI
    let log_file = std::fs::File::create(LOG_FILE)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init();

    info!("Starting Strictly Chess TUI");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut recorder = FrameRecorder::new(config.recording_path(), *config.max_recorded_frames());
    let res = run_screens(&mut terminal, &config, &mut recorder).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = recorder.flush() {
        warn!(error = %e, "Failed to save recording");
    }
    if let Err(err) = &res {
        error!(error = ?err, "Game loop error");
    }
    res
}

/// Alternates between the setup menu and games until quit.
async fn run_screens(
    terminal: &mut Tui,
    config: &GameConfig,
    recorder: &mut FrameRecorder,
) -> Result<()> {
    let mut menu = Menu::from_config(config);
    loop {
        if run_menu(terminal, &mut menu, config)? == MenuAction::Quit {
            return Ok(());
        }
        let game_config = menu.apply(config);
        let mut app = App::new(build_controller(&game_config, Instant::now())?);
        if run_game(terminal, &mut app, recorder, &game_config).await? == AppAction::Quit {
            return Ok(());
        }
    }
}

fn run_menu(terminal: &mut Tui, menu: &mut Menu, config: &GameConfig) -> Result<MenuAction> {
    loop {
        terminal.draw(|f| ui::draw_menu(f, menu))?;
        if event::poll(config.tick())?
            && let Event::Key(key) = event::read()?
        {
            // Skip key release events (crossterm fires both press and release).
            if key.kind == KeyEventKind::Release {
                continue;
            }
            if input::is_force_quit(&key) {
                return Ok(MenuAction::Quit);
            }
            match menu.handle_key(key.code) {
                MenuAction::Stay => {}
                action => return Ok(action),
            }
        }
    }
}

/// One game: tick, draw, record, read a key.
#[instrument(skip_all, fields(human = %config.human_color(), difficulty = %config.difficulty()))]
async fn run_game(
    terminal: &mut Tui,
    app: &mut App,
    recorder: &mut FrameRecorder,
    config: &GameConfig,
) -> Result<AppAction> {
    info!("Game started");
    loop {
        app.tick(Instant::now());

        let request = app.render_request(Instant::now());
        terminal.draw(|f| ui::draw(f, app, &request))?;
        recorder.record(RecordedFrame::capture(&request, app.ply(), app.status_message()));

        if event::poll(config.tick())?
            && let Event::Key(key) = event::read()?
        {
            if key.kind == KeyEventKind::Release {
                continue;
            }
            match app.handle_key_event(key, Instant::now()) {
                AppAction::Continue => {}
                action => return Ok(action),
            }
        }

        tokio::task::yield_now().await;
    }
}
