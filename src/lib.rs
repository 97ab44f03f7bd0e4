//! Strictly Chess - play chess against a trained policy.
//!
//! The game logic lives in `strictly_chess_core`. This crate adds what a
//! playable program needs around it.
//!
//! # Architecture
//!
//! - **Config**: TOML settings with CLI overrides
//! - **Session**: builds a controller with the configured policy
//! - **TUI**: ratatui board with cursor, selection and promotion picker
//! - **Console**: plain text board over stdin/stdout
//! - **Recording**: bounded frame log flushed as JSON Lines
//!
//! # Example
//!
//! ```no_run
//! use std::time::Instant;
//! use strictly_chess::{GameConfig, build_controller};
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = GameConfig::load_or_default("strictly_chess.toml")?;
//! let mut controller = build_controller(&config, Instant::now())?;
//! controller.submit_text("e4", Instant::now())?;
//! controller.tick(Instant::now());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod console;
pub mod recording;
pub mod session;
pub mod status;
pub mod tui;

pub use cli::{Cli, Command};
pub use config::{ConfigError, DEFAULT_CONFIG_PATH, Difficulty, GameConfig, HumanColor};
pub use recording::{FrameRecorder, RecordedFrame, RecorderError};
pub use session::{ChessController, build_controller, load_policy};
