//! Command-line interface for strictly_chess.

use crate::config::{DEFAULT_CONFIG_PATH, Difficulty, GameConfig, HumanColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Chess - play against a trained policy in the terminal
#[derive(Parser, Debug)]
#[command(name = "strictly_chess")]
#[command(about = "Play chess against a reinforcement-learning agent", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file (defaults apply if it does not exist)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// Side to play
    #[arg(long, global = true)]
    pub color: Option<HumanColor>,

    /// Agent strength
    #[arg(long, global = true)]
    pub difficulty: Option<Difficulty>,

    /// Seconds the agent may take per move (0 disables)
    #[arg(long, global = true)]
    pub agent_time_limit: Option<u64>,

    /// Seconds the human may take per move (0 disables)
    #[arg(long, global = true)]
    pub human_time_limit: Option<u64>,

    /// Directory holding policy checkpoints
    #[arg(long, global = true)]
    pub checkpoint_dir: Option<PathBuf>,

    /// Seed for the fallback move picker
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Subcommand to run (defaults to play)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Play in the terminal UI
    Play,

    /// Play with a plain text board on stdin/stdout
    Console,

    /// Print the action table
    Actions,
}

impl Cli {
    /// Applies flag overrides on top of file configuration.
    pub fn apply(&self, mut config: GameConfig) -> GameConfig {
        if let Some(color) = self.color {
            config = config.with_human_color(color);
        }
        if let Some(difficulty) = self.difficulty {
            config = config.with_difficulty(difficulty);
        }
        if let Some(secs) = self.agent_time_limit {
            config = config.with_agent_time_limit_secs(secs);
        }
        if let Some(secs) = self.human_time_limit {
            config = config.with_human_time_limit_secs(secs);
        }
        if let Some(dir) = &self.checkpoint_dir {
            config = config.with_checkpoint_dir(dir.clone());
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config
    }

    /// The subcommand, defaulting to the terminal UI.
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Play)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file() {
        let cli = Cli::parse_from([
            "strictly_chess",
            "console",
            "--color",
            "black",
            "--difficulty",
            "hard",
            "--seed",
            "9",
        ]);
        assert_eq!(cli.command(), Command::Console);
        let config = cli.apply(GameConfig::default());
        assert_eq!(config.human_color(), &HumanColor::Black);
        assert_eq!(config.difficulty(), &Difficulty::Hard);
        assert_eq!(config.seed(), &Some(9));
    }

    #[test]
    fn test_default_command_is_play() {
        let cli = Cli::parse_from(["strictly_chess"]);
        assert_eq!(cli.command(), Command::Play);
        assert_eq!(cli.apply(GameConfig::default()), GameConfig::default());
    }
}
