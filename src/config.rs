//! Game configuration loaded from TOML.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use shakmaty::Color;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strictly_chess_core::{ControllerConfig, TimeLimits};
use strum::{EnumIter, EnumString};
use tracing::{debug, info, instrument};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "strictly_chess.toml";

/// Which checkpoint the agent plays with.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    EnumIter,
    EnumString,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    /// Lightly trained policy.
    #[default]
    Easy,
    /// Moderately trained policy.
    Medium,
    /// Fully trained policy.
    Hard,
    /// Hard policy that keeps learning from every game.
    Pro,
}

impl Difficulty {
    /// Checkpoint file name for this level.
    pub fn checkpoint_file(&self) -> String {
        format!("policy_{}.json", self)
    }

    /// True if the agent trains online at this level.
    pub fn continual_learning(&self) -> bool {
        matches!(self, Difficulty::Pro)
    }
}

/// Side the human plays.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    EnumIter,
    EnumString,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HumanColor {
    /// Human moves first.
    #[default]
    White,
    /// Agent moves first.
    Black,
}

impl HumanColor {
    /// The board color.
    pub fn color(&self) -> Color {
        match self {
            HumanColor::White => Color::White,
            HumanColor::Black => Color::Black,
        }
    }

    /// The other side.
    pub fn flipped(&self) -> Self {
        match self {
            HumanColor::White => HumanColor::Black,
            HumanColor::Black => HumanColor::White,
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct GameConfig {
    /// Side the human plays.
    #[serde(default)]
    human_color: HumanColor,

    /// Agent strength.
    #[serde(default)]
    difficulty: Difficulty,

    /// Seconds the agent may take per move.
    #[serde(default = "default_agent_time_limit")]
    agent_time_limit_secs: u64,

    /// Seconds the human may take per move, untimed when absent.
    #[serde(default)]
    #[setters(strip_option)]
    human_time_limit_secs: Option<u64>,

    /// Directory holding `policy_<level>.json` checkpoints.
    #[serde(default = "default_checkpoint_dir")]
    #[setters(into)]
    checkpoint_dir: PathBuf,

    /// JSON Lines file the session recording is appended to.
    #[serde(default = "default_recording_path")]
    #[setters(into)]
    recording_path: PathBuf,

    /// Frames kept in memory before the oldest are dropped.
    #[serde(default = "default_max_recorded_frames")]
    max_recorded_frames: usize,

    /// Seed for the fallback move picker.
    #[serde(default)]
    #[setters(strip_option)]
    seed: Option<u64>,

    /// Scheduling tick in milliseconds.
    #[serde(default = "default_tick_ms")]
    tick_ms: u64,
}

fn default_agent_time_limit() -> u64 {
    30
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("chess_agent")
}

fn default_recording_path() -> PathBuf {
    PathBuf::from("gameplay.jsonl")
}

fn default_max_recorded_frames() -> usize {
    10_000
}

fn default_tick_ms() -> u64 {
    100
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            human_color: HumanColor::default(),
            difficulty: Difficulty::default(),
            agent_time_limit_secs: default_agent_time_limit(),
            human_time_limit_secs: None,
            checkpoint_dir: default_checkpoint_dir(),
            recording_path: default_recording_path(),
            max_recorded_frames: default_max_recorded_frames(),
            seed: None,
            tick_ms: default_tick_ms(),
        }
    }
}

impl GameConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid configuration.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(
            human_color = %config.human_color,
            difficulty = %config.difficulty,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Loads the file if it exists, otherwise returns defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an existing file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            debug!("No config file, using defaults");
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::new("tick_ms must be positive"));
        }
        if self.max_recorded_frames == 0 {
            return Err(ConfigError::new("max_recorded_frames must be positive"));
        }
        Ok(())
    }

    /// Checkpoint path for the configured difficulty.
    pub fn checkpoint_path(&self) -> PathBuf {
        self.checkpoint_dir.join(self.difficulty.checkpoint_file())
    }

    /// Turn limits. A zero limit means untimed.
    pub fn time_limits(&self) -> TimeLimits {
        let limit = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
        TimeLimits {
            human: self.human_time_limit_secs.and_then(limit),
            agent: limit(self.agent_time_limit_secs),
        }
    }

    /// Scheduling tick.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Controller settings derived from this config.
    pub fn controller_config(&self) -> ControllerConfig {
        let config =
            ControllerConfig::new(self.human_color.color()).with_limits(self.time_limits());
        if self.difficulty.continual_learning() {
            config.with_continual_learning(self.checkpoint_path())
        } else {
            config
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.human_color(), &HumanColor::White);
        assert_eq!(config.difficulty(), &Difficulty::Easy);
        assert_eq!(config.time_limits(), TimeLimits::default());
        assert_eq!(
            config.checkpoint_path(),
            PathBuf::from("chess_agent").join("policy_easy.json")
        );
    }

    #[test]
    fn test_difficulty_names() {
        let names: Vec<String> = Difficulty::iter().map(|d| d.to_string()).collect();
        assert_eq!(names, ["easy", "medium", "hard", "pro"]);
        assert_eq!("pro".parse::<Difficulty>().ok(), Some(Difficulty::Pro));
        assert!(Difficulty::Pro.continual_learning());
        assert!(!Difficulty::Hard.continual_learning());
    }

    #[test]
    fn test_zero_limit_is_untimed() {
        let config = GameConfig::default()
            .with_agent_time_limit_secs(0)
            .with_human_time_limit_secs(0);
        assert_eq!(config.time_limits().agent, None);
        assert_eq!(config.time_limits().human, None);
    }

    #[test]
    fn test_pro_enables_learning() {
        let config = GameConfig::default().with_difficulty(Difficulty::Pro);
        assert_eq!(
            config.controller_config().continual_learning(),
            &Some(config.checkpoint_path())
        );
    }

    #[test]
    fn test_rejects_zero_tick() {
        assert!(GameConfig::from_toml("tick_ms = 0").is_err());
    }
}
