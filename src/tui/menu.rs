//! Setup menu: pick a side and a difficulty before each game.

use crate::config::{Difficulty, GameConfig, HumanColor};
use crossterm::event::KeyCode;
use ratatui::widgets::ListState;
use strum::IntoEnumIterator;
use tracing::{info, instrument};

/// Transition out of the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    /// Stay on the menu.
    Stay,
    /// Start a game with the current choices.
    Start,
    /// Exit the program.
    Quit,
}

/// Menu rows.
const ROWS: usize = 2;

/// Side and difficulty choices.
#[derive(Debug, Clone)]
pub struct Menu {
    color: HumanColor,
    difficulty: Difficulty,
    list_state: ListState,
}

impl Menu {
    /// Pre-populates the choices from the config.
    pub fn from_config(config: &GameConfig) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            color: *config.human_color(),
            difficulty: *config.difficulty(),
            list_state,
        }
    }

    /// Chosen side.
    pub fn color(&self) -> HumanColor {
        self.color
    }

    /// Chosen difficulty.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Highlighted row.
    pub fn list_state(&self) -> ListState {
        self.list_state.clone()
    }

    /// Applies the choices to a config.
    pub fn apply(&self, config: &GameConfig) -> GameConfig {
        config
            .clone()
            .with_human_color(self.color)
            .with_difficulty(self.difficulty)
    }

    /// Handles one key press.
    #[instrument(skip(self))]
    pub fn handle_key(&mut self, key: KeyCode) -> MenuAction {
        let row = self.list_state.selected().unwrap_or(0);
        match key {
            KeyCode::Up => self.list_state.select(Some(row.saturating_sub(1))),
            KeyCode::Down => self.list_state.select(Some((row + 1).min(ROWS - 1))),
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') => {
                let forward = key != KeyCode::Left;
                if row == 0 {
                    self.color = self.color.flipped();
                } else {
                    self.difficulty = cycle(self.difficulty, forward);
                }
            }
            KeyCode::Enter => {
                info!(color = %self.color, difficulty = %self.difficulty, "Starting game");
                return MenuAction::Start;
            }
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return MenuAction::Quit,
            _ => {}
        }
        MenuAction::Stay
    }
}

fn cycle(current: Difficulty, forward: bool) -> Difficulty {
    let all: Vec<Difficulty> = Difficulty::iter().collect();
    let index = all.iter().position(|d| *d == current).unwrap_or(0);
    let next = if forward {
        (index + 1) % all.len()
    } else {
        (index + all.len() - 1) % all.len()
    };
    all[next]
}
