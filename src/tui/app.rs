//! Game screen state: cursor, selection, promotion picker, status line.

use super::input::{home_square, is_force_quit, move_cursor, promotion_choice};
use crate::session::ChessController;
use crate::status;
use crossterm::event::{KeyCode, KeyEvent};
use shakmaty::Square;
use std::time::Instant;
use strictly_chess_core::{GameEvent, MoveTemplate, RenderRequest, RulesEngine, TurnState};
use tracing::{debug, info, instrument};

/// What the event loop should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    /// Keep playing.
    Continue,
    /// Leave the game for the setup menu.
    Menu,
    /// Exit the program.
    Quit,
}

/// Main application state for one game.
pub struct App {
    controller: ChessController,
    cursor: Square,
    selected: Option<Square>,
    promotion: Option<(Square, Square)>,
    status_message: String,
}

impl App {
    /// Wraps a freshly built controller.
    pub fn new(controller: ChessController) -> Self {
        let human = controller.human_color();
        Self {
            controller,
            cursor: home_square(human),
            selected: None,
            promotion: None,
            status_message: format!("You play {}", status::color_name(human)),
        }
    }

    /// The controller.
    pub fn controller(&self) -> &ChessController {
        &self.controller
    }

    /// Cursor square.
    pub fn cursor(&self) -> Square {
        self.cursor
    }

    /// Selected square.
    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    /// Pending promotion move, waiting for a piece choice.
    pub fn promotion(&self) -> Option<(Square, Square)> {
        self.promotion
    }

    /// Gets the current status message.
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// Plies on the board.
    pub fn ply(&self) -> usize {
        self.controller.rules().ply_count()
    }

    /// Snapshot for drawing.
    pub fn render_request(&self, now: Instant) -> RenderRequest {
        self.controller.render_request(self.selected, now)
    }

    /// Advances the controller by one tick.
    pub fn tick(&mut self, now: Instant) {
        let events = self.controller.tick(now);
        self.handle_events(&events);
    }

    /// Handles one key event. Ctrl-C quits even while the promotion picker
    /// is open.
    pub fn handle_key_event(&mut self, key: KeyEvent, now: Instant) -> AppAction {
        if is_force_quit(&key) {
            info!("User quit");
            return AppAction::Quit;
        }
        self.handle_key(key.code, now)
    }

    /// Handles one key press.
    #[instrument(skip(self, now))]
    pub fn handle_key(&mut self, key: KeyCode, now: Instant) -> AppAction {
        if let Some((from, to)) = self.promotion {
            match key {
                KeyCode::Esc => {
                    self.promotion = None;
                    self.status_message = "Promotion cancelled".to_string();
                }
                key => {
                    if let Some(role) = promotion_choice(key) {
                        self.promotion = None;
                        self.submit(MoveTemplate::new(from, to, Some(role)), now);
                    }
                }
            }
            return AppAction::Continue;
        }

        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                info!("User quit");
                return AppAction::Quit;
            }
            KeyCode::Char('m') => {
                info!("Back to menu");
                return AppAction::Menu;
            }
            KeyCode::Char('r') => {
                let events = self.controller.restart(now);
                self.handle_events(&events);
            }
            KeyCode::Char('u') => {
                let events = self.controller.undo(now);
                self.handle_events(&events);
            }
            KeyCode::Char('y') => {
                let events = self.controller.redo(now);
                self.handle_events(&events);
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.select(now),
            key @ (KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right) => {
                self.cursor = move_cursor(self.cursor, key, self.controller.human_color());
            }
            _ => {}
        }
        AppAction::Continue
    }

    fn select(&mut self, now: Instant) {
        match self.controller.state() {
            TurnState::HumanToMove => {}
            TurnState::AgentToMove => {
                self.status_message = "Wait for the agent".to_string();
                return;
            }
            TurnState::GameOver(_) => {
                self.status_message = "Game over. Press r to restart".to_string();
                return;
            }
        }

        let cursor = self.cursor;
        if let Some(from) = self.selected {
            if cursor == from {
                self.selected = None;
                return;
            }
            if self.controller.destinations(from).contains(&cursor) {
                if self.controller.needs_promotion(from, cursor) {
                    self.promotion = Some((from, cursor));
                    self.status_message = "Promote to: q r b n (Esc cancels)".to_string();
                } else {
                    self.submit(MoveTemplate::new(from, cursor, None), now);
                }
                return;
            }
        }

        let own = self
            .controller
            .rules()
            .piece_at(cursor)
            .is_some_and(|piece| piece.color == self.controller.human_color());
        if !own {
            self.status_message = if self.selected.is_some() {
                "Not a legal destination".to_string()
            } else {
                "Select one of your pieces".to_string()
            };
            return;
        }
        if self.controller.destinations(cursor).is_empty() {
            self.status_message = "That piece cannot move".to_string();
            return;
        }
        debug!(square = %cursor, "Selected");
        self.selected = Some(cursor);
    }

    fn submit(&mut self, template: MoveTemplate, now: Instant) {
        self.selected = None;
        match self.controller.submit_move(template, now) {
            Ok(events) => self.handle_events(&events),
            Err(e) => self.status_message = e.to_string(),
        }
    }

    /// Handles game events from the controller.
    fn handle_events(&mut self, events: &[GameEvent]) {
        for event in events {
            debug!(?event, "Handling game event");
            if matches!(
                event,
                GameEvent::Restarted
                    | GameEvent::Undone(_)
                    | GameEvent::Redone(_)
                    | GameEvent::GameOver(_)
            ) {
                self.selected = None;
                self.promotion = None;
            }
            if let Some(line) = status::describe(event, self.controller.human_color()) {
                self.status_message = line;
            }
        }
    }
}
