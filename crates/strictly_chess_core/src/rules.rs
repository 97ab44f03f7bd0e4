//! Rules engine boundary.
//!
//! The controller only talks to chess rules through [`RulesEngine`]. The
//! bundled implementation, [`ShakmatyRules`], wraps a `shakmaty::Chess`
//! position and keeps the stack of prior positions needed for undo.
//!
//! Besides the board-level endings shakmaty reports, the engine ends the game
//! on the two automatic draws: the 75-move rule and fivefold repetition.

use crate::action::MoveTemplate;
use crate::types::{EndReason, GameResult};
use shakmaty::san::San;
use shakmaty::zobrist::{Zobrist64, ZobristHash};
use shakmaty::{Chess, Color, EnPassantMode, Move, Piece, Position, Square};
use tracing::{debug, instrument};

/// Halfmove clock at which the 75-move rule ends the game.
pub const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;

/// Occurrences of one position that end the game.
pub const FIVEFOLD: usize = 5;

/// Errors raised by the rules engine.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum RulesError {
    /// The move is not legal in the current position.
    #[display("Illegal move: {}", _0)]
    IllegalMove(#[error(not(source))] String),

    /// The text could not be read as a UCI or SAN move.
    #[display("Unrecognized move text: {:?}", _0)]
    Unparseable(#[error(not(source))] String),
}

/// Operations the core consumes from a chess rules engine.
pub trait RulesEngine {
    /// All moves legal in the live position.
    fn legal_moves(&self) -> Vec<Move>;

    /// True once the live position is terminal.
    fn is_game_over(&self) -> bool;

    /// Result signal for a terminal position, `None` while in progress.
    fn result(&self) -> Option<GameResult>;

    /// Why the live position is terminal, `None` while in progress.
    fn end_reason(&self) -> Option<EndReason>;

    /// Applies a legal move.
    fn apply(&mut self, mv: &Move) -> Result<(), RulesError>;

    /// Takes back the last applied move.
    fn undo_last(&mut self) -> Option<Move>;

    /// SAN text for a move legal in the live position.
    fn to_algebraic(&self, mv: &Move) -> String;

    /// Piece on a square of the live position.
    fn piece_at(&self, square: Square) -> Option<Piece>;

    /// Side to move.
    fn turn(&self) -> Color;

    /// Number of plies applied since the last reset.
    fn ply_count(&self) -> usize;

    /// Restores the standard starting position.
    fn reset(&mut self);

    /// Reads UCI (`e2e4`, `e7e8q`) or SAN (`Nf3`) text as a legal move.
    fn parse_move(&self, text: &str) -> Result<Move, RulesError>;
}

/// [`RulesEngine`] backed by `shakmaty`.
#[derive(Debug, Clone)]
pub struct ShakmatyRules {
    position: Chess,
    undo: Vec<(Chess, Move)>,
    /// Zobrist key of every position since the reset, live position last.
    keys: Vec<Zobrist64>,
}

impl Default for ShakmatyRules {
    fn default() -> Self {
        Self::from_position(Chess::default())
    }
}

impl ShakmatyRules {
    /// Creates an engine at the standard starting position.
    #[instrument]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine at an arbitrary position with an empty history.
    pub fn from_position(position: Chess) -> Self {
        let keys = vec![key(&position)];
        Self {
            position,
            undo: Vec::new(),
            keys,
        }
    }

    /// The live position.
    pub fn position(&self) -> &Chess {
        &self.position
    }

    /// How many times the live position has occurred since the reset.
    pub fn repetitions(&self) -> usize {
        let live = key(&self.position);
        self.keys.iter().filter(|k| **k == live).count()
    }

    /// True if an automatic draw rule ends the game.
    fn is_draw_by_rule(&self) -> bool {
        // Mate on the 150th ply still counts as mate.
        if self.position.is_checkmate() {
            return false;
        }
        self.position.halfmoves() >= SEVENTY_FIVE_MOVE_PLIES || self.repetitions() >= FIVEFOLD
    }
}

fn key(position: &Chess) -> Zobrist64 {
    position.zobrist_hash(EnPassantMode::Legal)
}

impl RulesEngine for ShakmatyRules {
    fn legal_moves(&self) -> Vec<Move> {
        self.position.legal_moves().into_iter().collect()
    }

    fn is_game_over(&self) -> bool {
        self.position.is_game_over() || self.is_draw_by_rule()
    }

    fn result(&self) -> Option<GameResult> {
        match self.position.outcome() {
            Some(shakmaty::Outcome::Decisive { winner }) => Some(GameResult::win_for(winner)),
            Some(shakmaty::Outcome::Draw) => Some(GameResult::Draw),
            None if self.is_draw_by_rule() => Some(GameResult::Draw),
            None => None,
        }
    }

    fn end_reason(&self) -> Option<EndReason> {
        if !self.is_game_over() {
            None
        } else if self.position.is_checkmate() {
            Some(EndReason::Checkmate)
        } else if self.position.is_stalemate() {
            Some(EndReason::Stalemate)
        } else if self.position.is_insufficient_material() {
            Some(EndReason::InsufficientMaterial)
        } else {
            Some(EndReason::DrawByRule)
        }
    }

    #[instrument(skip(self), fields(ply = self.undo.len()))]
    fn apply(&mut self, mv: &Move) -> Result<(), RulesError> {
        if !self.position.is_legal(mv) {
            return Err(RulesError::IllegalMove(format!("{mv:?}")));
        }
        let before = self.position.clone();
        self.position.play_unchecked(mv);
        self.undo.push((before, mv.clone()));
        self.keys.push(key(&self.position));
        Ok(())
    }

    #[instrument(skip(self), fields(ply = self.undo.len()))]
    fn undo_last(&mut self) -> Option<Move> {
        let (before, mv) = self.undo.pop()?;
        self.position = before;
        self.keys.pop();
        debug!(mv = ?mv, "Took back move");
        Some(mv)
    }

    fn to_algebraic(&self, mv: &Move) -> String {
        San::from_move(&self.position, mv).to_string()
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.position.board().piece_at(square)
    }

    fn turn(&self) -> Color {
        self.position.turn()
    }

    fn ply_count(&self) -> usize {
        self.undo.len()
    }

    #[instrument(skip(self))]
    fn reset(&mut self) {
        *self = Self::default();
    }

    #[instrument(skip(self))]
    fn parse_move(&self, text: &str) -> Result<Move, RulesError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RulesError::Unparseable(text.to_string()));
        }

        if let Some(template) = MoveTemplate::parse_uci(text) {
            return self
                .legal_moves()
                .into_iter()
                .find(|mv| MoveTemplate::of(mv) == Some(template))
                .ok_or_else(|| RulesError::IllegalMove(text.to_string()));
        }

        let san: San = text
            .parse()
            .map_err(|_| RulesError::Unparseable(text.to_string()))?;
        san.to_move(&self.position)
            .map_err(|_| RulesError::IllegalMove(text.to_string()))
    }
}
