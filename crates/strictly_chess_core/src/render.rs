//! Per-tick snapshot handed to a front end.

use crate::controller::TurnState;
use shakmaty::{Color, Piece, Square};
use std::time::Duration;

/// Everything a front end needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    /// Pieces indexed `[rank][file]`, rank 0 = first rank.
    pub board: [[Option<Piece>; 8]; 8],
    /// Square the human has picked up, if any.
    pub selected: Option<Square>,
    /// Legal destinations of the selected piece.
    pub destinations: Vec<Square>,
    /// Origin and destination of the agent's last move.
    pub last_agent_move: Option<(Square, Square)>,
    /// Most recent SAN entries, oldest first.
    pub history_tail: Vec<String>,
    /// Time left on the current turn, `None` if untimed or over.
    pub remaining: Option<Duration>,
    /// Turn state at snapshot time.
    pub state: TurnState,
    /// Side to move.
    pub to_move: Color,
    /// The human's color.
    pub human: Color,
}

impl RenderRequest {
    /// Piece on a square.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[square.rank() as usize][square.file() as usize]
    }

    /// True if the square should be highlighted as a destination.
    pub fn is_destination(&self, square: Square) -> bool {
        self.destinations.contains(&square)
    }

    /// True if the square took part in the agent's last move.
    pub fn is_last_agent_move(&self, square: Square) -> bool {
        self.last_agent_move
            .is_some_and(|(from, to)| from == square || to == square)
    }

    /// Plain-text board, eighth rank first, for logs and recordings.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for rank in (0..8).rev() {
            out.push_str(&format!("{} ", rank + 1));
            for file in 0..8 {
                let c = match self.board[rank][file] {
                    Some(piece) => piece.char(),
                    None => '.',
                };
                out.push(c);
                if file < 7 {
                    out.push(' ');
                }
            }
            out.push('\n');
        }
        out.push_str("  a b c d e f g h");
        out
    }
}
