//! Outcome and participant types shared by the turn controller and front ends.

use serde::{Deserialize, Serialize};
use shakmaty::Color;

/// Who is responsible for a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Participant {
    /// The human at the keyboard.
    Human,
    /// The policy-driven agent.
    Agent,
}

/// Result signal reported by the rules engine for a finished position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameResult {
    /// 1-0
    WhiteWins,
    /// 0-1
    BlackWins,
    /// 1/2-1/2
    Draw,
}

impl GameResult {
    /// PGN-style result string.
    pub fn as_str(self) -> &'static str {
        match self {
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "1/2-1/2",
        }
    }

    /// Result in which `color` wins.
    pub fn win_for(color: Color) -> Self {
        match color {
            Color::White => GameResult::WhiteWins,
            Color::Black => GameResult::BlackWins,
        }
    }

    /// Terminal reward from White's point of view.
    pub fn reward(self) -> f32 {
        match self {
            GameResult::WhiteWins => 1.0,
            GameResult::BlackWins => -1.0,
            GameResult::Draw => 0.0,
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// A side won the game.
    Winner(#[serde(with = "color_serde")] Color),
    /// Game ended in a draw.
    Draw,
}

impl Outcome {
    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<Color> {
        match self {
            Outcome::Winner(color) => Some(*color),
            Outcome::Draw => None,
        }
    }

    /// Returns true if the game was a draw.
    pub fn is_draw(&self) -> bool {
        matches!(self, Outcome::Draw)
    }

    /// The equivalent result signal.
    pub fn result(&self) -> GameResult {
        match self {
            Outcome::Winner(color) => GameResult::win_for(*color),
            Outcome::Draw => GameResult::Draw,
        }
    }
}

impl From<GameResult> for Outcome {
    fn from(result: GameResult) -> Self {
        match result {
            GameResult::WhiteWins => Outcome::Winner(Color::White),
            GameResult::BlackWins => Outcome::Winner(Color::Black),
            GameResult::Draw => Outcome::Draw,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Winner(Color::White) => write!(f, "White is winner!"),
            Outcome::Winner(Color::Black) => write!(f, "Black is winner!"),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum EndReason {
    /// The side to move is mated.
    Checkmate,
    /// The side to move has no legal move and is not in check.
    Stalemate,
    /// Neither side can mate.
    InsufficientMaterial,
    /// Drawn for another rules reason.
    #[strum(to_string = "Draw by rule")]
    DrawByRule,
    /// A participant ran out of time on their turn.
    Timeout(Participant),
}

/// A classified game ending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    /// Who won, or draw.
    pub outcome: Outcome,
    /// How it ended.
    pub reason: EndReason,
}

impl GameOutcome {
    /// Classifies a rules-engine result signal.
    pub fn from_result(result: GameResult, reason: EndReason) -> Self {
        Self {
            outcome: result.into(),
            reason,
        }
    }

    /// Loss on time for the side of the participant who forfeits.
    pub fn forfeit(loser: Participant, loser_color: Color) -> Self {
        Self {
            outcome: Outcome::Winner(loser_color.other()),
            reason: EndReason::Timeout(loser),
        }
    }

    /// Verdict from the human's perspective.
    pub fn verdict_for(&self, human: Color) -> Verdict {
        match self.outcome {
            Outcome::Draw => Verdict::Draw,
            Outcome::Winner(color) if color == human => Verdict::Win,
            Outcome::Winner(_) => Verdict::Loss,
        }
    }
}

/// Human-relative reading of an outcome, used to pick a cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Verdict {
    /// The human won.
    Win,
    /// The human lost.
    Loss,
    /// Nobody won.
    Draw,
}

mod color_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use shakmaty::Color;

    pub fn serialize<S: Serializer>(color: &Color, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(color.fold_wb("white", "black"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "white" => Ok(Color::White),
            "black" => Ok(Color::Black),
            other => Err(serde::de::Error::custom(format!("unknown color: {other}"))),
        }
    }
}
