//! Status lines and end-of-game banners shared by the front ends.

use shakmaty::Color;
use strictly_chess_core::{EndReason, GameEvent, GameOutcome, Participant, TurnState, Verdict};

/// Status line for an event, if it warrants one.
pub fn describe(event: &GameEvent, human: Color) -> Option<String> {
    match event {
        GameEvent::MoveMade {
            by: Participant::Human,
            san,
            ..
        } => Some(format!("You played {}", san)),
        GameEvent::MoveMade {
            by: Participant::Agent,
            san,
            ..
        } => Some(format!("Agent played {}", san)),
        GameEvent::FallbackUsed { .. } => None,
        GameEvent::Undone(0) => Some("Nothing to undo".to_string()),
        GameEvent::Undone(n) => Some(format!("Took back {} {}", n, plural(*n))),
        GameEvent::Redone(0) => Some("Nothing to redo".to_string()),
        GameEvent::Redone(n) => Some(format!("Replayed {} {}", n, plural(*n))),
        GameEvent::Restarted => Some(format!("New game. You play {}", color_name(human))),
        GameEvent::GameOver(outcome) => Some(banner(outcome, human)),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "move" } else { "moves" }
}

/// Lowercase color name.
pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

/// End-of-game banner, e.g. "White is winner! You won (checkmate)".
pub fn banner(outcome: &GameOutcome, human: Color) -> String {
    let verdict = match outcome.verdict_for(human) {
        Verdict::Win => " You won",
        Verdict::Loss => " You lost",
        Verdict::Draw => "",
    };
    let reason = match outcome.reason {
        EndReason::Checkmate => "checkmate",
        EndReason::Stalemate => "stalemate",
        EndReason::InsufficientMaterial => "insufficient material",
        EndReason::DrawByRule => "draw by rule",
        EndReason::Timeout(Participant::Human) => "you ran out of time",
        EndReason::Timeout(Participant::Agent) => "agent ran out of time",
    };
    format!("{}{} ({})", outcome.outcome, verdict, reason)
}

/// One-line turn indicator.
pub fn turn_line(state: &TurnState, to_move: Color) -> String {
    match state {
        TurnState::HumanToMove => format!("Your move ({})", color_name(to_move)),
        TurnState::AgentToMove => format!("Agent thinking ({})", color_name(to_move)),
        TurnState::GameOver(_) => "Game over".to_string(),
    }
}
