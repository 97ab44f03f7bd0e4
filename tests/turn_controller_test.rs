//! Tests for the turn controller state machine.

use shakmaty::{Color, Position};
use std::cell::Cell;
use std::time::{Duration, Instant};
use strictly_chess_core::{
    ActionCodec, ControllerConfig, ControllerInvariants, EndReason, GameEvent, InvariantSet,
    MoveResolver, MoveTemplate, Observation, Outcome, Participant, Policy, RulesEngine,
    ShakmatyRules, TabularPolicy, TimeLimits, TurnController, TurnError, TurnState, Verdict,
};

/// Plays a fixed list of action indices, then repeats the last one.
struct ScriptedPolicy {
    script: Vec<usize>,
    next: Cell<usize>,
}

impl ScriptedPolicy {
    fn new(script: Vec<usize>) -> Self {
        Self {
            script,
            next: Cell::new(0),
        }
    }
}

impl Policy for ScriptedPolicy {
    fn predict(&self, _observation: &Observation) -> usize {
        let i = self.next.get().min(self.script.len() - 1);
        self.next.set(self.next.get() + 1);
        self.script[i]
    }
}

fn index_of(codec: &ActionCodec, uci: &str) -> usize {
    let template = MoveTemplate::parse_uci(uci).expect("Valid UCI");
    codec.encode(&template).expect("Template in table")
}

fn tabular(human: Color, now: Instant) -> TurnController<ShakmatyRules, TabularPolicy> {
    TurnController::new(
        ControllerConfig::new(human),
        ShakmatyRules::new(),
        TabularPolicy::fresh(),
        ActionCodec::build().expect("Codec builds"),
        MoveResolver::seeded(1),
        now,
    )
}

fn scripted(
    human: Color,
    script: Vec<usize>,
    now: Instant,
) -> TurnController<ShakmatyRules, ScriptedPolicy> {
    TurnController::new(
        ControllerConfig::new(human),
        ShakmatyRules::new(),
        ScriptedPolicy::new(script),
        ActionCodec::build().expect("Codec builds"),
        MoveResolver::seeded(1),
        now,
    )
}

/// Plays `n` full turns with the first legal human move each time.
fn play_turns<P: Policy>(c: &mut TurnController<ShakmatyRules, P>, n: usize, now: Instant) {
    for _ in 0..n {
        if c.state() == &TurnState::AgentToMove {
            c.tick(now);
        }
        if c.state() != &TurnState::HumanToMove {
            return;
        }
        let mv = c.rules().legal_moves()[0].clone();
        let san = c.rules().to_algebraic(&mv);
        c.submit_text(&san, now).expect("Legal move");
        c.tick(now);
    }
}

#[test]
fn test_agent_timeout_is_a_forfeit() {
    let t0 = Instant::now();
    let mut c = tabular(Color::Black, t0);
    assert_eq!(c.state(), &TurnState::AgentToMove);

    let events = c.tick(t0 + Duration::from_secs(30));
    let TurnState::GameOver(outcome) = *c.state() else {
        panic!("Expected game over, got {:?}", c.state());
    };
    assert_eq!(events, vec![GameEvent::GameOver(outcome)]);
    assert_eq!(outcome.outcome, Outcome::Winner(Color::Black));
    assert_eq!(outcome.reason, EndReason::Timeout(Participant::Agent));
    assert_eq!(outcome.verdict_for(Color::Black), Verdict::Win);
    assert_eq!(c.rules().ply_count(), 0);
}

#[test]
fn test_agent_moves_within_limit() {
    let t0 = Instant::now();
    let mut c = tabular(Color::Black, t0);
    c.tick(t0 + Duration::from_secs(29));
    assert_eq!(c.state(), &TurnState::HumanToMove);
    assert_eq!(c.rules().ply_count(), 1);
}

#[test]
fn test_human_time_limit_forfeits_human() {
    let t0 = Instant::now();
    let limits = TimeLimits {
        human: Some(Duration::from_secs(10)),
        agent: None,
    };
    let mut c = TurnController::new(
        ControllerConfig::new(Color::White).with_limits(limits),
        ShakmatyRules::new(),
        TabularPolicy::fresh(),
        ActionCodec::build().expect("Codec builds"),
        MoveResolver::seeded(1),
        t0,
    );
    assert!(c.tick(t0 + Duration::from_secs(9)).is_empty());
    c.tick(t0 + Duration::from_secs(10));
    let outcome = c.state().outcome().copied().expect("Game over");
    assert_eq!(outcome.reason, EndReason::Timeout(Participant::Human));
    assert_eq!(outcome.verdict_for(Color::White), Verdict::Loss);
}

#[test]
fn test_restart_for_both_colors() {
    let t0 = Instant::now();
    for (human, expected) in [
        (Color::White, TurnState::HumanToMove),
        (Color::Black, TurnState::AgentToMove),
    ] {
        let mut c = tabular(human, t0);
        play_turns(&mut c, 3, t0);
        assert!(c.rules().ply_count() > 0);

        let events = c.restart(t0);
        assert_eq!(events, vec![GameEvent::Restarted]);
        assert_eq!(c.state(), &expected);
        assert!(c.history().log().is_empty());
        assert_eq!(c.history().undo_len(), 0);
        assert_eq!(c.history().redo_len(), 0);
        assert_eq!(c.rules().legal_moves().len(), 20);
    }
}

#[test]
fn test_restart_leaves_game_over() {
    let t0 = Instant::now();
    let mut c = tabular(Color::Black, t0);
    c.tick(t0 + Duration::from_secs(60));
    assert!(c.state().is_over());
    c.restart(t0);
    assert_eq!(c.state(), &TurnState::AgentToMove);
}

#[test]
fn test_undo_on_fresh_game_is_a_no_op() {
    let t0 = Instant::now();
    let mut c = tabular(Color::White, t0);
    assert_eq!(c.undo(t0), vec![GameEvent::Undone(0)]);
    assert_eq!(c.state(), &TurnState::HumanToMove);
    assert_eq!(c.rules().legal_moves().len(), 20);
    assert_eq!(c.redo(t0), vec![GameEvent::Redone(0)]);
}

#[test]
fn test_undo_redo_round_trip() {
    let t0 = Instant::now();
    let mut c = tabular(Color::White, t0);
    play_turns(&mut c, 3, t0);
    let log: Vec<String> = c.history().log().iter().map(|r| r.san.clone()).collect();
    let board = c.rules().position().board().clone();
    assert_eq!(log.len(), 6);

    c.undo(t0);
    c.undo(t0);
    assert_eq!(c.history().log().len(), 2);
    assert_eq!(c.state(), &TurnState::HumanToMove);

    c.redo(t0);
    c.redo(t0);
    let replayed: Vec<String> = c.history().log().iter().map(|r| r.san.clone()).collect();
    assert_eq!(replayed, log);
    assert_eq!(c.rules().position().board(), &board);
    assert!(ControllerInvariants::check_all(&c).is_ok());
}

#[test]
fn test_new_move_after_undo_discards_redo() {
    let t0 = Instant::now();
    let mut c = tabular(Color::White, t0);
    play_turns(&mut c, 2, t0);
    c.undo(t0);
    let mv = c.rules().legal_moves()[0].clone();
    let template = MoveTemplate::of(&mv).expect("Board move");
    c.submit_move(template, t0).expect("Legal move");
    assert_eq!(c.history().redo_len(), 0);
    assert_eq!(c.history().undo_len(), 0);
    c.tick(t0);
    assert_eq!(c.redo(t0), vec![GameEvent::Redone(0)]);
}

#[test]
fn test_human_move_rejected_while_agent_to_move() {
    let t0 = Instant::now();
    let mut c = tabular(Color::Black, t0);
    let template = MoveTemplate::parse_uci("e2e4").expect("Valid UCI");
    assert_eq!(c.submit_move(template, t0), Err(TurnError::NotHumanTurn));
    assert_eq!(c.submit_text("e4", t0), Err(TurnError::NotHumanTurn));
    assert_eq!(c.rules().ply_count(), 0);
    assert_eq!(c.state(), &TurnState::AgentToMove);
}

#[test]
fn test_sentinel_action_falls_back() {
    let t0 = Instant::now();
    let mut c = scripted(Color::Black, vec![999_999], t0);
    let events = c.tick(t0);
    assert_eq!(events[0], GameEvent::FallbackUsed { action: 999_999 });
    assert!(matches!(
        events[1],
        GameEvent::MoveMade {
            by: Participant::Agent,
            color: Color::White,
            ..
        }
    ));
    assert_eq!(c.resolver().fallbacks(), 1);
}

#[test]
fn test_stale_table_entry_falls_back() {
    let t0 = Instant::now();
    let codec = ActionCodec::build().expect("Codec builds");
    // e2e4 is never legal for black.
    let mut c = scripted(Color::White, vec![index_of(&codec, "e2e4")], t0);
    c.submit_text("d4", t0).expect("Legal move");
    let events = c.tick(t0);
    assert!(events.contains(&GameEvent::FallbackUsed {
        action: index_of(&codec, "e2e4")
    }));
    assert_eq!(c.rules().ply_count(), 2);
    assert_eq!(c.rules().turn(), Color::White);
}

#[test]
fn test_direct_action_is_played() {
    let t0 = Instant::now();
    let codec = ActionCodec::build().expect("Codec builds");
    let mut c = scripted(Color::Black, vec![index_of(&codec, "g1f3")], t0);
    let events = c.tick(t0);
    assert_eq!(
        events,
        vec![GameEvent::MoveMade {
            by: Participant::Agent,
            color: Color::White,
            san: "Nf3".to_string(),
            capture: false,
        }]
    );
    assert_eq!(c.resolver().fallbacks(), 0);
}

#[test]
fn test_checkmate_ends_game_for_human() {
    let t0 = Instant::now();
    let codec = ActionCodec::build().expect("Codec builds");
    let script = vec![index_of(&codec, "f2f3"), index_of(&codec, "g2g4")];
    let mut c = scripted(Color::Black, script, t0);

    c.tick(t0);
    c.submit_text("e5", t0).expect("Legal move");
    c.tick(t0);
    let events = c.submit_text("Qh4", t0).expect("Legal move");

    let TurnState::GameOver(outcome) = *c.state() else {
        panic!("Expected checkmate, got {:?}", c.state());
    };
    assert!(events.contains(&GameEvent::GameOver(outcome)));
    assert_eq!(outcome.reason, EndReason::Checkmate);
    assert_eq!(outcome.outcome, Outcome::Winner(Color::Black));
    assert_eq!(outcome.verdict_for(c.human_color()), Verdict::Win);

    assert!(c.tick(t0).is_empty());
    assert!(c.undo(t0).is_empty());
    assert_eq!(c.submit_text("a6", t0), Err(TurnError::GameOver));
}

#[test]
fn test_fivefold_repetition_ends_game_as_draw() {
    let t0 = Instant::now();
    let codec = ActionCodec::build().expect("Codec builds");
    let script = [index_of(&codec, "g8f6"), index_of(&codec, "f6g8")].repeat(4);
    let mut c = scripted(Color::White, script, t0);

    for _ in 0..3 {
        c.submit_text("Nf3", t0).expect("Legal move");
        c.tick(t0);
        c.submit_text("Ng1", t0).expect("Legal move");
        c.tick(t0);
    }
    assert_eq!(c.state(), &TurnState::HumanToMove);
    c.submit_text("Nf3", t0).expect("Legal move");
    c.tick(t0);
    c.submit_text("Ng1", t0).expect("Legal move");
    let last = c.tick(t0);

    let TurnState::GameOver(outcome) = *c.state() else {
        panic!("Expected a draw, got {:?}", c.state());
    };
    assert!(last.contains(&GameEvent::GameOver(outcome)));
    assert_eq!(outcome.outcome, Outcome::Draw);
    assert_eq!(outcome.reason, EndReason::DrawByRule);
    assert_eq!(outcome.verdict_for(c.human_color()), Verdict::Draw);
    assert_eq!(c.rules().ply_count(), 16);
}
