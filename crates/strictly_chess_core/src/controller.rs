//! Turn controller: the state machine that owns the live game.
//!
//! A single owner drives everything through four entry points: human move
//! submission, [`TurnController::tick`] for the agent and the clocks, and the
//! restart/undo/redo controls. Each returns the [`GameEvent`]s it caused so
//! front ends can update status lines and cues without inspecting internals.
//!
//! Time is an argument, never read from the system clock here.

use crate::action::{ActionCodec, MoveTemplate};
use crate::history::HistoryManager;
use crate::invariants::assert_invariants;
use crate::observation::{Observation, encode};
use crate::policy::{Policy, Transition};
use crate::render::RenderRequest;
use crate::resolver::{MoveResolver, ResolutionKind};
use crate::rules::{RulesEngine, RulesError};
use crate::timer::{TimeLimits, TurnTimer};
use crate::types::{EndReason, GameOutcome, GameResult, Participant};
use derive_more::{Display, Error};
use shakmaty::{Color, Move, Role, Square};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Plies taken back or replayed per undo/redo, one for each side.
pub const PLIES_PER_CONTROL: usize = 2;

/// Number of SAN entries in a render request's history tail.
pub const HISTORY_TAIL: usize = 10;

/// Promotion choices offered to the human, in menu order.
pub const PROMOTION_MENU: [Role; 4] = [Role::Queen, Role::Rook, Role::Bishop, Role::Knight];

// ─────────────────────────────────────────────────────────────
//  State and events
// ─────────────────────────────────────────────────────────────

/// Whose move it is. Exactly one holds at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Waiting for the human.
    HumanToMove,
    /// The agent moves on the next tick.
    AgentToMove,
    /// Finished; only restart leaves this state.
    GameOver(GameOutcome),
}

impl TurnState {
    /// True once the game has ended.
    pub fn is_over(&self) -> bool {
        matches!(self, TurnState::GameOver(_))
    }

    /// Who is to move, if anyone.
    pub fn participant(&self) -> Option<Participant> {
        match self {
            TurnState::HumanToMove => Some(Participant::Human),
            TurnState::AgentToMove => Some(Participant::Agent),
            TurnState::GameOver(_) => None,
        }
    }

    /// The outcome of a finished game.
    pub fn outcome(&self) -> Option<&GameOutcome> {
        match self {
            TurnState::GameOver(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Something that happened during a controller call.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A move was played.
    MoveMade {
        /// Who played it.
        by: Participant,
        /// Color that moved.
        color: Color,
        /// SAN text.
        san: String,
        /// True if the move captured.
        capture: bool,
    },
    /// The agent's action had to be replaced by a random legal move.
    FallbackUsed {
        /// The action index the policy produced.
        action: usize,
    },
    /// Plies were taken back.
    Undone(usize),
    /// Plies were replayed.
    Redone(usize),
    /// The game was reset to the start.
    Restarted,
    /// The game ended.
    GameOver(GameOutcome),
}

/// Rejected controller input. None of these change state.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum TurnError {
    /// Human input arrived while the agent is to move.
    #[display("It is not the human's turn")]
    NotHumanTurn,

    /// Move input arrived after the game ended.
    #[display("The game is over")]
    GameOver,

    /// The rules engine rejected the move.
    #[display("{}", _0)]
    Rules(RulesError),
}

impl From<RulesError> for TurnError {
    fn from(e: RulesError) -> Self {
        TurnError::Rules(e)
    }
}

// ─────────────────────────────────────────────────────────────
//  Configuration
// ─────────────────────────────────────────────────────────────

/// Session-level controller settings.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct ControllerConfig {
    /// Color the human plays.
    human_color: Color,
    /// Turn limits.
    limits: TimeLimits,
    /// Checkpoint to save after each online update; `None` disables learning.
    continual_learning: Option<PathBuf>,
}

impl ControllerConfig {
    /// Human plays `human_color`, default limits, no learning.
    pub fn new(human_color: Color) -> Self {
        Self {
            human_color,
            limits: TimeLimits::default(),
            continual_learning: None,
        }
    }

    /// Replaces the time limits.
    pub fn with_limits(mut self, limits: TimeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Enables one training step and a checkpoint save after every agent move.
    pub fn with_continual_learning(mut self, checkpoint: impl Into<PathBuf>) -> Self {
        self.continual_learning = Some(checkpoint.into());
        self
    }
}

// ─────────────────────────────────────────────────────────────
//  Controller
// ─────────────────────────────────────────────────────────────

/// Owns the live position and arbitrates between human and agent.
#[derive(Debug)]
pub struct TurnController<R, P> {
    rules: R,
    policy: P,
    codec: ActionCodec,
    resolver: MoveResolver,
    history: HistoryManager,
    config: ControllerConfig,
    state: TurnState,
    timer: TurnTimer,
    /// Agent's last (observation, action), awaiting the terminal reward.
    pending_update: Option<(Observation, usize)>,
}

impl<R: RulesEngine, P: Policy> TurnController<R, P> {
    /// Creates a controller over `rules`, reset to the starting position.
    #[instrument(skip(rules, policy, codec, resolver, now), fields(human = ?config.human_color()))]
    pub fn new(
        config: ControllerConfig,
        mut rules: R,
        policy: P,
        codec: ActionCodec,
        resolver: MoveResolver,
        now: Instant,
    ) -> Self {
        rules.reset();
        let mut controller = Self {
            rules,
            policy,
            codec,
            resolver,
            history: HistoryManager::new(),
            config,
            state: TurnState::HumanToMove,
            timer: TurnTimer::start(now, None),
            pending_update: None,
        };
        controller.enter_current_state(now);
        info!(state = ?controller.state, "Controller ready");
        controller
    }

    // ── accessors ────────────────────────────────────────────

    /// Current turn state.
    pub fn state(&self) -> &TurnState {
        &self.state
    }

    /// The human's color.
    pub fn human_color(&self) -> Color {
        *self.config.human_color()
    }

    /// The agent's color.
    pub fn agent_color(&self) -> Color {
        self.human_color().other()
    }

    /// The rules engine holding the live position.
    pub fn rules(&self) -> &R {
        &self.rules
    }

    /// The move history.
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// The action table.
    pub fn codec(&self) -> &ActionCodec {
        &self.codec
    }

    /// The move resolver and its fallback counters.
    pub fn resolver(&self) -> &MoveResolver {
        &self.resolver
    }

    /// The agent's policy.
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Controller settings.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Time left on the current turn.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        if self.state.is_over() {
            None
        } else {
            self.timer.remaining(now)
        }
    }

    // ── human input ──────────────────────────────────────────

    /// Legal destinations for the human piece on `from`.
    pub fn destinations(&self, from: Square) -> Vec<Square> {
        if self.state != TurnState::HumanToMove {
            return Vec::new();
        }
        let mut out: Vec<Square> = self
            .rules
            .legal_moves()
            .iter()
            .filter_map(MoveTemplate::of)
            .filter(|t| t.from == from)
            .map(|t| t.to)
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// True if moving `from` → `to` requires a promotion choice.
    pub fn needs_promotion(&self, from: Square, to: Square) -> bool {
        self.rules
            .legal_moves()
            .iter()
            .filter_map(MoveTemplate::of)
            .any(|t| t.from == from && t.to == to && t.promotion.is_some())
    }

    /// Plays a human move given as a template.
    ///
    /// # Errors
    ///
    /// [`TurnError`] if it is not the human's turn or the move is illegal.
    /// State is unchanged on error.
    #[instrument(skip(self, now), fields(mv = %template))]
    pub fn submit_move(
        &mut self,
        template: MoveTemplate,
        now: Instant,
    ) -> Result<Vec<GameEvent>, TurnError> {
        self.ensure_human_turn()?;
        let mv = self
            .rules
            .legal_moves()
            .into_iter()
            .find(|mv| template.matches(mv))
            .ok_or_else(|| TurnError::Rules(RulesError::IllegalMove(template.uci())))?;
        self.play_human(mv, now)
    }

    /// Plays a human move given as UCI or SAN text.
    ///
    /// # Errors
    ///
    /// [`TurnError`] if it is not the human's turn or the text does not name a
    /// legal move. State is unchanged on error.
    #[instrument(skip(self, now))]
    pub fn submit_text(&mut self, text: &str, now: Instant) -> Result<Vec<GameEvent>, TurnError> {
        self.ensure_human_turn()?;
        let mv = self.rules.parse_move(text)?;
        self.play_human(mv, now)
    }

    fn ensure_human_turn(&self) -> Result<(), TurnError> {
        match self.state {
            TurnState::HumanToMove => Ok(()),
            TurnState::AgentToMove => Err(TurnError::NotHumanTurn),
            TurnState::GameOver(_) => Err(TurnError::GameOver),
        }
    }

    fn play_human(&mut self, mv: Move, now: Instant) -> Result<Vec<GameEvent>, TurnError> {
        let mut events = vec![self.play(mv, Participant::Human)?];
        events.extend(self.enter_current_state(now));
        assert_invariants(self);
        Ok(events)
    }

    // ── scheduling ───────────────────────────────────────────

    /// Advances the game by one scheduling tick.
    ///
    /// On the agent's turn this either forfeits on an expired deadline or
    /// plays the agent's move. On the human's turn it only enforces a
    /// configured human deadline.
    #[instrument(skip(self, now), fields(state = ?self.state))]
    pub fn tick(&mut self, now: Instant) -> Vec<GameEvent> {
        let events = match self.state {
            TurnState::GameOver(_) => Vec::new(),
            TurnState::HumanToMove => {
                if self.timer.expired(now) {
                    self.forfeit(Participant::Human)
                } else {
                    Vec::new()
                }
            }
            TurnState::AgentToMove => {
                if self.timer.expired(now) {
                    self.forfeit(Participant::Agent)
                } else {
                    self.agent_move(now)
                }
            }
        };
        assert_invariants(self);
        events
    }

    fn agent_move(&mut self, now: Instant) -> Vec<GameEvent> {
        let observation = encode(&self.rules);
        let action = self.policy.predict(&observation);
        let decoded = self.codec.decode(action);
        let legal = self.rules.legal_moves();

        let resolution = match self.resolver.resolve(decoded, &legal) {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!(error = %e, "Agent to move without legal moves");
                return self.enter_current_state(now);
            }
        };

        let mut events = Vec::new();
        if resolution.kind == ResolutionKind::Fallback {
            events.push(GameEvent::FallbackUsed { action });
        }
        match self.play(resolution.mv, Participant::Agent) {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!(error = %e, "Resolved agent move rejected by rules engine");
                return events;
            }
        }
        if self.config.continual_learning().is_some() {
            self.pending_update = Some((observation.clone(), action));
        }
        events.extend(self.enter_current_state(now));

        // A move that ends the game is trained by `finish`.
        if !self.state.is_over() {
            self.learn(observation, action, 0.0, false);
        }
        events
    }

    /// One online update and checkpoint save; no-op unless learning is on.
    fn learn(&mut self, observation: Observation, action: usize, reward: f32, done: bool) {
        let Some(checkpoint) = self.config.continual_learning().clone() else {
            return;
        };
        debug!(action, reward, done, "Online policy update");
        let transition = Transition {
            observation,
            action,
            reward,
            done,
        };
        if let Err(e) = self.policy.train_step(&transition) {
            warn!(error = %e, "Online policy update failed");
            return;
        }
        if let Err(e) = self.policy.save(&checkpoint) {
            warn!(error = %e, "Saving policy checkpoint failed");
        }
    }

    // ── controls ─────────────────────────────────────────────

    /// Resets to the starting position from any state.
    #[instrument(skip(self, now))]
    pub fn restart(&mut self, now: Instant) -> Vec<GameEvent> {
        self.rules.reset();
        self.history.clear();
        self.pending_update = None;
        let mut events = vec![GameEvent::Restarted];
        events.extend(self.enter_current_state(now));
        info!(state = ?self.state, "Game restarted");
        assert_invariants(self);
        events
    }

    /// Takes back up to two plies. Ignored once the game is over.
    #[instrument(skip(self, now))]
    pub fn undo(&mut self, now: Instant) -> Vec<GameEvent> {
        if self.state.is_over() {
            debug!("Undo ignored after game over");
            return Vec::new();
        }
        let done = self
            .history
            .undo_plies(&mut self.rules, PLIES_PER_CONTROL);
        self.pending_update = None;
        let mut events = vec![GameEvent::Undone(done)];
        events.extend(self.enter_current_state(now));
        assert_invariants(self);
        events
    }

    /// Replays up to two undone plies. Ignored once the game is over.
    #[instrument(skip(self, now))]
    pub fn redo(&mut self, now: Instant) -> Vec<GameEvent> {
        if self.state.is_over() {
            debug!("Redo ignored after game over");
            return Vec::new();
        }
        let done = self
            .history
            .redo_plies(&mut self.rules, PLIES_PER_CONTROL);
        self.pending_update = None;
        let mut events = vec![GameEvent::Redone(done)];
        events.extend(self.enter_current_state(now));
        assert_invariants(self);
        events
    }

    // ── presentation ─────────────────────────────────────────

    /// Snapshot for drawing one frame.
    pub fn render_request(&self, selected: Option<Square>, now: Instant) -> RenderRequest {
        let mut board = [[None; 8]; 8];
        for square in Square::ALL {
            board[square.rank() as usize][square.file() as usize] = self.rules.piece_at(square);
        }
        let destinations = selected.map(|s| self.destinations(s)).unwrap_or_default();
        let last_agent_move = self
            .history
            .last_by(self.agent_color())
            .and_then(|record| MoveTemplate::of(&record.mv))
            .map(|t| (t.from, t.to));
        RenderRequest {
            board,
            selected,
            destinations,
            last_agent_move,
            history_tail: self.history.tail(HISTORY_TAIL),
            remaining: self.remaining(now),
            state: self.state,
            to_move: self.rules.turn(),
            human: self.human_color(),
        }
    }

    // ── internals ────────────────────────────────────────────

    fn play(&mut self, mv: Move, by: Participant) -> Result<GameEvent, TurnError> {
        let san = self.rules.to_algebraic(&mv);
        let capture = mv.is_capture();
        let color = self.rules.turn();
        self.rules.apply(&mv)?;
        self.history.record(mv, &san);
        debug!(%by, %san, capture, "Move played");
        Ok(GameEvent::MoveMade {
            by,
            color,
            san,
            capture,
        })
    }

    /// Derives the state from the live position and rearms the timer.
    fn enter_current_state(&mut self, now: Instant) -> Vec<GameEvent> {
        if self.rules.is_game_over() {
            let result = self.rules.result().unwrap_or(GameResult::Draw);
            let reason = self.rules.end_reason().unwrap_or(EndReason::DrawByRule);
            return self.finish(GameOutcome::from_result(result, reason));
        }

        let (state, limit) = if self.rules.turn() == self.human_color() {
            (TurnState::HumanToMove, self.config.limits().human)
        } else {
            (TurnState::AgentToMove, self.config.limits().agent)
        };
        self.state = state;
        self.timer = TurnTimer::start(now, limit);
        Vec::new()
    }

    fn forfeit(&mut self, loser: Participant) -> Vec<GameEvent> {
        let color = match loser {
            Participant::Human => self.human_color(),
            Participant::Agent => self.agent_color(),
        };
        info!(%loser, "Turn time expired");
        self.finish(GameOutcome::forfeit(loser, color))
    }

    /// Single exit into `GameOver` for both rules endings and timeouts.
    fn finish(&mut self, outcome: GameOutcome) -> Vec<GameEvent> {
        info!(
            result = %outcome.outcome.result(),
            reason = %outcome.reason,
            verdict = %outcome.verdict_for(self.human_color()),
            "Game over"
        );
        self.state = TurnState::GameOver(outcome);

        if let Some((observation, action)) = self.pending_update.take() {
            let sign = if self.agent_color() == Color::White { 1.0 } else { -1.0 };
            let reward = outcome.outcome.result().reward() * sign;
            self.learn(observation, action, reward, true);
        }
        vec![GameEvent::GameOver(outcome)]
    }
}
