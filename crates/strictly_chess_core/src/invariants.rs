//! Controller invariants.
//!
//! Each invariant is a logical property of a [`TurnController`] that must
//! hold between calls. They are checked after every state change in debug
//! builds and can be tested on their own.

use crate::controller::{TurnController, TurnState};
use crate::observation::encode;
use crate::policy::Policy;
use crate::rules::RulesEngine;
use shakmaty::Square;
use tracing::{instrument, warn};

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// Invariants checked together. Implemented for tuples.
pub trait InvariantSet<S> {
    /// Checks every invariant, collecting all violations.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let violations: Vec<_> = [
            (I1::holds(state), I1::description()),
            (I2::holds(state), I2::description()),
            (I3::holds(state), I3::description()),
        ]
        .into_iter()
        .filter(|(held, _)| !held)
        .map(|(_, description)| InvariantViolation::new(description))
        .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Controller invariants
// ─────────────────────────────────────────────────────────────

/// The move log has exactly one entry per ply applied to the position.
pub struct HistoryMatchesPosition;

impl<R: RulesEngine, P: Policy> Invariant<TurnController<R, P>> for HistoryMatchesPosition {
    fn holds(controller: &TurnController<R, P>) -> bool {
        controller.history().log().len() == controller.rules().ply_count()
    }

    fn description() -> &'static str {
        "Move log length equals plies applied to the position"
    }
}

/// A to-move state names the participant who owns the side to move, and
/// never appears once the position is finished.
pub struct StateMatchesSideToMove;

impl<R: RulesEngine, P: Policy> Invariant<TurnController<R, P>> for StateMatchesSideToMove {
    fn holds(controller: &TurnController<R, P>) -> bool {
        let rules = controller.rules();
        match controller.state() {
            TurnState::GameOver(_) => true,
            TurnState::HumanToMove => {
                !rules.is_game_over() && rules.turn() == controller.human_color()
            }
            TurnState::AgentToMove => {
                !rules.is_game_over() && rules.turn() == controller.agent_color()
            }
        }
    }

    fn description() -> &'static str {
        "Turn state agrees with the side to move"
    }
}

/// Occupied squares set exactly one observation channel, empty squares none.
pub struct ObservationOneHot;

impl<R: RulesEngine, P: Policy> Invariant<TurnController<R, P>> for ObservationOneHot {
    fn holds(controller: &TurnController<R, P>) -> bool {
        let obs = encode(controller.rules());
        Square::ALL.into_iter().all(|square| {
            let set = obs.square(square).iter().filter(|v| **v != 0.0).count();
            let occupied = controller.rules().piece_at(square).is_some();
            set == usize::from(occupied)
        })
    }

    fn description() -> &'static str {
        "Each occupied square sets exactly one observation channel"
    }
}

/// All controller invariants as a composable set.
pub type ControllerInvariants = (
    HistoryMatchesPosition,
    StateMatchesSideToMove,
    ObservationOneHot,
);

/// Panics in debug builds if any controller invariant is violated.
#[instrument(skip(controller))]
pub fn assert_invariants<R: RulesEngine, P: Policy>(controller: &TurnController<R, P>) {
    if cfg!(debug_assertions)
        && let Err(violations) = ControllerInvariants::check_all(controller)
    {
        for violation in &violations {
            warn!(invariant = %violation.description, "Invariant violated");
        }
        debug_assert!(false, "Controller invariants violated: {:?}", violations);
    }
}
