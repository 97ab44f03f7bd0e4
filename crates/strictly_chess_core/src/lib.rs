//! Core of a human-versus-policy chess game.
//!
//! The pieces fit together around [`TurnController`]:
//!
//! - [`RulesEngine`] holds the live position ([`ShakmatyRules`] by default).
//! - [`encode`] turns the position into an 8×8×12 [`Observation`].
//! - A [`Policy`] maps the observation to an action index.
//! - [`ActionCodec`] decodes the index into a [`MoveTemplate`].
//! - [`MoveResolver`] turns the template into a legal move, falling back to a
//!   random legal move when the template is absent or stale.
//! - [`HistoryManager`] keeps the move log and undo/redo stacks.
//!
//! Front ends drive the controller and draw from its [`RenderRequest`].

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod action;
pub mod controller;
pub mod history;
pub mod invariants;
pub mod observation;
pub mod policy;
pub mod render;
pub mod resolver;
pub mod rules;
pub mod timer;
pub mod types;

pub use action::{ACTION_SPACE_SIZE, ActionCodec, CodecError, Decoded, MoveTemplate};
pub use controller::{
    ControllerConfig, GameEvent, HISTORY_TAIL, PLIES_PER_CONTROL, PROMOTION_MENU, TurnController,
    TurnError, TurnState,
};
pub use history::{HistoryManager, MoveRecord};
pub use invariants::{ControllerInvariants, Invariant, InvariantSet, InvariantViolation};
pub use observation::{CHANNELS, Observation, encode};
pub use policy::{Policy, PolicyError, TabularPolicy, Transition};
pub use render::RenderRequest;
pub use resolver::{MoveResolver, Resolution, ResolutionKind, ResolveError};
pub use rules::{RulesEngine, RulesError, ShakmatyRules};
pub use timer::{TimeLimits, TurnTimer};
pub use types::{EndReason, GameOutcome, GameResult, Outcome, Participant, Verdict};
