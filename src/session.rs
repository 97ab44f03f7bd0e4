//! Session assembly: config in, ready controller out.

use crate::config::GameConfig;
use anyhow::{Context, Result};
use std::time::Instant;
use strictly_chess_core::{ActionCodec, MoveResolver, ShakmatyRules, TabularPolicy, TurnController};
use tracing::{info, instrument};

/// The controller every front end drives.
pub type ChessController = TurnController<ShakmatyRules, TabularPolicy>;

/// Loads the configured policy. Missing or unreadable checkpoints fall back
/// to an untrained policy.
#[instrument(skip(config), fields(difficulty = %config.difficulty()))]
pub fn load_policy(config: &GameConfig) -> TabularPolicy {
    let path = config.checkpoint_path();
    let (policy, loaded) = TabularPolicy::load_or_fresh(&path);
    info!(
        path = %path.display(),
        loaded,
        states = policy.states(),
        "Policy ready"
    );
    policy
}

/// Builds a controller for a new game.
///
/// # Errors
///
/// Fails if the action table cannot be built.
#[instrument(skip(config, now), fields(human = %config.human_color(), difficulty = %config.difficulty()))]
pub fn build_controller(config: &GameConfig, now: Instant) -> Result<ChessController> {
    let codec = ActionCodec::build().context("Failed to build action table")?;
    let resolver = match config.seed() {
        Some(seed) => MoveResolver::seeded(*seed),
        None => MoveResolver::new(),
    };
    let controller = TurnController::new(
        config.controller_config(),
        ShakmatyRules::new(),
        load_policy(config),
        codec,
        resolver,
        now,
    );
    info!(actions = controller.codec().len(), "Session ready");
    Ok(controller)
}
