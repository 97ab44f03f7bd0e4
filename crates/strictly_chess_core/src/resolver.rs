//! Turns a decoded action into a legal move.
//!
//! The action table is static, so most decoded templates are not legal in
//! the live position. The resolver keeps the game moving by falling back to
//! a uniformly random legal move, and counts how often it had to.

use crate::action::Decoded;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use shakmaty::Move;
use tracing::{debug, instrument};

/// How a resolution was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ResolutionKind {
    /// The decoded template was legal and played as is.
    Direct,
    /// The decoded template was absent or illegal; a random legal move was used.
    Fallback,
}

/// A legal move chosen for the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The move to play.
    pub mv: Move,
    /// Whether the policy's choice was kept.
    pub kind: ResolutionKind,
}

/// Resolver misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ResolveError {
    /// Called with an empty legal set; only possible once the game is over.
    #[display("No legal moves to resolve against")]
    NoLegalMoves,
}

/// Legalizes agent actions.
#[derive(Debug)]
pub struct MoveResolver {
    rng: StdRng,
    resolved: u64,
    fallbacks: u64,
}

impl MoveResolver {
    /// Resolver with an entropy-seeded random source.
    #[instrument]
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Resolver with a fixed seed, for reproducible sessions.
    #[instrument]
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            resolved: 0,
            fallbacks: 0,
        }
    }

    /// Returns the decoded move if it is in `legal`, otherwise a random member
    /// of `legal`.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NoLegalMoves`] if `legal` is empty.
    #[instrument(skip(self, legal), fields(legal = legal.len()))]
    pub fn resolve(&mut self, decoded: Decoded, legal: &[Move]) -> Result<Resolution, ResolveError> {
        if legal.is_empty() {
            return Err(ResolveError::NoLegalMoves);
        }
        self.resolved += 1;

        if let Some(template) = decoded.template()
            && let Some(mv) = legal.iter().find(|mv| template.matches(mv))
        {
            return Ok(Resolution {
                mv: mv.clone(),
                kind: ResolutionKind::Direct,
            });
        }

        self.fallbacks += 1;
        let mv = legal
            .choose(&mut self.rng)
            .cloned()
            .ok_or(ResolveError::NoLegalMoves)?;
        debug!(
            ?decoded,
            fallbacks = self.fallbacks,
            resolved = self.resolved,
            "Agent action not legal here, using random fallback"
        );
        Ok(Resolution {
            mv,
            kind: ResolutionKind::Fallback,
        })
    }

    /// Total resolutions performed.
    pub fn resolved(&self) -> u64 {
        self.resolved
    }

    /// Resolutions that needed the fallback.
    pub fn fallbacks(&self) -> u64 {
        self.fallbacks
    }
}

impl Default for MoveResolver {
    fn default() -> Self {
        Self::new()
    }
}
