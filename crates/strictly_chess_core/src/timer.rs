//! Per-turn countdown.
//!
//! Time is always passed in by the caller so the controller can be driven
//! deterministically in tests.

use std::time::{Duration, Instant};

/// Per-participant turn limits. `None` means untimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeLimits {
    /// Limit on the human's turn.
    pub human: Option<Duration>,
    /// Limit on the agent's turn.
    pub agent: Option<Duration>,
}

impl Default for TimeLimits {
    fn default() -> Self {
        Self {
            human: None,
            agent: Some(Duration::from_secs(30)),
        }
    }
}

/// Deadline armed at the start of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnTimer {
    started: Instant,
    limit: Option<Duration>,
}

impl TurnTimer {
    /// Arms a timer at `now`.
    pub fn start(now: Instant, limit: Option<Duration>) -> Self {
        Self {
            started: now,
            limit,
        }
    }

    /// When the turn started.
    pub fn started(&self) -> Instant {
        self.started
    }

    /// The configured limit.
    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    /// Time left at `now`, `None` when untimed.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.limit
            .map(|limit| limit.saturating_sub(now.saturating_duration_since(self.started)))
    }

    /// True once an armed deadline has passed.
    pub fn expired(&self, now: Instant) -> bool {
        self.remaining(now).is_some_and(|left| left.is_zero())
    }
}
