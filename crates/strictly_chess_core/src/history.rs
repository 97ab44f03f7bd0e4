//! Move log with undo/redo stacks.
//!
//! The log mirrors the plies applied to the live position. Undo pops plies
//! off the position onto the undo stack; redo replays them from there and
//! notes each replay on the redo stack. Recording a fresh move branches the
//! history: the pending undo entries and the redo stack are both dropped.

use crate::rules::RulesEngine;
use shakmaty::{Color, Move};
use tracing::{debug, instrument, warn};

/// One applied move with its display text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// The move.
    pub mv: Move,
    /// SAN text as it read when the move was played.
    pub san: String,
}

impl MoveRecord {
    /// Creates a record.
    pub fn new(mv: Move, san: impl Into<String>) -> Self {
        Self {
            mv,
            san: san.into(),
        }
    }
}

/// Chronological move log plus undo/redo bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct HistoryManager {
    log: Vec<MoveRecord>,
    undo: Vec<MoveRecord>,
    redo: Vec<MoveRecord>,
}

impl HistoryManager {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a move already applied to the live position.
    ///
    /// Clears the redo stack when it is non-empty, together with the undo
    /// entries that no longer follow from the live position.
    #[instrument(skip(self, mv), fields(len = self.log.len()))]
    pub fn record(&mut self, mv: Move, san: &str) {
        if !self.redo.is_empty() || !self.undo.is_empty() {
            debug!(
                redo = self.redo.len(),
                undo = self.undo.len(),
                "New move discards alternate future"
            );
            self.clear_redo();
            self.undo.clear();
        }
        self.log.push(MoveRecord::new(mv, san));
    }

    /// Drops the redo stack.
    pub fn clear_redo(&mut self) {
        self.redo.clear();
    }

    /// Takes back up to `n` plies from `rules`, returning how many were taken.
    #[instrument(skip(self, rules))]
    pub fn undo_plies<R: RulesEngine + ?Sized>(&mut self, rules: &mut R, n: usize) -> usize {
        let mut done = 0;
        while done < n {
            let Some(record) = self.log.pop() else { break };
            match rules.undo_last() {
                Some(mv) => {
                    if mv != record.mv {
                        warn!(san = %record.san, "Position and log disagree on last move");
                    }
                    if self.redo.last() == Some(&record) {
                        self.redo.pop();
                    }
                    self.undo.push(record);
                    done += 1;
                }
                None => {
                    warn!(san = %record.san, "Log has a move the position does not");
                    self.log.push(record);
                    break;
                }
            }
        }
        debug!(done, requested = n, "Undo");
        done
    }

    /// Replays up to `n` plies from the undo stack, returning how many were
    /// replayed.
    #[instrument(skip(self, rules))]
    pub fn redo_plies<R: RulesEngine + ?Sized>(&mut self, rules: &mut R, n: usize) -> usize {
        let mut done = 0;
        while done < n {
            let Some(record) = self.undo.pop() else { break };
            if let Err(e) = rules.apply(&record.mv) {
                warn!(error = %e, san = %record.san, "Undone move no longer applies");
                self.undo.push(record);
                break;
            }
            self.log.push(record.clone());
            self.redo.push(record);
            done += 1;
        }
        debug!(done, requested = n, "Redo");
        done
    }

    /// Forgets everything.
    pub fn clear(&mut self) {
        self.log.clear();
        self.undo.clear();
        self.redo.clear();
    }

    /// The move log, oldest first.
    pub fn log(&self) -> &[MoveRecord] {
        &self.log
    }

    /// The last `n` SAN entries, oldest first.
    pub fn tail(&self, n: usize) -> Vec<String> {
        let start = self.log.len().saturating_sub(n);
        self.log[start..].iter().map(|r| r.san.clone()).collect()
    }

    /// The most recent move played by `color`. The log starts from the
    /// standard position, so White owns the even plies.
    pub fn last_by(&self, color: Color) -> Option<&MoveRecord> {
        let parity = color.fold_wb(0, 1);
        self.log
            .iter()
            .enumerate()
            .rev()
            .find(|(ply, _)| ply % 2 == parity)
            .map(|(_, record)| record)
    }

    /// Plies waiting to be redone.
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Plies replayed since the last branch.
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}
