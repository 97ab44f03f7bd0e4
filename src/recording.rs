//! Bounded recording of drawn frames, flushed as JSON Lines.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use strictly_chess_core::RenderRequest;
use tracing::{debug, info, instrument};

/// One recorded frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, new)]
pub struct RecordedFrame {
    /// When the frame was drawn.
    timestamp: DateTime<Utc>,
    /// Plies on the board.
    ply: usize,
    /// Side to move.
    to_move: String,
    /// Text board, eighth rank first.
    board: String,
    /// Status line shown with the frame.
    status: String,
}

impl RecordedFrame {
    /// Captures a render request with the status line drawn next to it.
    pub fn capture(request: &RenderRequest, ply: usize, status: &str) -> Self {
        Self::new(
            Utc::now(),
            ply,
            format!("{:?}", request.to_move).to_lowercase(),
            request.to_text(),
            status.to_string(),
        )
    }

    fn same_picture(&self, other: &Self) -> bool {
        self.board == other.board && self.status == other.status && self.ply == other.ply
    }
}

/// Recorder failure with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Recorder error: {} at {}:{}", message, file, line)]
pub struct RecorderError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl RecorderError {
    /// Creates a new recorder error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Keeps at most `capacity` frames, dropping the oldest.
#[derive(Debug, Clone)]
pub struct FrameRecorder {
    frames: VecDeque<RecordedFrame>,
    capacity: usize,
    path: PathBuf,
}

impl FrameRecorder {
    /// Creates an empty recorder writing to `path`.
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            frames: VecDeque::new(),
            capacity: capacity.max(1),
            path: path.into(),
        }
    }

    /// Appends a frame. Consecutive identical frames are stored once.
    ///
    /// Returns true if the frame was stored.
    pub fn record(&mut self, frame: RecordedFrame) -> bool {
        if self.frames.back().is_some_and(|last| last.same_picture(&frame)) {
            return false;
        }
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
        true
    }

    /// Frames currently buffered, oldest first.
    pub fn frames(&self) -> &VecDeque<RecordedFrame> {
        &self.frames
    }

    /// Buffered frame count.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends every buffered frame to the output file and clears the
    /// buffer. Returns the number of frames written.
    ///
    /// # Errors
    ///
    /// Returns [`RecorderError`] if the file cannot be opened or written.
    /// The buffer is kept on error.
    #[instrument(skip(self), fields(path = %self.path.display(), frames = self.frames.len()))]
    pub fn flush(&mut self) -> Result<usize, RecorderError> {
        if self.frames.is_empty() {
            debug!("Nothing to flush");
            return Ok(0);
        }
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| RecorderError::new(format!("Failed to create directory: {}", e)))?;
        }

        let mut out = String::new();
        for frame in &self.frames {
            let line = serde_json::to_string(frame)
                .map_err(|e| RecorderError::new(format!("Failed to serialize frame: {}", e)))?;
            out.push_str(&line);
            out.push('\n');
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| RecorderError::new(format!("Failed to open recording: {}", e)))?;
        file.write_all(out.as_bytes())
            .map_err(|e| RecorderError::new(format!("Failed to write recording: {}", e)))?;

        let written = self.frames.len();
        self.frames.clear();
        info!(written, "Recording flushed");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ply: usize) -> RecordedFrame {
        RecordedFrame::new(
            Utc::now(),
            ply,
            "white".to_string(),
            format!("board {ply}"),
            String::new(),
        )
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut recorder = FrameRecorder::new("unused.jsonl", 3);
        for ply in 0..5 {
            recorder.record(frame(ply));
        }
        let plies: Vec<usize> = recorder.frames().iter().map(|f| *f.ply()).collect();
        assert_eq!(plies, [2, 3, 4]);
    }

    #[test]
    fn test_identical_frames_collapse() {
        let mut recorder = FrameRecorder::new("unused.jsonl", 10);
        assert!(recorder.record(frame(1)));
        assert!(!recorder.record(frame(1)));
        assert!(recorder.record(frame(2)));
        assert_eq!(recorder.len(), 2);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut recorder = FrameRecorder::new("unused.jsonl", 0);
        recorder.record(frame(1));
        recorder.record(frame(2));
        assert_eq!(recorder.len(), 1);
    }
}
