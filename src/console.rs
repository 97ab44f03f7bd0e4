//! Line-oriented front end: text board on stdout, moves on stdin.

use crate::recording::{FrameRecorder, RecordedFrame};
use crate::session::ChessController;
use crate::status;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::time::Instant;
use strictly_chess_core::{GameEvent, RulesEngine, TurnState};
use tracing::{debug, info, instrument};

/// Commands understood besides moves.
const HELP: &str = "Enter a move (e2e4 or Nf3), or: undo, redo, restart, quit";

/// Plays until `quit` or end of input.
///
/// # Errors
///
/// Fails only on I/O errors writing the output.
#[instrument(skip_all)]
pub fn run<R: BufRead, W: Write>(
    controller: &mut ChessController,
    recorder: &mut FrameRecorder,
    mut input: R,
    mut output: W,
) -> Result<()> {
    writeln!(output, "{}", HELP)?;
    let mut status = String::new();

    loop {
        let events = controller.tick(Instant::now());
        report(&mut output, &events, controller, &mut status)?;
        if controller.state() == &TurnState::AgentToMove {
            continue;
        }

        draw(&mut output, controller, recorder, &status)?;
        if controller.state().is_over() {
            writeln!(output, "Type restart or quit")?;
        }
        write!(output, "> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line).context("Failed to read input")? == 0 {
            info!("End of input");
            break;
        }

        let now = Instant::now();
        let late = controller.tick(now);
        if !late.is_empty() {
            report(&mut output, &late, controller, &mut status)?;
            continue;
        }

        let command = line.trim();
        debug!(command, "Console input");
        let events = match command {
            "" => continue,
            "quit" | "q" => break,
            "help" | "?" => {
                writeln!(output, "{}", HELP)?;
                continue;
            }
            "undo" | "u" => controller.undo(now),
            "redo" | "y" => controller.redo(now),
            "restart" | "r" => controller.restart(now),
            text => match controller.submit_text(text, now) {
                Ok(events) => events,
                Err(e) => {
                    writeln!(output, "Invalid input: {}", e)?;
                    continue;
                }
            },
        };
        report(&mut output, &events, controller, &mut status)?;
    }
    Ok(())
}

fn report<W: Write>(
    output: &mut W,
    events: &[GameEvent],
    controller: &ChessController,
    status: &mut String,
) -> Result<()> {
    for event in events {
        if let Some(line) = status::describe(event, controller.human_color()) {
            writeln!(output, "{}", line)?;
            *status = line;
        }
    }
    Ok(())
}

fn draw<W: Write>(
    output: &mut W,
    controller: &ChessController,
    recorder: &mut FrameRecorder,
    status: &str,
) -> Result<()> {
    let request = controller.render_request(None, Instant::now());
    writeln!(output)?;
    writeln!(output, "{}", request.to_text())?;
    if !request.history_tail.is_empty() {
        writeln!(output, "Moves: {}", request.history_tail.join(" "))?;
    }
    writeln!(output, "{}", status::turn_line(&request.state, request.to_move))?;
    recorder.record(RecordedFrame::capture(
        &request,
        controller.rules().ply_count(),
        status,
    ));
    Ok(())
}
