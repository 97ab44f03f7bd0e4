//! Tests for session assembly, the console front end and recording.

use std::io::Cursor;
use std::time::Instant;
use tempfile::TempDir;

use strictly_chess::{Difficulty, FrameRecorder, GameConfig, RecordedFrame, build_controller, console};
use strictly_chess_core::{
    Observation, Policy, RulesEngine, TabularPolicy, Transition, TurnState, encode,
};

fn config_in(dir: &TempDir) -> GameConfig {
    GameConfig::default()
        .with_checkpoint_dir(dir.path().join("agents"))
        .with_recording_path(dir.path().join("gameplay.jsonl"))
        .with_seed(17)
}

fn start_observation() -> Observation {
    encode(&strictly_chess_core::ShakmatyRules::new())
}

#[test]
fn test_missing_checkpoint_plays_untrained() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let controller = build_controller(&config_in(&dir), Instant::now()).expect("Session builds");
    assert_eq!(controller.policy(), &TabularPolicy::fresh());
    assert_eq!(controller.codec().len(), 20);
    assert_eq!(controller.state(), &TurnState::HumanToMove);
}

#[test]
fn test_checkpoint_for_difficulty_is_loaded() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = config_in(&dir).with_difficulty(Difficulty::Hard);

    let mut trained = TabularPolicy::fresh();
    trained
        .train_step(&Transition {
            observation: start_observation(),
            action: 4,
            reward: 1.0,
            done: false,
        })
        .expect("Train step");
    trained.save(&config.checkpoint_path()).expect("Save");

    let controller = build_controller(&config, Instant::now()).expect("Session builds");
    assert_eq!(controller.policy(), &trained);
    assert_eq!(controller.policy().predict(&start_observation()), 4);
}

#[test]
fn test_pro_mode_learns_after_agent_move() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = config_in(&dir).with_difficulty(Difficulty::Pro);
    let now = Instant::now();
    let mut controller = build_controller(&config, now).expect("Session builds");

    controller.submit_text("e4", now).expect("Legal move");
    controller.tick(now);
    controller.submit_text("d4", now).expect("Legal move");
    controller.tick(now);

    assert_eq!(controller.policy().updates(), 2);
    let saved = TabularPolicy::load(config.checkpoint_path()).expect("Checkpoint written");
    assert_eq!(saved.updates(), 2);
}

#[test]
fn test_console_session() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = config_in(&dir);
    let mut controller = build_controller(&config, Instant::now()).expect("Session builds");
    let mut recorder = FrameRecorder::new(config.recording_path(), 100);

    let input = Cursor::new("e2e4\nundo\nbogus\nredo\nquit\n");
    let mut output = Vec::new();
    console::run(&mut controller, &mut recorder, input, &mut output).expect("Console runs");

    let text = String::from_utf8(output).expect("UTF-8 output");
    assert!(text.contains("You played e4"));
    assert!(text.contains("Agent played"));
    assert!(text.contains("Took back 2 moves"));
    assert!(text.contains("Invalid input"));
    assert!(text.contains("Replayed 2 moves"));
    assert_eq!(controller.rules().ply_count(), 2);
    assert!(!recorder.is_empty());
}

#[test]
fn test_console_stops_at_end_of_input() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = config_in(&dir);
    let mut controller = build_controller(&config, Instant::now()).expect("Session builds");
    let mut recorder = FrameRecorder::new(config.recording_path(), 100);

    console::run(&mut controller, &mut recorder, Cursor::new(""), Vec::new())
        .expect("Console runs");
    assert_eq!(controller.rules().ply_count(), 0);
}

#[test]
fn test_recording_flushes_json_lines() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = config_in(&dir);
    let now = Instant::now();
    let mut controller = build_controller(&config, now).expect("Session builds");
    let mut recorder = FrameRecorder::new(config.recording_path(), 100);

    recorder.record(RecordedFrame::capture(&controller.render_request(None, now), 0, ""));
    controller.submit_text("e4", now).expect("Legal move");
    recorder.record(RecordedFrame::capture(
        &controller.render_request(None, now),
        1,
        "You played e4",
    ));

    assert_eq!(recorder.flush().expect("Flush"), 2);
    assert!(recorder.is_empty());
    assert_eq!(recorder.flush().expect("Second flush"), 0);

    let content = std::fs::read_to_string(config.recording_path()).expect("Recording exists");
    let frames: Vec<RecordedFrame> = content
        .lines()
        .map(|line| serde_json::from_str(line).expect("Valid JSON line"))
        .collect();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].status(), "You played e4");
    assert_eq!(frames[1].to_move(), "black");
    assert!(frames[1].board().contains("4 . . . . P . . ."));
}
