//! ffplay engine against stand-in player scripts
//!
//! The scripts ignore their arguments and either keep running, exit
//! cleanly, or fail, which is all the engine observes of a real ffplay.

#![cfg(unix)]

use mirinoi_core::{Engine, EngineState};
use mirinoi_engine::{FfplayConfig, FfplayEngine};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

// ===== Test Helpers =====

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn engine_with(dir: &Path, body: &str) -> FfplayEngine {
    engine_for_duration(dir, body, "180.250")
}

fn engine_for_duration(dir: &Path, body: &str, seconds: &str) -> FfplayEngine {
    FfplayEngine::new(FfplayConfig {
        ffplay_path: script(dir, "ffplay", body),
        ffprobe_path: script(
            dir,
            "ffprobe",
            &format!(r#"echo '{{"format": {{"duration": "{seconds}"}}}}'"#),
        ),
    })
}

fn wait_for_duration(engine: &FfplayEngine) -> i64 {
    let deadline = Instant::now() + Duration::from_secs(3);
    while engine.duration_ms().unwrap() == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    engine.duration_ms().unwrap()
}

fn wait_for_state(engine: &FfplayEngine, expected: EngineState) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if engine.state().unwrap() == expected {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

// ===== Tests =====

#[test]
fn running_process_pause_and_resume() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(dir.path(), "sleep 30");

    engine.load("/music/a.mp3").unwrap();
    engine.play().unwrap();
    assert_eq!(engine.state().unwrap(), EngineState::Playing);

    engine.seek(10_000).unwrap();
    engine.pause().unwrap();
    assert_eq!(engine.state().unwrap(), EngineState::Paused);
    let paused_at = engine.elapsed_ms().unwrap();
    assert!(paused_at >= 10_000);

    engine.play().unwrap();
    assert_eq!(engine.state().unwrap(), EngineState::Playing);
    assert!(engine.elapsed_ms().unwrap() >= paused_at);

    engine.stop().unwrap();
    assert_eq!(engine.state().unwrap(), EngineState::Ended);
}

#[test]
fn clean_exit_at_the_end_is_ended() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_for_duration(dir.path(), "sleep 0.3", "0.200");

    engine.load("/music/short.mp3").unwrap();
    assert_eq!(wait_for_duration(&engine), 200);
    engine.play().unwrap();

    assert!(wait_for_state(&engine, EngineState::Ended));
}

#[test]
fn clean_exit_long_before_the_end_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(dir.path(), "sleep 0.05; exit 0");

    engine.load("https://cdn/unplayable").unwrap();
    assert_eq!(wait_for_duration(&engine), 180_250);
    engine.play().unwrap();

    assert!(wait_for_state(&engine, EngineState::Error));
}

#[test]
fn instant_clean_exit_without_duration_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = FfplayEngine::new(FfplayConfig {
        ffplay_path: script(dir.path(), "ffplay", "exit 0"),
        ffprobe_path: script(dir.path(), "ffprobe", "exit 1"),
    });

    engine.load("https://cdn/unplayable").unwrap();
    engine.play().unwrap();

    assert!(wait_for_state(&engine, EngineState::Error));
}

#[test]
fn failed_exit_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(dir.path(), "exit 1");

    engine.load("https://cdn/broken").unwrap();
    engine.play().unwrap();

    assert!(wait_for_state(&engine, EngineState::Error));
}

#[test]
fn duration_comes_from_ffprobe() {
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(dir.path(), "sleep 30");

    engine.load("/music/a.mp3").unwrap();
    assert_eq!(wait_for_duration(&engine), 180_250);

    engine.stop().unwrap();
    assert_eq!(engine.duration_ms().unwrap(), 0);
}
