//! Integration tests for the player controller
//!
//! Autoplay, repeat modes and queue commands against a scripted engine.

mod common;

use common::{settle, test_config, wait_until, GatedResolver, MockEngine};
use mirinoi_core::Track;
use mirinoi_playback::{
    PlaybackConfig, PlaybackError, PlaybackSession, PlaybackState, PlayerController, RepeatMode,
    ShuffleMode,
};
use std::sync::Arc;

// ===== Test Helpers =====

fn track(name: &str) -> Track {
    Track::with_artist(name, "Artist", format!("https://youtu.be/{name}"))
}

fn url(name: &str) -> String {
    format!("https://youtu.be/{name}")
}

fn player_with(config: PlaybackConfig) -> (Arc<MockEngine>, Arc<PlayerController>) {
    let engine = MockEngine::new();
    let session = PlaybackSession::new(engine.clone(), GatedResolver::new(), config);
    (engine, PlayerController::new(session))
}

fn player() -> (Arc<MockEngine>, Arc<PlayerController>) {
    player_with(test_config())
}

fn wait_playing(engine: &MockEngine, name: &str) {
    let url = url(name);
    assert!(
        wait_until(|| engine.is_playing(&url)),
        "engine never started {name}"
    );
}

// ===== Autoplay =====

#[test]
fn repeat_off_advances_then_stops_after_last_track() {
    let (engine, player) = player();
    player.load_tracks(&[track("a"), track("b")]);

    player.play_current().unwrap();
    wait_playing(&engine, "a");

    engine.finish();
    wait_playing(&engine, "b");
    assert_eq!(player.status().index, Some(1));

    engine.finish();
    assert!(wait_until(|| player.status().state == PlaybackState::Stopped));
    settle();

    assert_eq!(engine.loads(), vec![url("a"), url("b")]);
    assert_eq!(player.status().index, Some(1));
}

#[test]
fn repeat_all_wraps_to_first_track() {
    let (engine, player) = player();
    player.set_repeat(RepeatMode::All);
    player.load_tracks(&[track("a"), track("b")]);

    player.play_current().unwrap();
    wait_playing(&engine, "a");
    engine.finish();
    wait_playing(&engine, "b");
    engine.finish();

    assert!(wait_until(|| engine.loads().len() == 3));
    wait_playing(&engine, "a");
    assert_eq!(player.status().index, Some(0));
}

#[test]
fn repeat_one_replays_current_track() {
    let (engine, player) = player();
    player.set_repeat(RepeatMode::One);
    player.load_tracks(&[track("a"), track("b")]);

    player.play_current().unwrap();
    wait_playing(&engine, "a");
    engine.finish();

    assert!(wait_until(|| engine.loads().len() == 2));
    assert_eq!(engine.loads(), vec![url("a"), url("a")]);
    assert_eq!(player.status().index, Some(0));
}

#[test]
fn user_stop_prevents_autoplay() {
    let (engine, player) = player();
    player.load_tracks(&[track("a"), track("b")]);
    player.play_current().unwrap();
    wait_playing(&engine, "a");

    player.stop();
    engine.finish();
    settle();

    assert_eq!(engine.loads(), vec![url("a")]);
    assert_eq!(player.status().state, PlaybackState::Stopped);
    assert_eq!(player.status().index, Some(0));
}

#[test]
fn initial_modes_come_from_config() {
    let (_engine, player) = player_with(PlaybackConfig {
        repeat: RepeatMode::One,
        shuffle: ShuffleMode::Smart,
        ..test_config()
    });

    assert_eq!(player.repeat(), RepeatMode::One);
    assert_eq!(player.shuffle(), ShuffleMode::Smart);
}

// ===== Navigation =====

#[test]
fn navigation_force_plays_from_start() {
    let (engine, player) = player();
    player.load_tracks(&[track("a"), track("b"), track("c")]);

    assert_eq!(player.next().unwrap().title, "b");
    wait_playing(&engine, "b");

    assert_eq!(player.previous().unwrap().title, "a");
    wait_playing(&engine, "a");

    assert_eq!(player.previous().unwrap().title, "c");
    wait_playing(&engine, "c");

    assert_eq!(player.play_index(1).unwrap().title, "b");
    wait_playing(&engine, "b");
    assert_eq!(player.status().index, Some(1));
}

#[test]
fn commands_on_empty_queue_are_rejected() {
    let (_engine, player) = player();

    assert!(matches!(player.play_current(), Err(PlaybackError::QueueEmpty)));
    assert!(matches!(player.next(), Err(PlaybackError::QueueEmpty)));
    assert!(matches!(player.previous(), Err(PlaybackError::QueueEmpty)));
    assert!(matches!(player.play_index(0), Err(PlaybackError::QueueEmpty)));
}

#[test]
fn play_index_out_of_range() {
    let (_engine, player) = player();
    player.load_tracks(&[track("a")]);

    assert!(matches!(
        player.play_index(4),
        Err(PlaybackError::IndexOutOfBounds { index: 4, len: 1 })
    ));
}

#[test]
fn toggle_pause_resumes_without_reloading() {
    let (engine, player) = player();
    player.load_tracks(&[track("a")]);
    player.play_current().unwrap();
    wait_playing(&engine, "a");

    player.toggle_pause().unwrap();
    assert_eq!(player.status().state, PlaybackState::Paused);

    player.toggle_pause().unwrap();
    assert_eq!(player.status().state, PlaybackState::Playing);
    assert_eq!(engine.loads().len(), 1);
}

#[test]
fn play_current_while_playing_is_noop() {
    let (engine, player) = player();
    player.load_tracks(&[track("a")]);
    player.play_current().unwrap();
    wait_playing(&engine, "a");

    player.play_current().unwrap();
    settle();

    assert_eq!(engine.loads().len(), 1);
}

#[test]
fn load_tracks_stops_playback() {
    let (engine, player) = player();
    player.load_tracks(&[track("a")]);
    player.play_current().unwrap();
    wait_playing(&engine, "a");

    player.load_tracks(&[track("x"), track("y")]);

    let status = player.status();
    assert_eq!(status.state, PlaybackState::Stopped);
    assert_eq!(status.queue_len, 2);
    assert_eq!(status.track.unwrap().title, "x");
}

// ===== Shuffle =====

#[test]
fn shuffle_on_load_starts_at_top() {
    let (_engine, player) = player();
    player.set_shuffle(ShuffleMode::Random);

    let tracks: Vec<Track> = (0..20).map(|i| track(&format!("t{i}"))).collect();
    player.load_tracks(&tracks);

    let queue = player.queue();
    assert!(queue.is_shuffled());
    assert_eq!(queue.current_index(), 0);
    assert_eq!(queue.len(), 20);

    player.set_shuffle(ShuffleMode::Off);
    assert_eq!(player.queue().tracks(), tracks.as_slice());
}

#[test]
fn toggle_shuffle_keeps_current_track() {
    let (_engine, player) = player();
    let tracks: Vec<Track> = (0..8).map(|i| track(&format!("t{i}"))).collect();
    player.load_tracks(&tracks);
    player.play_index(3).unwrap();

    assert_eq!(player.toggle_shuffle(), ShuffleMode::Random);
    assert_eq!(player.status().track.unwrap().title, "t3");

    assert_eq!(player.toggle_shuffle(), ShuffleMode::Off);
    let status = player.status();
    assert_eq!(status.index, Some(3));
    assert_eq!(status.shuffle, ShuffleMode::Off);
}

// ===== Status =====

#[test]
fn status_snapshot() {
    let (engine, player) = player();
    player.load_tracks(&[track("a"), track("b")]);
    player.session().set_volume(45);
    player.play_current().unwrap();
    wait_playing(&engine, "a");
    engine.script(|s| {
        s.duration = Some(2000);
        s.elapsed = 500;
    });

    let status = player.status();
    assert_eq!(status.state, PlaybackState::Playing);
    assert_eq!(status.track.unwrap().title, "a");
    assert_eq!(status.index, Some(0));
    assert_eq!(status.queue_len, 2);
    assert_eq!(status.elapsed_ms, 500);
    assert_eq!(status.duration_ms, 2000);
    assert!((status.progress - 0.25).abs() < 1e-9);
    assert_eq!(status.volume, 45);
    assert!(!status.muted);
    assert_eq!(status.repeat, RepeatMode::Off);
}

#[test]
fn controller_drop_releases_engine() {
    let (engine, player) = player();
    player.load_tracks(&[track("a")]);
    player.play_current().unwrap();
    wait_playing(&engine, "a");

    drop(player);

    assert!(wait_until(|| !engine.is_playing(&url("a"))));
}
