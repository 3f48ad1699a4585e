//! Mirinoi Player - Playback Management
//!
//! This crate provides:
//! - An ordered queue with wraparound navigation and anchored shuffle
//! - Shuffle algorithms (Random + Smart)
//! - Volume with mute
//! - `PlaybackSession`: the Stopped/Playing/Paused state machine that drives
//!   an [`Engine`](mirinoi_core::Engine) from background attempt threads
//! - `PlayerController`: queue + session with repeat-aware autoplay
//!
//! # Architecture
//!
//! `mirinoi-playback` knows nothing about ffplay, mpv or yt-dlp. The engine
//! and the stream resolver are injected as trait objects, so tests drive the
//! session with scripted fakes.
//!
//! # Example: Queue
//!
//! ```rust
//! use mirinoi_core::Track;
//! use mirinoi_playback::QueueManager;
//!
//! let mut queue = QueueManager::new();
//! queue.set_queue(&[
//!     Track::new("One", "https://youtu.be/one"),
//!     Track::new("Two", "https://youtu.be/two"),
//! ]);
//!
//! assert_eq!(queue.next().unwrap().title, "Two");
//! assert_eq!(queue.next().unwrap().title, "One"); // wraps
//!
//! queue.shuffle();
//! assert_eq!(queue.current().unwrap().title, "One"); // anchored
//! ```
//!
//! # Example: Platform Integration
//!
//! ```rust,no_run
//! use mirinoi_core::{Engine, EngineState, Result, StreamResolver, Track};
//! use mirinoi_playback::{PlaybackConfig, PlaybackSession, PlayerController};
//! use std::sync::Arc;
//!
//! struct SilentEngine;
//!
//! impl Engine for SilentEngine {
//!     fn load(&self, _url: &str) -> Result<()> { Ok(()) }
//!     fn play(&self) -> Result<()> { Ok(()) }
//!     fn pause(&self) -> Result<()> { Ok(()) }
//!     fn stop(&self) -> Result<()> { Ok(()) }
//!     fn seek(&self, _position_ms: u64) -> Result<()> { Ok(()) }
//!     fn elapsed_ms(&self) -> Result<i64> { Ok(0) }
//!     fn duration_ms(&self) -> Result<i64> { Ok(0) }
//!     fn state(&self) -> Result<EngineState> { Ok(EngineState::Playing) }
//!     fn set_volume(&self, _volume: u8) -> Result<()> { Ok(()) }
//!     fn volume(&self) -> Result<i64> { Ok(20) }
//! }
//!
//! struct PassThrough;
//!
//! impl StreamResolver for PassThrough {
//!     fn resolve(&self, source_url: &str) -> Result<String> {
//!         Ok(source_url.to_string())
//!     }
//! }
//!
//! let session = PlaybackSession::new(
//!     Arc::new(SilentEngine),
//!     Arc::new(PassThrough),
//!     PlaybackConfig::default(),
//! );
//! let player = PlayerController::new(session);
//!
//! player.load_tracks(&[Track::new("Song", "file:///music/song.mp3")]);
//! player.play_current().ok();
//! println!("{:?}", player.status());
//! ```

mod controller;
mod error;
mod monitor;
mod queue;
mod session;
mod shuffle;
pub mod types;
mod volume;

// Public exports
pub use controller::{PlayerController, PlayerStatus};
pub use error::{PlaybackError, Result};
pub use queue::QueueManager;
pub use session::{FinishedCallback, PlaybackSession};
pub use shuffle::shuffle_tracks;
pub use types::{PlaybackConfig, PlaybackState, RepeatMode, ShuffleMode};
pub use volume::Volume;
