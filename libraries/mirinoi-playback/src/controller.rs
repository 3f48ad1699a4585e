//! Player controller - queue plus session, with autoplay
//!
//! The controller owns the queue and the session and registers itself as the
//! session's finished callback. When a track ends naturally it applies the
//! repeat mode and starts the next track.
//!
//! Lock order is controller, then session. The controller lock is held across
//! session calls so autoplay and user navigation never interleave.

use crate::error::{PlaybackError, Result};
use crate::queue::QueueManager;
use crate::session::PlaybackSession;
use crate::types::{PlaybackState, RepeatMode, ShuffleMode};
use mirinoi_core::Track;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};

/// Snapshot of everything a presentation layer shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStatus {
    pub state: PlaybackState,
    pub track: Option<Track>,
    pub index: Option<usize>,
    pub queue_len: usize,
    pub elapsed_ms: u64,
    pub duration_ms: u64,
    pub progress: f64,
    pub volume: u8,
    pub muted: bool,
    pub shuffle: ShuffleMode,
    pub repeat: RepeatMode,
}

struct ControllerState {
    queue: QueueManager,
    shuffle: ShuffleMode,
    repeat: RepeatMode,
    /// Session generation of the last play issued by the controller
    generation: u64,
}

/// Queue-driven player
pub struct PlayerController {
    session: PlaybackSession,
    inner: Mutex<ControllerState>,
}

impl PlayerController {
    /// Wrap a session; initial shuffle and repeat modes come from its config
    pub fn new(session: PlaybackSession) -> Arc<Self> {
        let shuffle = session.config().shuffle;
        let repeat = session.config().repeat;

        Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            session.set_on_finished(move || {
                if let Some(controller) = weak.upgrade() {
                    controller.handle_track_finished();
                }
            });

            Self {
                session,
                inner: Mutex::new(ControllerState {
                    queue: QueueManager::new(),
                    shuffle,
                    repeat,
                    generation: 0,
                }),
            }
        })
    }

    /// Underlying session (volume, seek, progress)
    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// Stop playback and replace the queue
    ///
    /// With shuffle on, the new queue is shuffled and the cursor starts at
    /// the top of the shuffled order.
    pub fn load_tracks(&self, tracks: &[Track]) {
        let mut inner = self.inner.lock();
        self.session.stop();
        inner.queue.set_queue(tracks);

        if inner.shuffle != ShuffleMode::Off && !inner.queue.is_empty() {
            let mode = inner.shuffle;
            inner.queue.shuffle_with(mode);
            if let Err(err) = inner.queue.select(0) {
                tracing::debug!(error = %err, "could not rewind shuffled queue");
            }
        }
        tracing::info!(tracks = tracks.len(), shuffle = ?inner.shuffle, "queue loaded");
    }

    /// Play the current track (resumes when paused on it; no-op when playing)
    pub fn play_current(&self) -> Result<Track> {
        let mut inner = self.inner.lock();
        let track = inner
            .queue
            .current()
            .cloned()
            .ok_or(PlaybackError::QueueEmpty)?;

        if self.session.state() != PlaybackState::Playing {
            self.session.play(&track.url);
            inner.generation = self.session.generation();
        }
        Ok(track)
    }

    /// Jump to `index` and play it from the start
    pub fn play_index(&self, index: usize) -> Result<Track> {
        let mut inner = self.inner.lock();
        let track = inner.queue.select(index)?.clone();
        self.force_play(&mut inner, &track);
        Ok(track)
    }

    /// Advance (wrapping) and play
    pub fn next(&self) -> Result<Track> {
        let mut inner = self.inner.lock();
        let track = inner.queue.next().cloned().ok_or(PlaybackError::QueueEmpty)?;
        self.force_play(&mut inner, &track);
        Ok(track)
    }

    /// Go back (wrapping) and play
    pub fn previous(&self) -> Result<Track> {
        let mut inner = self.inner.lock();
        let track = inner.queue.prev().cloned().ok_or(PlaybackError::QueueEmpty)?;
        self.force_play(&mut inner, &track);
        Ok(track)
    }

    pub fn pause(&self) {
        let _inner = self.inner.lock();
        self.session.pause();
    }

    /// Pause when playing, otherwise play the current track
    pub fn toggle_pause(&self) -> Result<()> {
        if self.session.state() == PlaybackState::Playing {
            self.pause();
            Ok(())
        } else {
            self.play_current().map(|_| ())
        }
    }

    pub fn stop(&self) {
        let _inner = self.inner.lock();
        self.session.stop();
    }

    /// Set shuffle mode; `Off` restores the load order
    pub fn set_shuffle(&self, mode: ShuffleMode) {
        let mut inner = self.inner.lock();
        inner.shuffle = mode;
        match mode {
            ShuffleMode::Off => inner.queue.unshuffle(),
            mode => inner.queue.shuffle_with(mode),
        }
        tracing::debug!(?mode, "shuffle mode changed");
    }

    /// Flip between random shuffle and load order
    pub fn toggle_shuffle(&self) -> ShuffleMode {
        let next = match self.inner.lock().shuffle {
            ShuffleMode::Off => ShuffleMode::Random,
            ShuffleMode::Random | ShuffleMode::Smart => ShuffleMode::Off,
        };
        self.set_shuffle(next);
        next
    }

    pub fn set_repeat(&self, mode: RepeatMode) {
        self.inner.lock().repeat = mode;
        tracing::debug!(%mode, "repeat mode changed");
    }

    pub fn repeat(&self) -> RepeatMode {
        self.inner.lock().repeat
    }

    pub fn shuffle(&self) -> ShuffleMode {
        self.inner.lock().shuffle
    }

    /// Copy of the queue
    pub fn queue(&self) -> QueueManager {
        self.inner.lock().queue.clone()
    }

    pub fn status(&self) -> PlayerStatus {
        let inner = self.inner.lock();
        let track = inner.queue.current().cloned();
        let index = track.as_ref().map(|_| inner.queue.current_index());

        PlayerStatus {
            state: self.session.state(),
            track,
            index,
            queue_len: inner.queue.len(),
            elapsed_ms: self.session.elapsed_ms(),
            duration_ms: self.session.duration_ms(),
            progress: self.session.progress_ratio(),
            volume: self.session.volume(),
            muted: self.session.is_muted(),
            shuffle: inner.shuffle,
            repeat: inner.repeat,
        }
    }

    /// Autoplay after a natural end
    fn handle_track_finished(&self) {
        let mut inner = self.inner.lock();

        // A user action since the finished track started wins
        if self.session.state() != PlaybackState::Stopped
            || self.session.generation() != inner.generation
        {
            tracing::debug!("playback moved on, skipping autoplay");
            return;
        }

        let upcoming = match inner.repeat {
            RepeatMode::One => inner.queue.current().cloned(),
            RepeatMode::All => inner.queue.next().cloned(),
            RepeatMode::Off if inner.queue.is_last() => {
                tracing::info!("end of queue");
                None
            }
            RepeatMode::Off => inner.queue.next().cloned(),
        };

        if let Some(track) = upcoming {
            tracing::info!(track = %track, repeat = %inner.repeat, "autoplay");
            self.session.play(&track.url);
            inner.generation = self.session.generation();
        }
    }

    fn force_play(&self, inner: &mut ControllerState, track: &Track) {
        self.session.stop();
        self.session.play(&track.url);
        inner.generation = self.session.generation();
    }
}
