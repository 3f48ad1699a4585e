//! Playback session - transport state machine
//!
//! A session owns one [`Engine`] and drives it through
//! Stopped → Playing ⇄ Paused → Stopped. Starting a track is asynchronous:
//! `play()` bumps the generation counter and spawns a background attempt
//! (resolve, load, confirm start, monitor) carrying that generation. Any
//! later `play()` of another source or any `stop()` bumps the counter again,
//! which turns every older attempt into a silent no-op.
//!
//! All state lives behind one reentrant guard. Public operations hold it for
//! their whole transition and re-enter it through small helpers; the monitor
//! thread only takes it for short check/write steps.

use crate::monitor;
use crate::types::{PlaybackConfig, PlaybackState};
use crate::volume::Volume;
use mirinoi_core::{Engine, StreamResolver};
use parking_lot::{Mutex, ReentrantMutex};
use std::cell::RefCell;
use std::sync::Arc;

/// Callback fired when a track completes naturally
pub type FinishedCallback = Arc<dyn Fn() + Send + Sync>;

/// Mutable session state, only touched under the session guard
#[derive(Debug)]
pub(crate) struct SessionState {
    pub(crate) playback: PlaybackState,
    pub(crate) current_source: Option<String>,
    pub(crate) generation: u64,
    pub(crate) stop_requested: bool,
    pub(crate) volume: Volume,
    pub(crate) paused_position_ms: u64,
    pub(crate) last_duration_ms: u64,
    /// The engine holds a started instance for the current generation
    pub(crate) engine_loaded: bool,
    /// Generation of the live monitor thread, if any
    pub(crate) monitor_generation: Option<u64>,
}

impl SessionState {
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// The attempt for `generation` may keep going
    pub(crate) fn is_live(&self, generation: u64) -> bool {
        self.is_current(generation) && !self.stop_requested
    }
}

/// State shared between the session handle and its background threads
pub(crate) struct Shared {
    pub(crate) engine: Arc<dyn Engine>,
    pub(crate) resolver: Arc<dyn StreamResolver>,
    pub(crate) config: PlaybackConfig,
    pub(crate) state: ReentrantMutex<RefCell<SessionState>>,
    pub(crate) on_finished: Mutex<Option<FinishedCallback>>,
    /// Serializes attempts handing streams to the engine; taken before the
    /// state guard, never after
    pub(crate) attempt_lock: Mutex<()>,
}

impl Shared {
    /// Borrow the state under the guard
    ///
    /// The closure must not call back into anything that borrows the state.
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }
}

/// Playback session
///
/// Transport operations never fail from the caller's point of view: failures
/// inside the engine or the resolver end up as a `Stopped` state and the
/// absence of the finished callback.
pub struct PlaybackSession {
    shared: Arc<Shared>,
}

impl PlaybackSession {
    /// Create a session around an engine and a stream resolver
    pub fn new(
        engine: Arc<dyn Engine>,
        resolver: Arc<dyn StreamResolver>,
        config: PlaybackConfig,
    ) -> Self {
        let state = SessionState {
            playback: PlaybackState::Stopped,
            current_source: None,
            generation: 0,
            stop_requested: false,
            volume: Volume::new(config.volume),
            paused_position_ms: 0,
            last_duration_ms: 0,
            engine_loaded: false,
            monitor_generation: None,
        };

        let effective = state.volume.effective();
        let session = Self {
            shared: Arc::new(Shared {
                engine,
                resolver,
                config,
                state: ReentrantMutex::new(RefCell::new(state)),
                on_finished: Mutex::new(None),
                attempt_lock: Mutex::new(()),
            }),
        };

        // Engines start at their own default level
        session.forward_volume(effective);
        session
    }

    /// Register the natural-completion callback (replaces any previous one)
    ///
    /// The callback runs on the monitor thread, outside the session guard, so
    /// it may call back into the session.
    pub fn set_on_finished(&self, callback: impl Fn() + Send + Sync + 'static) {
        *self.shared.on_finished.lock() = Some(Arc::new(callback));
    }

    /// Remove the natural-completion callback
    pub fn clear_on_finished(&self) {
        *self.shared.on_finished.lock() = None;
    }

    // ===== Transport =====

    /// Play `source_url`
    ///
    /// - Already playing this source: no-op
    /// - Paused on this source: resume in place, or restart from the paused
    ///   position when the engine cannot resume
    /// - Anything else: start a new background attempt
    ///
    /// Returns immediately; the outcome is observed through [`Self::state`].
    pub fn play(&self, source_url: &str) {
        let _guard = self.shared.state.lock();
        let (playback, same_source) = self.shared.with_state(|st| {
            (
                st.playback,
                st.current_source.as_deref() == Some(source_url),
            )
        });

        match (playback, same_source) {
            (PlaybackState::Playing, true) => {
                tracing::debug!(source = %source_url, "already playing, ignoring play");
            }
            (PlaybackState::Paused, true) => self.resume(source_url),
            _ => self.start_attempt(source_url, 0),
        }
    }

    /// Pause playback (only from Playing)
    pub fn pause(&self) {
        let _guard = self.shared.state.lock();
        if self.shared.with_state(|st| st.playback) != PlaybackState::Playing {
            return;
        }

        let position = match self.shared.engine.elapsed_ms() {
            Ok(ms) if ms > 0 => ms as u64,
            Ok(_) => 0,
            Err(err) => {
                tracing::debug!(error = %err, "elapsed query failed while pausing");
                0
            }
        };

        // A resume offset still waiting for its seek is the real position
        let position = self.shared.with_state(|st| {
            st.paused_position_ms = st.paused_position_ms.max(position);
            st.stop_requested = true;
            st.paused_position_ms
        });

        if let Err(err) = self.shared.engine.pause() {
            tracing::debug!(error = %err, "engine pause failed");
        }

        self.shared.with_state(|st| st.playback = PlaybackState::Paused);
        tracing::info!(position_ms = position, "paused");
    }

    /// Stop playback from any state
    ///
    /// Invalidates every in-flight attempt. Engine errors are swallowed so the
    /// session always reaches Stopped.
    pub fn stop(&self) {
        let _guard = self.shared.state.lock();
        let generation = self.shared.with_state(|st| {
            st.stop_requested = true;
            st.generation += 1;
            st.generation
        });

        if let Err(err) = self.shared.engine.stop() {
            tracing::debug!(error = %err, "engine stop failed");
        }

        self.shared.with_state(|st| {
            st.playback = PlaybackState::Stopped;
            st.current_source = None;
            st.paused_position_ms = 0;
            st.last_duration_ms = 0;
            st.engine_loaded = false;
            st.monitor_generation = None;
        });
        tracing::debug!(generation, "stopped");
    }

    /// Seek to an absolute position (Playing or Paused only)
    ///
    /// The target is clamped to `[0, duration]` when the duration is known.
    pub fn seek_to(&self, position_ms: i64) {
        let _guard = self.shared.state.lock();
        let playback = self.shared.with_state(|st| st.playback);
        if playback == PlaybackState::Stopped {
            return;
        }

        let duration = self.duration_ms();
        let mut target = position_ms.max(0) as u64;
        if duration > 0 {
            target = target.min(duration);
        }

        if let Err(err) = self.shared.engine.seek(target) {
            tracing::debug!(error = %err, target_ms = target, "seek failed");
        }

        if playback == PlaybackState::Paused {
            self.shared.with_state(|st| st.paused_position_ms = target);
        }
    }

    /// Seek to a fraction of the track (Playing or Paused only)
    ///
    /// No-op when the duration is unknown.
    pub fn seek_to_ratio(&self, ratio: f64) {
        if ratio.is_nan() {
            return;
        }

        let _guard = self.shared.state.lock();
        let duration = self.duration_ms();
        if duration == 0 {
            return;
        }

        let ratio = ratio.clamp(0.0, 1.0);
        self.seek_to((duration as f64 * ratio).round() as i64);
    }

    // ===== Volume =====

    /// Set volume (clamped to 0-100)
    pub fn set_volume(&self, level: i32) {
        let _guard = self.shared.state.lock();
        let effective = self.shared.with_state(|st| {
            st.volume.set_level(Volume::clamp(level));
            st.volume.effective()
        });
        self.forward_volume(effective);
    }

    /// Current volume level (0-100)
    ///
    /// Prefers the engine's report when it is in range and a stream is
    /// loaded; falls back to the stored value.
    pub fn volume(&self) -> u8 {
        let _guard = self.shared.state.lock();
        let (stored, muted, loaded) = self.shared.with_state(|st| {
            (st.volume.level(), st.volume.is_muted(), st.engine_loaded)
        });
        if muted || !loaded {
            return stored;
        }

        match self.shared.engine.volume() {
            Ok(reported) if (0..=100).contains(&reported) => {
                let reported = reported as u8;
                self.shared.with_state(|st| st.volume.set_level(reported));
                reported
            }
            _ => stored,
        }
    }

    /// Mute (volume level preserved)
    pub fn mute(&self) {
        self.update_mute(Volume::mute);
    }

    /// Unmute
    pub fn unmute(&self) {
        self.update_mute(Volume::unmute);
    }

    /// Toggle mute
    pub fn toggle_mute(&self) {
        self.update_mute(Volume::toggle_mute);
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.shared.with_state(|st| st.volume.is_muted())
    }

    // ===== Progress =====

    /// Elapsed position in milliseconds (0 when unknown)
    pub fn elapsed_ms(&self) -> u64 {
        let _guard = self.shared.state.lock();
        let (playback, paused_at) = self
            .shared
            .with_state(|st| (st.playback, st.paused_position_ms));

        match playback {
            PlaybackState::Stopped => 0,
            PlaybackState::Paused if paused_at > 0 => paused_at,
            _ => match self.shared.engine.elapsed_ms() {
                Ok(ms) if ms > 0 => ms as u64,
                _ => 0,
            },
        }
    }

    /// Track duration in milliseconds
    ///
    /// Sticky: once observed, a duration survives failed or empty queries
    /// until `stop()` or a different track starts.
    pub fn duration_ms(&self) -> u64 {
        let _guard = self.shared.state.lock();
        match self.shared.engine.duration_ms() {
            Ok(ms) if ms > 0 => {
                let ms = ms as u64;
                self.shared.with_state(|st| st.last_duration_ms = ms);
                ms
            }
            _ => self.shared.with_state(|st| st.last_duration_ms),
        }
    }

    /// `elapsed / duration` clamped to `[0, 1]` (0 when duration unknown)
    pub fn progress_ratio(&self) -> f64 {
        let _guard = self.shared.state.lock();
        let duration = self.duration_ms();
        if duration == 0 {
            return 0.0;
        }
        (self.elapsed_ms() as f64 / duration as f64).clamp(0.0, 1.0)
    }

    // ===== State Queries =====

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.shared.with_state(|st| st.playback)
    }

    /// Source URL of the current (or last started) track
    pub fn current_source(&self) -> Option<String> {
        self.shared.with_state(|st| st.current_source.clone())
    }

    /// Current play generation
    pub fn generation(&self) -> u64 {
        self.shared.with_state(|st| st.generation)
    }

    /// Position remembered by the last pause
    pub fn paused_position_ms(&self) -> u64 {
        self.shared.with_state(|st| st.paused_position_ms)
    }

    /// Session configuration
    pub fn config(&self) -> &PlaybackConfig {
        &self.shared.config
    }

    // ===== Internals =====

    /// Resume a paused source; caller holds the guard
    fn resume(&self, source_url: &str) {
        let _guard = self.shared.state.lock();
        let (loaded, position, generation) = self
            .shared
            .with_state(|st| (st.engine_loaded, st.paused_position_ms, st.generation));

        if !loaded || !self.shared.engine.is_resumable() {
            tracing::debug!(position_ms = position, "engine not resumable, restarting");
            self.start_attempt(source_url, position);
            return;
        }

        let seek_acknowledged = if position > 0 {
            match self.shared.engine.seek(position) {
                Ok(()) => true,
                Err(err) => {
                    tracing::debug!(error = %err, "seek before resume failed");
                    false
                }
            }
        } else {
            true
        };

        if let Err(err) = self.shared.engine.play() {
            tracing::warn!(error = %err, "resume failed, restarting from paused position");
            self.start_attempt(source_url, position);
            return;
        }

        let needs_watcher = self.shared.with_state(|st| {
            st.stop_requested = false;
            st.playback = PlaybackState::Playing;
            if seek_acknowledged {
                st.paused_position_ms = 0;
            }
            let needs_watcher = st.monitor_generation != Some(generation);
            if needs_watcher {
                st.monitor_generation = Some(generation);
            }
            needs_watcher
        });

        if needs_watcher {
            if let Err(err) = monitor::spawn_watch(Arc::clone(&self.shared), generation) {
                tracing::error!(error = %err, "failed to spawn monitor thread");
                self.shared.with_state(|st| st.monitor_generation = None);
            }
        }
        tracing::info!(generation, position_ms = position, "resumed");
    }

    /// Start a new background attempt; caller holds the guard
    fn start_attempt(&self, source_url: &str, resume_offset_ms: u64) {
        let _guard = self.shared.state.lock();
        let (generation, was_active) = self.shared.with_state(|st| {
            let was_active = st.playback != PlaybackState::Stopped || st.engine_loaded;
            st.generation += 1;
            st.stop_requested = false;
            let previous = st.current_source.replace(source_url.to_string());
            if previous.as_deref() != Some(source_url) {
                st.last_duration_ms = 0;
            }
            st.playback = PlaybackState::Playing;
            st.paused_position_ms = resume_offset_ms;
            st.engine_loaded = false;
            st.monitor_generation = Some(st.generation);
            (st.generation, was_active)
        });

        // Silence the previous track while the new one resolves
        if was_active {
            if let Err(err) = self.shared.engine.stop() {
                tracing::debug!(error = %err, "engine stop before new attempt failed");
            }
        }

        tracing::info!(
            generation,
            source = %source_url,
            resume_offset_ms,
            "starting playback attempt"
        );

        if let Err(err) = monitor::spawn_attempt(
            Arc::clone(&self.shared),
            generation,
            source_url.to_string(),
            resume_offset_ms,
        ) {
            tracing::error!(error = %err, "failed to spawn playback thread");
            self.shared.with_state(|st| {
                if st.is_current(generation) {
                    st.playback = PlaybackState::Stopped;
                    st.monitor_generation = None;
                }
            });
        }
    }

    fn update_mute(&self, change: fn(&mut Volume)) {
        let _guard = self.shared.state.lock();
        let effective = self.shared.with_state(|st| {
            change(&mut st.volume);
            st.volume.effective()
        });
        self.forward_volume(effective);
    }

    fn forward_volume(&self, effective: u8) {
        if let Err(err) = self.shared.engine.set_volume(effective) {
            tracing::debug!(error = %err, volume = effective, "engine volume update failed");
        }
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.stop();
    }
}
