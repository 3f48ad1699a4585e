//! Background playback attempts
//!
//! One thread per attempt: resolve the source, load the engine, wait for it
//! to report a started state, then poll until the stream ends or the attempt
//! is superseded. Every state write first checks that the attempt's
//! generation is still current.

use crate::session::Shared;
use crate::types::PlaybackState;
use mirinoi_core::{EngineState, MirinoiError, Result};
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Why a monitor stopped watching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// Engine reported end of stream
    Ended,
    /// Engine failed, never started, or stopped answering
    Failed,
    /// A newer generation, a stop, or a pause took over
    Superseded,
}

/// Spawn a full attempt (resolve, load, start, monitor)
pub(crate) fn spawn_attempt(
    shared: Arc<Shared>,
    generation: u64,
    source_url: String,
    resume_offset_ms: u64,
) -> io::Result<()> {
    thread::Builder::new()
        .name(format!("mirinoi-attempt-{generation}"))
        .spawn(move || run_attempt(&shared, generation, &source_url, resume_offset_ms))
        .map(|_| ())
}

/// Spawn a monitor for an engine that is already running (resume in place)
pub(crate) fn spawn_watch(shared: Arc<Shared>, generation: u64) -> io::Result<()> {
    thread::Builder::new()
        .name(format!("mirinoi-monitor-{generation}"))
        .spawn(move || {
            let exit = watch(&shared, generation);
            finish(&shared, generation, exit);
        })
        .map(|_| ())
}

fn run_attempt(shared: &Shared, generation: u64, source_url: &str, resume_offset_ms: u64) {
    let exit = match start(shared, generation, source_url) {
        Ok(true) => {
            if resume_offset_ms > 0 {
                apply_resume_offset(shared, generation, resume_offset_ms);
            }
            watch(shared, generation)
        }
        Ok(false) => Exit::Superseded,
        Err(err) => {
            tracing::warn!(
                generation,
                source = %source_url,
                error = %err,
                "playback attempt failed to start"
            );
            Exit::Failed
        }
    };

    finish(shared, generation, exit);
}

fn is_live(shared: &Shared, generation: u64) -> bool {
    shared.with_state(|st| st.is_live(generation))
}

/// Liveness check that also releases the monitor marker when the attempt is over
///
/// Both happen in one step, so a resume racing with this check either sees
/// the marker still held (and this monitor keeps going) or sees it released
/// (and starts its own watcher).
fn keep_watching(shared: &Shared, generation: u64) -> bool {
    shared.with_state(|st| {
        if st.is_live(generation) {
            return true;
        }
        if st.monitor_generation == Some(generation) {
            st.monitor_generation = None;
        }
        false
    })
}

/// Resolve, load and wait for the engine to start
///
/// Returns `Ok(false)` when the attempt was superseded along the way.
fn start(shared: &Shared, generation: u64, source_url: &str) -> Result<bool> {
    let stream_url = shared.resolver.resolve(source_url)?;
    tracing::debug!(generation, "stream resolved");

    if !hand_over(shared, generation, &stream_url)? {
        return Ok(false);
    }

    let timeout = shared.config.startup_timeout();
    let deadline = Instant::now() + timeout;
    loop {
        if !keep_watching(shared, generation) {
            return Ok(false);
        }

        match shared.engine.state() {
            Ok(state) if state.is_started() => break,
            Ok(EngineState::Loading) => {}
            Ok(state) => {
                return Err(MirinoiError::engine(format!(
                    "engine reported {state:?} before playback started"
                )));
            }
            Err(err) => tracing::debug!(error = %err, "state query failed during startup"),
        }

        if Instant::now() >= deadline {
            return Err(MirinoiError::EngineStartTimeout(timeout));
        }
        thread::sleep(shared.config.poll_interval());
    }

    shared.with_state(|st| {
        if st.is_current(generation) {
            st.engine_loaded = true;
        }
    });
    tracing::info!(generation, "playback started");
    Ok(true)
}

/// Load and start the stream without holding the state guard
///
/// The attempt lock keeps two attempts from interleaving their engine calls.
/// A stop() or newer play() landing while the engine loads is caught by the
/// second liveness check, which silences whatever this attempt started.
fn hand_over(shared: &Shared, generation: u64, stream_url: &str) -> Result<bool> {
    let _attempt = shared.attempt_lock.lock();
    if !keep_watching(shared, generation) {
        return Ok(false);
    }
    let volume = shared.with_state(|st| st.volume.effective());

    shared.engine.load(stream_url)?;
    if let Err(err) = shared.engine.set_volume(volume) {
        tracing::debug!(error = %err, "initial volume not applied");
    }
    shared.engine.play()?;

    if keep_watching(shared, generation) {
        return Ok(true);
    }

    tracing::debug!(generation, "superseded while loading, silencing engine");
    if let Err(err) = shared.engine.stop() {
        tracing::debug!(error = %err, "engine stop after stale load failed");
    }
    Ok(false)
}

fn apply_resume_offset(shared: &Shared, generation: u64, offset_ms: u64) {
    thread::sleep(shared.config.resume_grace());
    if !is_live(shared, generation) {
        return;
    }

    match shared.engine.seek(offset_ms) {
        Ok(()) => shared.with_state(|st| {
            if st.is_current(generation) {
                st.paused_position_ms = 0;
            }
        }),
        Err(err) => tracing::debug!(error = %err, offset_ms, "resume seek failed"),
    }
}

/// Poll the engine until a terminal state or supersession
fn watch(shared: &Shared, generation: u64) -> Exit {
    let max_failures = shared.config.max_poll_failures;
    let mut failures = 0u32;

    loop {
        if !keep_watching(shared, generation) {
            return Exit::Superseded;
        }

        match shared.engine.state() {
            Ok(EngineState::Playing) => {
                failures = 0;
                reflect(shared, generation, PlaybackState::Playing);
            }
            Ok(EngineState::Paused) => {
                failures = 0;
                reflect(shared, generation, PlaybackState::Paused);
            }
            Ok(EngineState::Loading) => failures = 0,
            Ok(EngineState::Ended) => return Exit::Ended,
            Ok(EngineState::Error) => {
                tracing::warn!(generation, "engine reported an error");
                return Exit::Failed;
            }
            Err(err) => {
                failures += 1;
                if failures > max_failures {
                    tracing::warn!(generation, error = %err, "engine stopped answering");
                    return Exit::Failed;
                }
                tracing::debug!(generation, failures, error = %err, "state query failed");
            }
        }

        thread::sleep(shared.config.poll_interval());
    }
}

/// Mirror an engine-side state change into the session
fn reflect(shared: &Shared, generation: u64, observed: PlaybackState) {
    let entering_pause = observed == PlaybackState::Paused
        && shared.with_state(|st| st.is_live(generation) && st.playback == PlaybackState::Playing);
    let position = if entering_pause {
        shared
            .engine
            .elapsed_ms()
            .ok()
            .filter(|ms| *ms > 0)
            .map_or(0, |ms| ms as u64)
    } else {
        0
    };

    shared.with_state(|st| {
        if !st.is_live(generation) || st.playback == observed {
            return;
        }
        if entering_pause && st.paused_position_ms == 0 {
            st.paused_position_ms = position;
        }
        if st.playback == PlaybackState::Paused && observed == PlaybackState::Playing {
            st.paused_position_ms = 0;
        }
        tracing::debug!(generation, from = ?st.playback, to = ?observed, "engine changed state");
        st.playback = observed;
    });
}

/// Settle the session after a monitor exits and fire the callback on a natural end
fn finish(shared: &Shared, generation: u64, exit: Exit) {
    if exit == Exit::Superseded {
        return;
    }

    let natural = {
        // Held across the cleanup stop so no newer attempt loads in between
        let _attempt = shared.attempt_lock.lock();
        let settled = shared.with_state(|st| {
            if !st.is_current(generation) {
                return None;
            }
            if st.stop_requested {
                // Paused as the engine went away: resume has to restart the stream
                if st.monitor_generation == Some(generation) {
                    st.monitor_generation = None;
                }
                st.engine_loaded = false;
                return None;
            }
            st.playback = PlaybackState::Stopped;
            st.paused_position_ms = 0;
            st.engine_loaded = false;
            st.monitor_generation = None;
            Some(exit == Exit::Ended)
        });

        match settled {
            Some(natural) => {
                if let Err(err) = shared.engine.stop() {
                    tracing::debug!(error = %err, "engine cleanup failed");
                }
                natural
            }
            None => false,
        }
    };

    if !natural {
        return;
    }

    tracing::info!(generation, "track finished");
    let callback = shared.on_finished.lock().clone();
    if let Some(callback) = callback {
        callback();
    }
}
