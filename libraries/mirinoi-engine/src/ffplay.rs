//! ffplay engine: one process per play
//!
//! ffplay has no control channel, so every transport change maps onto the
//! process lifecycle:
//! - play spawns `ffplay -nodisp -autoexit` (with `-ss` when resuming)
//! - pause kills the process and remembers the position
//! - seek and volume changes respawn at the current position
//!
//! The position is estimated from the spawn time; the duration comes from a
//! background `ffprobe` run per load.
//!
//! ffplay exits with status 0 even when it cannot open or decode its input,
//! so a clean exit only counts as the end of the stream when the run got
//! close enough to the probed duration.

use crate::error::{EngineError, Result};
use crate::process::{run_capture, spawn_quiet, terminate};
use mirinoi_core::{Engine, EngineState};
use parking_lot::Mutex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Child;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Program locations for the ffplay engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfplayConfig {
    pub ffplay_path: PathBuf,
    pub ffprobe_path: PathBuf,
}

impl Default for FfplayConfig {
    fn default() -> Self {
        Self {
            ffplay_path: PathBuf::from("ffplay"),
            ffprobe_path: PathBuf::from("ffprobe"),
        }
    }
}

/// Slack between the estimated position and the probed duration at exit
const END_TOLERANCE_MS: u64 = 3_000;

/// Shortest run accepted as a real play when the duration is unknown
const MIN_RUN_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Ended,
    Failed,
}

#[derive(Debug)]
struct Playback {
    url: Option<String>,
    child: Option<Child>,
    /// Stream offset the running process started from
    offset_ms: u64,
    spawned_at: Option<Instant>,
    paused_at_ms: Option<u64>,
    outcome: Option<Outcome>,
    volume: u8,
    /// Bumped on every load and stop; stale probe results carry an old id
    load_id: u64,
}

impl Playback {
    fn position_ms(&self) -> u64 {
        match (self.child.as_ref(), self.spawned_at) {
            (Some(_), Some(spawned)) => self.offset_ms + spawned.elapsed().as_millis() as u64,
            _ => self.paused_at_ms.unwrap_or(0),
        }
    }

    fn halt(&mut self) {
        if let Some(child) = self.child.take() {
            tracing::debug!(pid = child.id(), "stopping ffplay");
            terminate(child);
        }
        self.spawned_at = None;
    }
}

/// Engine backed by the `ffplay` command-line player
pub struct FfplayEngine {
    config: FfplayConfig,
    playback: Mutex<Playback>,
    /// `(load_id, duration_ms)` from the latest probe
    probed: Arc<Mutex<(u64, i64)>>,
}

impl FfplayEngine {
    pub fn new(config: FfplayConfig) -> Self {
        Self {
            config,
            playback: Mutex::new(Playback {
                url: None,
                child: None,
                offset_ms: 0,
                spawned_at: None,
                paused_at_ms: None,
                outcome: None,
                volume: 100,
                load_id: 0,
            }),
            probed: Arc::new(Mutex::new((0, 0))),
        }
    }

    fn spawn(&self, pb: &mut Playback, url: &str, offset_ms: u64) -> Result<()> {
        let args = ffplay_args(url, pb.volume, offset_ms);
        let child = spawn_quiet(&self.config.ffplay_path, &args)?;
        tracing::debug!(pid = child.id(), offset_ms, "ffplay started");

        pb.child = Some(child);
        pb.offset_ms = offset_ms;
        pb.spawned_at = Some(Instant::now());
        pb.outcome = None;
        Ok(())
    }

    /// Kill the running process and start again at the current position
    fn respawn(&self, pb: &mut Playback, position_ms: u64) -> Result<()> {
        let url = pb.url.clone().ok_or(EngineError::NotLoaded)?;
        pb.halt();
        self.spawn(pb, &url, position_ms)
    }

    fn start_probe(&self, url: String, load_id: u64) {
        let ffprobe = self.config.ffprobe_path.clone();
        let probed = Arc::clone(&self.probed);

        let spawned = thread::Builder::new()
            .name("mirinoi-ffprobe".to_string())
            .spawn(move || match probe_duration_ms(&ffprobe, &url) {
                Ok(Some(ms)) => *probed.lock() = (load_id, ms),
                Ok(None) => tracing::debug!("ffprobe reported no duration"),
                Err(err) => tracing::debug!(error = %err, "duration probe failed"),
            });
        if let Err(err) = spawned {
            tracing::debug!(error = %err, "could not start duration probe");
        }
    }
}

impl Default for FfplayEngine {
    fn default() -> Self {
        Self::new(FfplayConfig::default())
    }
}

impl Engine for FfplayEngine {
    fn load(&self, url: &str) -> mirinoi_core::Result<()> {
        let mut pb = self.playback.lock();
        pb.halt();
        pb.url = Some(url.to_string());
        pb.offset_ms = 0;
        pb.paused_at_ms = None;
        pb.outcome = None;
        pb.load_id += 1;

        self.start_probe(url.to_string(), pb.load_id);
        Ok(())
    }

    fn play(&self) -> mirinoi_core::Result<()> {
        let mut pb = self.playback.lock();
        let url = pb.url.clone().ok_or(EngineError::NotLoaded)?;
        if pb.child.is_some() {
            return Ok(());
        }

        let offset = pb.paused_at_ms.unwrap_or(0);
        self.spawn(&mut pb, &url, offset)?;
        pb.paused_at_ms = None;
        Ok(())
    }

    fn pause(&self) -> mirinoi_core::Result<()> {
        let mut pb = self.playback.lock();
        if pb.url.is_none() {
            return Err(EngineError::NotLoaded.into());
        }
        if pb.child.is_some() {
            let position = pb.position_ms();
            pb.halt();
            pb.paused_at_ms = Some(position);
        }
        Ok(())
    }

    fn stop(&self) -> mirinoi_core::Result<()> {
        let mut pb = self.playback.lock();
        pb.halt();
        pb.url = None;
        pb.paused_at_ms = None;
        pb.outcome = None;
        pb.load_id += 1;
        Ok(())
    }

    fn seek(&self, position_ms: u64) -> mirinoi_core::Result<()> {
        let mut pb = self.playback.lock();
        if pb.url.is_none() {
            return Err(EngineError::NotLoaded.into());
        }

        if pb.child.is_some() {
            self.respawn(&mut pb, position_ms)?;
        } else {
            pb.paused_at_ms = Some(position_ms);
        }
        Ok(())
    }

    fn elapsed_ms(&self) -> mirinoi_core::Result<i64> {
        let pb = self.playback.lock();
        if pb.url.is_none() {
            return Err(EngineError::NotLoaded.into());
        }

        let mut position = pb.position_ms() as i64;
        let (load_id, duration) = *self.probed.lock();
        if load_id == pb.load_id && duration > 0 {
            position = position.min(duration);
        }
        Ok(position)
    }

    fn duration_ms(&self) -> mirinoi_core::Result<i64> {
        let pb = self.playback.lock();
        let (load_id, duration) = *self.probed.lock();
        Ok(if load_id == pb.load_id { duration } else { 0 })
    }

    fn state(&self) -> mirinoi_core::Result<EngineState> {
        let mut pb = self.playback.lock();
        if pb.url.is_none() {
            return Ok(EngineState::Ended);
        }

        if let Some(child) = pb.child.as_mut() {
            let Some(status) = child.try_wait().map_err(EngineError::from)? else {
                return Ok(EngineState::Playing);
            };

            let position_ms = pb.position_ms();
            let run_ms = pb
                .spawned_at
                .map_or(0, |spawned| spawned.elapsed().as_millis() as u64);
            let (load_id, duration) = *self.probed.lock();
            let duration_ms = if load_id == pb.load_id {
                duration.max(0) as u64
            } else {
                0
            };

            pb.child = None;
            pb.spawned_at = None;
            pb.outcome = Some(if !status.success() {
                tracing::debug!(%status, "ffplay failed");
                Outcome::Failed
            } else if reached_end(position_ms, run_ms, duration_ms) {
                tracing::debug!(position_ms, "ffplay reached the end of the stream");
                Outcome::Ended
            } else {
                tracing::warn!(
                    position_ms,
                    duration_ms,
                    "ffplay exited before the end of the stream"
                );
                Outcome::Failed
            });
        }

        Ok(match (pb.outcome, pb.paused_at_ms) {
            (Some(Outcome::Ended), _) => EngineState::Ended,
            (Some(Outcome::Failed), _) => EngineState::Error,
            (None, Some(_)) => EngineState::Paused,
            (None, None) => EngineState::Loading,
        })
    }

    fn set_volume(&self, volume: u8) -> mirinoi_core::Result<()> {
        let mut pb = self.playback.lock();
        let volume = volume.min(100);
        if pb.volume == volume {
            return Ok(());
        }
        pb.volume = volume;

        // ffplay reads the volume only at startup
        if pb.child.is_some() {
            let position = pb.position_ms();
            self.respawn(&mut pb, position)?;
        }
        Ok(())
    }

    fn volume(&self) -> mirinoi_core::Result<i64> {
        Ok(i64::from(self.playback.lock().volume))
    }
}

impl Drop for FfplayEngine {
    fn drop(&mut self) {
        self.playback.lock().halt();
    }
}

/// Whether a clean ffplay exit means the stream played out
///
/// With a known duration the estimated position must be within
/// `END_TOLERANCE_MS` of it; without one the run must have lasted
/// `MIN_RUN_MS`.
pub fn reached_end(position_ms: u64, run_ms: u64, duration_ms: u64) -> bool {
    if duration_ms > 0 {
        position_ms + END_TOLERANCE_MS >= duration_ms
    } else {
        run_ms >= MIN_RUN_MS
    }
}

/// Command line for one ffplay run
pub fn ffplay_args(url: &str, volume: u8, offset_ms: u64) -> Vec<String> {
    let mut args: Vec<String> = ["-nodisp", "-autoexit", "-loglevel", "quiet", "-volume"]
        .iter()
        .map(ToString::to_string)
        .collect();
    args.push(volume.min(100).to_string());

    if offset_ms > 0 {
        args.push("-ss".to_string());
        args.push(format!("{}.{:03}", offset_ms / 1000, offset_ms % 1000));
    }

    args.push(url.to_string());
    args
}

/// Run ffprobe and read the container duration
pub fn probe_duration_ms(ffprobe: &Path, url: &str) -> Result<Option<i64>> {
    let stdout = run_capture(
        ffprobe,
        &["-v", "quiet", "-print_format", "json", "-show_format", url],
    )?;
    parse_probe_duration(&stdout)
}

/// Duration in milliseconds from `ffprobe -show_format` JSON
pub fn parse_probe_duration(json: &str) -> Result<Option<i64>> {
    let probe: Value = serde_json::from_str(json)?;

    let seconds = probe
        .get("format")
        .and_then(|f| f.get("duration"))
        .and_then(|d| match d {
            Value::String(s) => s.parse::<f64>().ok(),
            other => other.as_f64(),
        })
        .filter(|secs| secs.is_finite() && *secs > 0.0);

    Ok(seconds.map(|secs| (secs * 1000.0).round() as i64))
}
