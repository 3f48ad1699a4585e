//! Shared fakes for session and controller tests

#![allow(dead_code)]

use mirinoi_core::{Engine, EngineState, MirinoiError, Result, StreamResolver};
use mirinoi_playback::PlaybackConfig;
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// ===== Mock Engine =====

#[derive(Debug)]
pub struct EngineScript {
    pub loaded: Option<String>,
    pub state: EngineState,
    pub elapsed: i64,
    /// `None` makes duration queries fail
    pub duration: Option<i64>,
    /// `None` makes volume queries fail
    pub reported_volume: Option<i64>,
    pub fail_state_queries: bool,
    /// `play()` moves a loaded stream straight to Playing
    pub start_on_play: bool,
    pub resumable: bool,
    /// How long `load()` takes, outside the script lock
    pub load_delay: Duration,
    pub loads: Vec<String>,
    pub seeks: Vec<u64>,
    pub volumes: Vec<u8>,
    pub calls: Vec<&'static str>,
}

/// Engine fake whose reported state is scripted by the test
pub struct MockEngine {
    script: Mutex<EngineScript>,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(EngineScript {
                loaded: None,
                state: EngineState::Ended,
                elapsed: 0,
                duration: None,
                reported_volume: None,
                fail_state_queries: false,
                start_on_play: true,
                resumable: true,
                load_delay: Duration::ZERO,
                loads: Vec::new(),
                seeks: Vec::new(),
                volumes: Vec::new(),
                calls: Vec::new(),
            }),
        })
    }

    pub fn script<R>(&self, f: impl FnOnce(&mut EngineScript) -> R) -> R {
        f(&mut self.script.lock())
    }

    /// Stream reaches its end
    pub fn finish(&self) {
        self.script(|s| s.state = EngineState::Ended);
    }

    /// Engine crashes
    pub fn fail(&self) {
        self.script(|s| s.state = EngineState::Error);
    }

    pub fn loads(&self) -> Vec<String> {
        self.script(|s| s.loads.clone())
    }

    pub fn seeks(&self) -> Vec<u64> {
        self.script(|s| s.seeks.clone())
    }

    pub fn last_volume(&self) -> Option<u8> {
        self.script(|s| s.volumes.last().copied())
    }

    pub fn called(&self, call: &str) -> bool {
        self.script(|s| s.calls.iter().any(|c| *c == call))
    }

    /// Engine rendering `url` right now
    pub fn is_playing(&self, url: &str) -> bool {
        self.script(|s| s.loaded.as_deref() == Some(url) && s.state == EngineState::Playing)
    }
}

fn not_loaded() -> MirinoiError {
    MirinoiError::NotLoaded
}

impl Engine for MockEngine {
    fn load(&self, url: &str) -> Result<()> {
        let delay = self.script(|s| {
            s.calls.push("load");
            s.load_delay
        });
        thread::sleep(delay);

        self.script(|s| {
            s.loads.push(url.to_string());
            s.loaded = Some(url.to_string());
            s.state = EngineState::Loading;
            s.elapsed = 0;
        });
        Ok(())
    }

    fn play(&self) -> Result<()> {
        self.script(|s| {
            s.calls.push("play");
            if s.loaded.is_none() {
                return Err(not_loaded());
            }
            if s.start_on_play || s.state == EngineState::Paused {
                s.state = EngineState::Playing;
            }
            Ok(())
        })
    }

    fn pause(&self) -> Result<()> {
        self.script(|s| {
            s.calls.push("pause");
            if s.loaded.is_none() {
                return Err(not_loaded());
            }
            s.state = EngineState::Paused;
            Ok(())
        })
    }

    fn stop(&self) -> Result<()> {
        self.script(|s| {
            s.calls.push("stop");
            s.loaded = None;
            s.state = EngineState::Ended;
        });
        Ok(())
    }

    fn seek(&self, position_ms: u64) -> Result<()> {
        self.script(|s| {
            s.calls.push("seek");
            if s.loaded.is_none() {
                return Err(not_loaded());
            }
            s.seeks.push(position_ms);
            s.elapsed = position_ms as i64;
            Ok(())
        })
    }

    fn elapsed_ms(&self) -> Result<i64> {
        self.script(|s| s.loaded.as_ref().map(|_| s.elapsed).ok_or_else(not_loaded))
    }

    fn duration_ms(&self) -> Result<i64> {
        self.script(|s| {
            s.duration
                .ok_or_else(|| MirinoiError::engine("duration unavailable"))
        })
    }

    fn state(&self) -> Result<EngineState> {
        self.script(|s| {
            if s.fail_state_queries {
                Err(MirinoiError::engine("engine not answering"))
            } else {
                Ok(s.state)
            }
        })
    }

    fn set_volume(&self, volume: u8) -> Result<()> {
        self.script(|s| s.volumes.push(volume));
        Ok(())
    }

    fn volume(&self) -> Result<i64> {
        self.script(|s| {
            s.reported_volume
                .ok_or_else(|| MirinoiError::engine("engine unreachable"))
        })
    }

    fn is_resumable(&self) -> bool {
        self.script(|s| s.resumable)
    }
}

// ===== Gated Resolver =====

/// Resolver that returns the source unchanged, unless the test blocks or
/// fails a URL
pub struct GatedResolver {
    blocked: Mutex<HashSet<String>>,
    failing: Mutex<HashSet<String>>,
    released: Condvar,
}

impl GatedResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            blocked: Mutex::new(HashSet::new()),
            failing: Mutex::new(HashSet::new()),
            released: Condvar::new(),
        })
    }

    /// Hold resolutions of `url` until `release`
    pub fn block(&self, url: &str) {
        self.blocked.lock().insert(url.to_string());
    }

    pub fn release(&self, url: &str) {
        self.blocked.lock().remove(url);
        self.released.notify_all();
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().insert(url.to_string());
    }
}

impl StreamResolver for GatedResolver {
    fn resolve(&self, source_url: &str) -> Result<String> {
        let mut blocked = self.blocked.lock();
        while blocked.contains(source_url) {
            self.released.wait(&mut blocked);
        }
        drop(blocked);

        if self.failing.lock().contains(source_url) {
            return Err(MirinoiError::resolution(format!("no audio for {source_url}")));
        }
        Ok(source_url.to_string())
    }
}

// ===== Helpers =====

/// Fast timings so tests finish quickly
pub fn test_config() -> PlaybackConfig {
    PlaybackConfig {
        poll_interval_ms: 5,
        startup_timeout_ms: 300,
        resume_grace_ms: 0,
        ..PlaybackConfig::default()
    }
}

/// Poll `condition` until it holds or two seconds pass
pub fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// Give background threads time to do something they should not
pub fn settle() {
    thread::sleep(Duration::from_millis(60));
}

/// Counts callback invocations
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
