//! mpv engine driven over its JSON IPC socket
//!
//! Each load spawns `mpv --pause --input-ipc-server=SOCK URL`. The socket
//! appears a moment after the process starts, so commands issued before it
//! is reachable (play, volume) are remembered and applied on connect.

use crate::error::{EngineError, Result};
use crate::process::{spawn_quiet, terminate};
use mirinoi_core::{Engine, EngineState};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::Child;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

const READ_TIMEOUT: Duration = Duration::from_millis(100);
const REPLY_TIMEOUT: Duration = Duration::from_millis(500);

/// mpv's reply when a property has no value yet (nothing decoded)
const PROPERTY_UNAVAILABLE: &str = "property unavailable";

/// Settings for the mpv engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpvConfig {
    pub mpv_path: PathBuf,
    /// Directory for IPC sockets
    pub socket_dir: PathBuf,
}

impl Default for MpvConfig {
    fn default() -> Self {
        Self {
            mpv_path: PathBuf::from("mpv"),
            socket_dir: std::env::temp_dir(),
        }
    }
}

// ===== IPC =====

/// One JSON IPC connection
struct Ipc {
    reader: BufReader<UnixStream>,
    writer: UnixStream,
    next_request_id: u64,
}

impl Ipc {
    fn connect(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path)?;
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        stream.set_write_timeout(Some(READ_TIMEOUT))?;
        let writer = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(stream),
            writer,
            next_request_id: 1,
        })
    }

    /// Send a command and wait for the reply carrying its request id
    ///
    /// Event lines and replies to abandoned requests are skipped.
    fn request(&mut self, command: &Value) -> Result<Value> {
        let id = self.next_request_id;
        self.next_request_id += 1;
        self.writer
            .write_all(encode_command(command, id).as_bytes())?;

        let deadline = Instant::now() + REPLY_TIMEOUT;
        let mut line = String::new();
        loop {
            match self.reader.read_line(&mut line) {
                Ok(0) => return Err(EngineError::ipc("mpv closed the socket")),
                Ok(_) => {
                    if let Some(reply) = parse_reply(&line, id) {
                        return reply;
                    }
                    line.clear();
                }
                Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(err) => return Err(err.into()),
            }

            if Instant::now() >= deadline {
                return Err(EngineError::ipc(format!("no reply to request {id}")));
            }
        }
    }

    fn get_property(&mut self, name: &str) -> Result<Value> {
        self.request(&json!(["get_property", name]))
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<()> {
        self.request(&json!(["set_property", name, value])).map(|_| ())
    }

    /// Numeric property in milliseconds; 0 while mpv has no value yet
    fn millis(&mut self, name: &str) -> Result<i64> {
        match self.get_property(name) {
            Ok(value) => Ok(value
                .as_f64()
                .map_or(0, |secs| (secs * 1000.0).round() as i64)),
            Err(err) if is_unavailable(&err) => Ok(0),
            Err(err) => Err(err),
        }
    }
}

/// Serialize one IPC command line
pub fn encode_command(command: &Value, request_id: u64) -> String {
    format!("{}\n", json!({ "command": command, "request_id": request_id }))
}

/// Interpret one line from the socket
///
/// Returns `None` for events and replies to other requests.
pub fn parse_reply(line: &str, request_id: u64) -> Option<Result<Value>> {
    let value: Value = serde_json::from_str(line.trim()).ok()?;
    if value.get("request_id").and_then(Value::as_u64) != Some(request_id) {
        return None;
    }

    Some(match value.get("error").and_then(Value::as_str) {
        Some("success") => Ok(value.get("data").cloned().unwrap_or(Value::Null)),
        Some(error) => Err(EngineError::ipc(error)),
        None => Err(EngineError::ipc("reply without status")),
    })
}

fn is_unavailable(err: &EngineError) -> bool {
    matches!(err, EngineError::Ipc(msg) if msg == PROPERTY_UNAVAILABLE)
}

/// Command line for one mpv instance (starts paused)
pub fn mpv_args(url: &str, socket: &Path, volume: u8) -> Vec<String> {
    vec![
        "--no-video".to_string(),
        "--no-terminal".to_string(),
        "--pause".to_string(),
        format!("--volume={}", volume.min(100)),
        format!("--input-ipc-server={}", socket.display()),
        "--".to_string(),
        url.to_string(),
    ]
}

// ===== Engine =====

struct Instance {
    child: Option<Child>,
    socket: PathBuf,
    ipc: Option<Ipc>,
    want_paused: bool,
    /// Exit status success, once the process is gone
    exited: Option<bool>,
}

impl Instance {
    /// Connection to mpv, establishing it (and replaying deferred commands)
    /// on first use
    fn ipc(&mut self, volume: u8) -> Option<&mut Ipc> {
        if self.ipc.is_none() {
            match Ipc::connect(&self.socket) {
                Ok(mut ipc) => {
                    let replay = ipc
                        .set_property("pause", json!(self.want_paused))
                        .and_then(|()| ipc.set_property("volume", json!(volume)));
                    if let Err(err) = replay {
                        tracing::debug!(error = %err, "replaying deferred commands failed");
                    }
                    tracing::debug!(socket = %self.socket.display(), "connected to mpv");
                    self.ipc = Some(ipc);
                }
                Err(err) => {
                    tracing::trace!(error = %err, "mpv socket not ready");
                    return None;
                }
            }
        }
        self.ipc.as_mut()
    }

    fn shutdown(mut self) {
        if let Some(ipc) = self.ipc.as_mut() {
            if let Err(err) = ipc.request(&json!(["quit"])) {
                tracing::debug!(error = %err, "mpv quit request failed");
            }
        }
        if let Some(child) = self.child.take() {
            terminate(child);
        }
        if let Err(err) = std::fs::remove_file(&self.socket) {
            if err.kind() != ErrorKind::NotFound {
                tracing::debug!(error = %err, "could not remove mpv socket");
            }
        }
    }
}

struct MpvState {
    instance: Option<Instance>,
    volume: u8,
}

/// Engine backed by an mpv process per track
pub struct MpvEngine {
    config: MpvConfig,
    state: Mutex<MpvState>,
    sockets: AtomicU64,
}

impl MpvEngine {
    pub fn new(config: MpvConfig) -> Self {
        Self {
            config,
            state: Mutex::new(MpvState {
                instance: None,
                volume: 100,
            }),
            sockets: AtomicU64::new(0),
        }
    }

    fn socket_path(&self) -> PathBuf {
        let n = self.sockets.fetch_add(1, Ordering::Relaxed);
        self.config
            .socket_dir
            .join(format!("mirinoi-mpv-{}-{n}.sock", std::process::id()))
    }
}

impl Default for MpvEngine {
    fn default() -> Self {
        Self::new(MpvConfig::default())
    }
}

impl Engine for MpvEngine {
    fn load(&self, url: &str) -> mirinoi_core::Result<()> {
        let mut st = self.state.lock();
        if let Some(previous) = st.instance.take() {
            previous.shutdown();
        }

        let socket = self.socket_path();
        let child = spawn_quiet(&self.config.mpv_path, &mpv_args(url, &socket, st.volume))?;
        tracing::debug!(pid = child.id(), "mpv started");

        st.instance = Some(Instance {
            child: Some(child),
            socket,
            ipc: None,
            want_paused: true,
            exited: None,
        });
        Ok(())
    }

    fn play(&self) -> mirinoi_core::Result<()> {
        let mut st = self.state.lock();
        let volume = st.volume;
        let instance = st.instance.as_mut().ok_or(EngineError::NotLoaded)?;
        instance.want_paused = false;
        if let Some(ipc) = instance.ipc(volume) {
            ipc.set_property("pause", json!(false))?;
        }
        Ok(())
    }

    fn pause(&self) -> mirinoi_core::Result<()> {
        let mut st = self.state.lock();
        let volume = st.volume;
        let instance = st.instance.as_mut().ok_or(EngineError::NotLoaded)?;
        instance.want_paused = true;
        if let Some(ipc) = instance.ipc(volume) {
            ipc.set_property("pause", json!(true))?;
        }
        Ok(())
    }

    fn stop(&self) -> mirinoi_core::Result<()> {
        if let Some(instance) = self.state.lock().instance.take() {
            instance.shutdown();
        }
        Ok(())
    }

    fn seek(&self, position_ms: u64) -> mirinoi_core::Result<()> {
        let mut st = self.state.lock();
        let volume = st.volume;
        let instance = st.instance.as_mut().ok_or(EngineError::NotLoaded)?;
        let ipc = instance
            .ipc(volume)
            .ok_or_else(|| EngineError::ipc("mpv not ready"))?;

        let seconds = position_ms as f64 / 1000.0;
        ipc.request(&json!(["seek", seconds, "absolute"]))?;
        Ok(())
    }

    fn elapsed_ms(&self) -> mirinoi_core::Result<i64> {
        let mut st = self.state.lock();
        let volume = st.volume;
        let instance = st.instance.as_mut().ok_or(EngineError::NotLoaded)?;
        match instance.ipc(volume) {
            Some(ipc) => Ok(ipc.millis("playback-time")?),
            None => Ok(0),
        }
    }

    fn duration_ms(&self) -> mirinoi_core::Result<i64> {
        let mut st = self.state.lock();
        let volume = st.volume;
        let instance = st.instance.as_mut().ok_or(EngineError::NotLoaded)?;
        match instance.ipc(volume) {
            Some(ipc) => Ok(ipc.millis("duration")?),
            None => Ok(0),
        }
    }

    fn state(&self) -> mirinoi_core::Result<EngineState> {
        let mut st = self.state.lock();
        let volume = st.volume;
        let Some(instance) = st.instance.as_mut() else {
            return Ok(EngineState::Ended);
        };

        if let Some(child) = instance.child.as_mut() {
            if let Some(status) = child.try_wait().map_err(EngineError::from)? {
                tracing::debug!(%status, "mpv exited");
                instance.child = None;
                instance.ipc = None;
                instance.exited = Some(status.success());
            }
        }
        match instance.exited {
            Some(true) => return Ok(EngineState::Ended),
            Some(false) => return Ok(EngineState::Error),
            None => {}
        }

        let Some(ipc) = instance.ipc(volume) else {
            return Ok(EngineState::Loading);
        };
        if ipc.get_property("pause")?.as_bool() == Some(true) {
            return Ok(EngineState::Paused);
        }
        match ipc.get_property("playback-time") {
            Ok(_) => Ok(EngineState::Playing),
            Err(err) if is_unavailable(&err) => Ok(EngineState::Loading),
            Err(err) => Err(err.into()),
        }
    }

    fn set_volume(&self, volume: u8) -> mirinoi_core::Result<()> {
        let mut st = self.state.lock();
        let volume = volume.min(100);
        st.volume = volume;
        if let Some(instance) = st.instance.as_mut() {
            if let Some(ipc) = instance.ipc(volume) {
                ipc.set_property("volume", json!(volume))?;
            }
        }
        Ok(())
    }

    fn volume(&self) -> mirinoi_core::Result<i64> {
        let mut st = self.state.lock();
        let volume = st.volume;
        if let Some(ipc) = st.instance.as_mut().and_then(|i| i.ipc(volume)) {
            if let Some(level) = ipc.get_property("volume")?.as_f64() {
                return Ok(level.round() as i64);
            }
        }
        Ok(i64::from(volume))
    }
}

impl Drop for MpvEngine {
    fn drop(&mut self) {
        if let Some(instance) = self.state.lock().instance.take() {
            instance.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::os::unix::net::UnixListener;
    use std::thread;

    #[test]
    fn command_encoding() {
        let line = encode_command(&json!(["get_property", "pause"]), 7);
        assert!(line.ends_with('\n'));
        let value: Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(value["command"], json!(["get_property", "pause"]));
        assert_eq!(value["request_id"], 7);
    }

    #[test]
    fn reply_matching() {
        assert!(parse_reply(r#"{"event":"playback-restart"}"#, 1).is_none());
        assert!(parse_reply(r#"{"error":"success","data":1.5,"request_id":2}"#, 1).is_none());
        assert!(parse_reply("garbage", 1).is_none());

        let ok = parse_reply(r#"{"error":"success","data":1.5,"request_id":1}"#, 1).unwrap();
        assert_eq!(ok.unwrap(), json!(1.5));

        let null = parse_reply(r#"{"error":"success","request_id":3}"#, 3).unwrap();
        assert_eq!(null.unwrap(), Value::Null);

        let err = parse_reply(r#"{"error":"property unavailable","request_id":4}"#, 4).unwrap();
        assert!(is_unavailable(&err.unwrap_err()));
    }

    #[test]
    fn args_start_paused_with_socket() {
        let args = mpv_args("https://cdn/a", Path::new("/tmp/s.sock"), 30);
        assert_eq!(
            args,
            vec![
                "--no-video",
                "--no-terminal",
                "--pause",
                "--volume=30",
                "--input-ipc-server=/tmp/s.sock",
                "--",
                "https://cdn/a"
            ]
        );
    }

    #[test]
    fn request_skips_events_until_matching_reply() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("mpv.sock");
        let listener = UnixListener::bind(&socket).unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 256];
            let n = stream.read(&mut buf).unwrap();
            let request: Value = serde_json::from_slice(&buf[..n]).unwrap();
            assert_eq!(request["command"], json!(["get_property", "duration"]));

            let id = request["request_id"].as_u64().unwrap();
            let reply = format!(
                "{{\"event\":\"file-loaded\"}}\n{{\"error\":\"success\",\"data\":212.5,\"request_id\":{id}}}\n"
            );
            stream.write_all(reply.as_bytes()).unwrap();
        });

        let mut ipc = Ipc::connect(&socket).unwrap();
        assert_eq!(ipc.millis("duration").unwrap(), 212_500);
        server.join().unwrap();
    }

    #[test]
    fn idle_engine() {
        let engine = MpvEngine::default();
        assert_eq!(engine.state().unwrap(), EngineState::Ended);
        assert!(engine.play().is_err());
        assert!(engine.elapsed_ms().is_err());
        assert!(engine.stop().is_ok());

        engine.set_volume(45).unwrap();
        assert_eq!(engine.volume().unwrap(), 45);
    }

    #[test]
    fn missing_mpv_is_tool_unavailable() {
        let engine = MpvEngine::new(MpvConfig {
            mpv_path: PathBuf::from("mirinoi-no-such-mpv"),
            ..MpvConfig::default()
        });
        let err = engine.load("https://cdn/a").unwrap_err();
        assert!(matches!(err, mirinoi_core::MirinoiError::ToolUnavailable(_)));
    }
}
