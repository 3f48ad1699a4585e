//! yt-dlp integration
//!
//! - `YtDlpResolver`: video page URL → direct audio stream URL
//! - `YtDlp::playlist_tracks` / `YtDlp::search_first`: flat metadata
//!   extraction into `Track`s

use crate::error::{EngineError, Result};
use crate::process::run_capture;
use mirinoi_core::{MirinoiError, StreamResolver, Track};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Where extracted tracks point
const WATCH_URL: &str = "https://music.youtube.com/watch?v=";

/// Thin wrapper around the yt-dlp executable
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Best audio stream URL for a video page
    pub fn stream_url(&self, source_url: &str) -> Result<String> {
        let stdout = run_capture(
            &self.program,
            &["-f", "bestaudio", "-g", "--no-playlist", "--", source_url],
        )?;
        first_line(&stdout).ok_or_else(|| EngineError::output(&self.program, "no stream URL printed"))
    }

    /// Tracks of a playlist (entries without a title or id are skipped)
    pub fn playlist_tracks(&self, playlist_url: &str) -> Result<Vec<Track>> {
        let stdout = run_capture(
            &self.program,
            &["-J", "--flat-playlist", "--", playlist_url],
        )?;
        let tracks = parse_playlist(&stdout)?;
        tracing::debug!(count = tracks.len(), url = %playlist_url, "playlist extracted");
        Ok(tracks)
    }

    /// First search hit for `query`
    pub fn search_first(&self, query: &str) -> Result<Option<Track>> {
        let search = format!("ytsearch1:{query}");
        let stdout = run_capture(&self.program, &["-J", "--flat-playlist", &search])?;
        Ok(parse_playlist(&stdout)?.into_iter().next())
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

/// Resolve source URLs with `yt-dlp -f bestaudio -g`
#[derive(Debug, Clone, Default)]
pub struct YtDlpResolver {
    ytdlp: YtDlp,
}

impl YtDlpResolver {
    pub fn new(ytdlp: YtDlp) -> Self {
        Self { ytdlp }
    }
}

impl StreamResolver for YtDlpResolver {
    fn resolve(&self, source_url: &str) -> mirinoi_core::Result<String> {
        match self.ytdlp.stream_url(source_url) {
            Ok(url) => {
                tracing::debug!(source = %source_url, "resolved stream");
                Ok(url)
            }
            Err(err @ EngineError::ToolMissing { .. }) => Err(err.into()),
            Err(err) => Err(MirinoiError::resolution(err.to_string())),
        }
    }
}

fn first_line(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Parse `yt-dlp -J --flat-playlist` output
///
/// Accepts both playlist documents (with `entries`) and single videos.
pub fn parse_playlist(json: &str) -> Result<Vec<Track>> {
    let info: Value = serde_json::from_str(json)?;

    let tracks = match info.get("entries").and_then(Value::as_array) {
        Some(entries) => entries.iter().filter_map(track_from_entry).collect(),
        None => track_from_entry(&info).into_iter().collect(),
    };
    Ok(tracks)
}

/// Build a track from one extracted entry
pub fn track_from_entry(entry: &Value) -> Option<Track> {
    let text = |key: &str| {
        entry
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    let title = text("title")?;
    let id = text("id")?;
    let artist = ["artist", "uploader", "channel"]
        .into_iter()
        .find_map(text);

    Some(Track {
        title: title.to_string(),
        artist: artist.map(str::to_string),
        url: format!("{WATCH_URL}{id}"),
    })
}
