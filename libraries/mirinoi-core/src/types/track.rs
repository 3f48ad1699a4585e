/// Track type: the unit of a playback queue
use serde::{Deserialize, Serialize};

/// Display name used when a track has no artist
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// A playable track reference
///
/// Tracks have no identity beyond their value: two tracks with the same
/// title, artist and URL are the same track as far as queue lookups go.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    /// Track title
    pub title: String,

    /// Artist name, if known
    #[serde(default)]
    pub artist: Option<String>,

    /// Source URL (a video page, resolved to a stream at play time)
    pub url: String,
}

impl Track {
    /// Create a track without artist information
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: None,
            url: url.into(),
        }
    }

    /// Create a track with an artist
    pub fn with_artist(
        title: impl Into<String>,
        artist: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: Some(artist.into()),
            url: url.into(),
        }
    }

    /// Artist name, or "Unknown Artist" when absent
    pub fn artist_or_default(&self) -> &str {
        self.artist.as_deref().unwrap_or(UNKNOWN_ARTIST)
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.artist_or_default(), self.title)
    }
}
