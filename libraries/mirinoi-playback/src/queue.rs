//! Ordered playback queue
//!
//! Implements a cursor-based queue with:
//! - Wraparound navigation in both directions
//! - Shuffle that keeps the current track current (the "anchor")
//! - Restore of the order the queue was loaded in

use crate::error::{PlaybackError, Result};
use crate::shuffle::shuffle_tracks;
use crate::types::ShuffleMode;
use mirinoi_core::Track;

/// Ordered queue of tracks with a current-position cursor
///
/// Structure:
/// ```text
/// tracks:    [C, A, B]      active order (possibly shuffled)
///                 ^ current_index = 1
/// original:  [A, B, C]      order at load time, never shuffled
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueueManager {
    /// Active playback order
    tracks: Vec<Track>,

    /// Order captured at `set_queue`, used by `unshuffle`
    original: Vec<Track>,

    /// Position in `tracks` (0 when empty)
    current_index: usize,

    /// Whether `tracks` currently differs from load order by a shuffle
    is_shuffled: bool,
}

impl QueueManager {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue and its original-order snapshot
    ///
    /// The cursor moves to the first track. An empty input empties the queue.
    pub fn set_queue(&mut self, tracks: &[Track]) {
        self.tracks = tracks.to_vec();
        self.original = tracks.to_vec();
        self.current_index = 0;
        self.is_shuffled = false;
    }

    /// Track under the cursor
    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.current_index)
    }

    /// Advance the cursor, wrapping to the first track after the last
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        self.current_index = (self.current_index + 1) % self.tracks.len();
        self.current()
    }

    /// Move the cursor back, wrapping to the last track before the first
    pub fn prev(&mut self) -> Option<&Track> {
        if self.tracks.is_empty() {
            return None;
        }
        let len = self.tracks.len();
        self.current_index = (self.current_index + len - 1) % len;
        self.current()
    }

    /// Uniformly shuffle the queue, keeping the current track current
    pub fn shuffle(&mut self) {
        self.shuffle_with(ShuffleMode::Random);
    }

    /// Shuffle with a specific algorithm, keeping the current track current
    pub fn shuffle_with(&mut self, mode: ShuffleMode) {
        if self.tracks.is_empty() || mode == ShuffleMode::Off {
            return;
        }

        let anchor = self.current().cloned();
        shuffle_tracks(&mut self.tracks, mode);
        self.is_shuffled = true;
        self.relocate(anchor.as_ref());
    }

    /// Restore the order the queue was loaded in, keeping the current track current
    pub fn unshuffle(&mut self) {
        if self.original.is_empty() {
            return;
        }

        let anchor = self.current().cloned();
        self.tracks.clone_from(&self.original);
        self.is_shuffled = false;
        self.relocate(anchor.as_ref());
    }

    /// Empty the queue and its snapshot
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.original.clear();
        self.current_index = 0;
        self.is_shuffled = false;
    }

    /// Move the cursor to `index`
    pub fn select(&mut self, index: usize) -> Result<&Track> {
        if self.tracks.is_empty() {
            return Err(PlaybackError::QueueEmpty);
        }
        if index >= self.tracks.len() {
            return Err(PlaybackError::IndexOutOfBounds {
                index,
                len: self.tracks.len(),
            });
        }
        self.current_index = index;
        Ok(&self.tracks[index])
    }

    /// Current cursor position
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Tracks in active order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the queue has no tracks
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Whether the cursor sits on the last track
    pub fn is_last(&self) -> bool {
        !self.tracks.is_empty() && self.current_index == self.tracks.len() - 1
    }

    /// Whether the active order comes from a shuffle
    pub fn is_shuffled(&self) -> bool {
        self.is_shuffled
    }

    /// Point the cursor at the first track equal to `anchor`, or at 0
    fn relocate(&mut self, anchor: Option<&Track>) {
        self.current_index = anchor
            .and_then(|anchor| self.tracks.iter().position(|t| t == anchor))
            .unwrap_or(0);
    }
}
