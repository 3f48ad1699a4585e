//! Plain-text rendering of player status

use mirinoi_core::Track;
use mirinoi_playback::{PlaybackState, PlayerStatus, ShuffleMode};
use std::fmt::Write;

/// `m:ss`, or `h:mm:ss` past an hour
pub fn format_time(ms: u64) -> String {
    let total = ms / 1000;
    let (hours, minutes, seconds) = (total / 3600, (total / 60) % 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

fn state_label(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Stopped => "stopped",
        PlaybackState::Playing => "playing",
        PlaybackState::Paused => "paused",
    }
}

fn shuffle_label(mode: ShuffleMode) -> &'static str {
    match mode {
        ShuffleMode::Off => "off",
        ShuffleMode::Random => "random",
        ShuffleMode::Smart => "smart",
    }
}

/// One-line summary: `[playing] 2/5 Artist - Title  0:42 / 3:10  vol 20`
pub fn format_status(status: &PlayerStatus) -> String {
    let mut line = format!("[{}]", state_label(status.state));

    match (&status.track, status.index) {
        (Some(track), Some(index)) => {
            let _ = write!(line, " {}/{} {track}", index + 1, status.queue_len);
        }
        _ => line.push_str(" nothing queued"),
    }

    if status.state != PlaybackState::Stopped {
        let _ = write!(line, "  {}", format_time(status.elapsed_ms));
        if status.duration_ms > 0 {
            let _ = write!(line, " / {}", format_time(status.duration_ms));
        }
    }

    if status.muted {
        line.push_str("  muted");
    } else {
        let _ = write!(line, "  vol {}", status.volume);
    }

    if status.shuffle != ShuffleMode::Off {
        let _ = write!(line, "  shuffle {}", shuffle_label(status.shuffle));
    }
    let _ = write!(line, "  repeat {}", status.repeat);

    line
}

/// Numbered queue listing with the current entry marked
pub fn format_queue(tracks: &[Track], current: Option<usize>) -> String {
    if tracks.is_empty() {
        return "queue is empty".to_string();
    }

    let width = tracks.len().to_string().len();
    tracks
        .iter()
        .enumerate()
        .map(|(i, track)| {
            let marker = if Some(i) == current { '>' } else { ' ' };
            format!("{marker} {:>width$}. {track}", i + 1)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
