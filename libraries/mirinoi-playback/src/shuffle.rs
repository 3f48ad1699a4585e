//! Shuffle algorithms for queue randomization
//!
//! Implements both pure random (Fisher-Yates) and smart shuffle algorithms

use crate::types::ShuffleMode;
use mirinoi_core::Track;
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::collections::HashMap;

/// Shuffle a slice of tracks with the given algorithm
pub fn shuffle_tracks(tracks: &mut [Track], mode: ShuffleMode) {
    match mode {
        ShuffleMode::Off => {}
        ShuffleMode::Random => shuffle_random(tracks),
        ShuffleMode::Smart => shuffle_smart(tracks),
    }
}

/// Pure random shuffle using Fisher-Yates algorithm
///
/// Every permutation is equally likely.
fn shuffle_random(tracks: &mut [Track]) {
    tracks.shuffle(&mut thread_rng());
}

/// Smart shuffle: round-robin over artists so the same artist rarely
/// plays back-to-back
///
/// 1. Group tracks by artist (missing artists share one group)
/// 2. Randomize within each group and randomize group order
/// 3. Interleave groups
fn shuffle_smart(tracks: &mut [Track]) {
    if tracks.len() <= 2 {
        shuffle_random(tracks);
        return;
    }

    let mut rng = thread_rng();

    let mut by_artist: HashMap<&str, Vec<Track>> = HashMap::new();
    for track in tracks.iter() {
        by_artist
            .entry(track.artist_or_default())
            .or_default()
            .push(track.clone());
    }

    let mut groups: Vec<Vec<Track>> = by_artist.into_values().collect();
    for group in &mut groups {
        group.shuffle(&mut rng);
    }
    groups.shuffle(&mut rng);

    let mut result = Vec::with_capacity(tracks.len());
    let longest = groups.iter().map(Vec::len).max().unwrap_or(0);
    for round in 0..longest {
        for group in &groups {
            if let Some(track) = group.get(round) {
                result.push(track.clone());
            }
        }
    }

    for (slot, track) in tracks.iter_mut().zip(result) {
        *slot = track;
    }
}
