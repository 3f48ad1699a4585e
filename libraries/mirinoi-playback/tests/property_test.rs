//! Property-based tests for the queue
//!
//! Uses proptest to verify navigation and shuffle invariants across many
//! random queues.

use mirinoi_core::Track;
use mirinoi_playback::{QueueManager, ShuffleMode};
use proptest::prelude::*;

// ===== Helpers =====

fn arbitrary_track() -> impl Strategy<Value = Track> {
    (
        "[A-Za-z ]{1,20}",                       // title
        proptest::option::of("[A-Za-z ]{1,12}"), // artist
        "[a-zA-Z0-9_-]{11}",                     // video id
    )
        .prop_map(|(title, artist, id)| Track {
            title,
            artist,
            url: format!("https://music.youtube.com/watch?v={id}"),
        })
}

fn arbitrary_tracks() -> impl Strategy<Value = Vec<Track>> {
    prop::collection::vec(arbitrary_track(), 1..40)
}

fn arbitrary_mode() -> impl Strategy<Value = ShuffleMode> {
    prop_oneof![Just(ShuffleMode::Random), Just(ShuffleMode::Smart)]
}

fn sorted(tracks: &[Track]) -> Vec<Track> {
    let mut tracks = tracks.to_vec();
    tracks.sort_by(|a, b| (&a.url, &a.title).cmp(&(&b.url, &b.title)));
    tracks
}

// ===== Property Tests =====

proptest! {
    /// Property: `len` calls to next() come back to the starting track
    #[test]
    fn next_len_times_is_identity(tracks in arbitrary_tracks(), start in 0usize..40) {
        let mut queue = QueueManager::new();
        queue.set_queue(&tracks);
        let start = start % tracks.len();
        queue.select(start).unwrap();

        for _ in 0..tracks.len() {
            prop_assert!(queue.next().is_some());
        }

        prop_assert_eq!(queue.current_index(), start);
    }

    /// Property: prev() undoes next()
    #[test]
    fn prev_undoes_next(tracks in arbitrary_tracks(), steps in 1usize..100) {
        let mut queue = QueueManager::new();
        queue.set_queue(&tracks);

        for _ in 0..steps {
            queue.next();
        }
        for _ in 0..steps {
            queue.prev();
        }

        prop_assert_eq!(queue.current_index(), 0);
    }

    /// Property: cursor stays in range through any navigation
    #[test]
    fn cursor_stays_in_range(
        tracks in arbitrary_tracks(),
        moves in prop::collection::vec(any::<bool>(), 0..100)
    ) {
        let mut queue = QueueManager::new();
        queue.set_queue(&tracks);

        for forward in moves {
            if forward { queue.next(); } else { queue.prev(); }
            prop_assert!(queue.current_index() < queue.len());
        }
    }

    /// Property: shuffle keeps the same tracks and the current track
    #[test]
    fn shuffle_preserves_tracks_and_anchor(
        tracks in arbitrary_tracks(),
        start in 0usize..40,
        mode in arbitrary_mode()
    ) {
        let mut queue = QueueManager::new();
        queue.set_queue(&tracks);
        queue.select(start % tracks.len()).unwrap();
        let anchor = queue.current().cloned();

        queue.shuffle_with(mode);

        prop_assert_eq!(sorted(queue.tracks()), sorted(&tracks));
        prop_assert_eq!(queue.current().cloned(), anchor);
    }

    /// Property: shuffle then unshuffle restores order and current track
    #[test]
    fn unshuffle_restores_order(tracks in arbitrary_tracks(), start in 0usize..40) {
        let mut queue = QueueManager::new();
        queue.set_queue(&tracks);
        queue.select(start % tracks.len()).unwrap();
        let anchor = queue.current().cloned();

        queue.shuffle();
        queue.unshuffle();

        prop_assert_eq!(queue.tracks(), tracks.as_slice());
        prop_assert_eq!(queue.current().cloned(), anchor);
    }
}
