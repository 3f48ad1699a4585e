mod engine_state;
mod track;

pub use engine_state::EngineState;
pub use track::{Track, UNKNOWN_ARTIST};
