//! Mirinoi Player Core
//!
//! Platform-agnostic core types, capability traits, and error handling for
//! Mirinoi Player.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `EngineState`
//! - **Capability Traits**: `Engine` (anything that can render a stream) and
//!   `StreamResolver` (turns a page URL into a playable stream URL)
//! - **Error Handling**: Unified `MirinoiError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use mirinoi_core::types::Track;
//!
//! let track = Track::new("Intro", "https://music.youtube.com/watch?v=abc");
//! assert_eq!(track.artist_or_default(), "Unknown Artist");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;
pub mod validate;

// Re-export commonly used types
pub use error::{MirinoiError, Result};
pub use traits::{Engine, StreamResolver};
pub use types::{EngineState, Track, UNKNOWN_ARTIST};
