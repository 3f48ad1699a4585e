//! Mirinoi Player - External Engines
//!
//! Concrete implementations of the `mirinoi-core` capability traits, all of
//! them thin wrappers around external programs:
//!
//! - [`FfplayEngine`]: one `ffplay` process per play
//! - [`MpvEngine`] (unix): one `mpv` process per track, driven over JSON IPC
//! - [`YtDlpResolver`]: `yt-dlp -f bestaudio -g`
//! - [`DirectResolver`]: sources that are already playable
//! - [`YtDlp`]: playlist and search extraction into `Track`s
//!
//! Nothing here talks to the network directly; the external programs do.

mod direct;
mod error;
pub mod ffplay;
#[cfg(unix)]
pub mod mpv;
mod process;
pub mod ytdlp;

pub use direct::DirectResolver;
pub use error::{EngineError, Result};
pub use ffplay::{FfplayConfig, FfplayEngine};
#[cfg(unix)]
pub use mpv::{MpvConfig, MpvEngine};
pub use ytdlp::{YtDlp, YtDlpResolver};
