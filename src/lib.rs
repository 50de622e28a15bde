//! ultraplayer - A terminal jukebox for layered level music.
//!
//! This library provides the manifest loader, the level catalog and the
//! playback state machine, plus the terminal front end built on them.

pub mod app;
pub mod audio;
pub mod catalog;
pub mod input;
pub mod playback;
pub mod ui;

// Re-export commonly used types
pub use app::App;
pub use audio::{AudioEngine, AudioError, MusicLoader, MusicStream};
pub use catalog::{Catalog, Level, Manifest, ManifestError, Segment, DEFAULT_MANIFEST};
pub use input::Action;
pub use playback::{PlaybackError, PlaybackState, Player};
