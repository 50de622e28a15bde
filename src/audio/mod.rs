//! Audio playback for segment tracks.
//!
//! This module provides:
//! - The [`MusicStream`] trait the playback state machine drives
//! - A rodio-backed engine that loads tracks from disk
//! - A recording mock stream for tests

pub mod engine;
#[cfg(test)]
pub mod mock;
pub mod stream;

use std::path::PathBuf;
use thiserror::Error;

pub use engine::{AudioEngine, RodioStream};
pub use stream::{MusicLoader, MusicStream, StreamStatus};

/// Errors raised while opening the device or loading a track.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to open audio output: {0}")]
    Device(String),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },
    #[error("failed to create audio sink: {0}")]
    Sink(String),
}
