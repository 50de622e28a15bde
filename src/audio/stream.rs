//! The music stream abstraction the player drives.
//!
//! A stream is one loaded track (a segment's free or combat layer). The player
//! only ever talks to streams through [`MusicStream`], so the playback state
//! machine can be exercised without an audio device.

use super::AudioError;
use std::path::Path;
use std::time::Duration;

/// What a stream reported on its last per-frame update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// Never started, or stopped.
    Idle,
    /// Started and audible (volume permitting).
    Playing,
    /// Started but paused at its current position.
    Paused,
    /// Started and has run out of samples.
    Finished,
}

/// A loaded, restartable music track.
pub trait MusicStream {
    /// Starts the track from its beginning.
    fn play(&mut self);

    /// Stops the track and rewinds it.
    fn stop(&mut self);

    /// Pauses at the current position.
    fn pause(&mut self);

    /// Resumes from the paused position.
    fn resume(&mut self);

    /// Sets the linear volume (0.0 silent, 1.0 full).
    fn set_volume(&mut self, volume: f32);

    /// Current linear volume.
    fn volume(&self) -> f32;

    /// Per-frame update. Must be called every frame while the stream belongs
    /// to the active segment, paused or not.
    fn update(&mut self) -> StreamStatus;

    /// Whether the stream is started (playing or paused).
    fn is_started(&self) -> bool;

    /// Time played since the last `play`.
    fn time_played(&self) -> Duration;

    /// Total length, when the decoder knows it.
    fn time_length(&self) -> Option<Duration>;
}

/// Something that can turn a file into a [`MusicStream`].
pub trait MusicLoader {
    fn load_music(&mut self, path: &Path) -> Result<Box<dyn MusicStream>, AudioError>;
}
