//! Audio engine backed by rodio.
//!
//! Opens the default output device once and hands out one [`RodioStream`] per
//! loaded track. Each stream owns its own `Sink`, so the free and combat layers
//! of a segment mix independently and their volumes can be swapped.

use super::stream::{MusicLoader, MusicStream, StreamStatus};
use super::AudioError;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// The output device. Must outlive every stream it loaded.
pub struct AudioEngine {
    /// Audio output stream (must be kept alive).
    _stream: OutputStream,
    /// Handle used to create sinks.
    handle: OutputStreamHandle,
}

impl AudioEngine {
    /// Opens the default audio output.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::Device`] when no output device is available.
    pub fn new() -> Result<Self, AudioError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| AudioError::Device(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

impl MusicLoader for AudioEngine {
    fn load_music(&mut self, path: &Path) -> Result<Box<dyn MusicStream>, AudioError> {
        Ok(Box::new(RodioStream::open(&self.handle, path)?))
    }
}

/// A track held in memory and played through its own sink.
///
/// The encoded file is read once at load time; every `play` decodes it again
/// from the start.
pub struct RodioStream {
    sink: Sink,
    data: Arc<[u8]>,
    path: PathBuf,
    length: Option<Duration>,
    volume: f32,
    started: bool,
}

impl RodioStream {
    /// Reads and probes `path`, leaving the stream idle.
    pub fn open(handle: &OutputStreamHandle, path: &Path) -> Result<Self, AudioError> {
        let bytes = fs::read(path).map_err(|source| AudioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let data: Arc<[u8]> = Arc::from(bytes);

        // Probe once so broken files are rejected at load time
        let decoder = Decoder::new(Cursor::new(Arc::clone(&data))).map_err(|e| {
            AudioError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        let length = decoder.total_duration();

        let sink = Sink::try_new(handle).map_err(|e| AudioError::Sink(e.to_string()))?;
        sink.pause();

        Ok(Self {
            sink,
            data,
            path: path.to_path_buf(),
            length,
            volume: 1.0,
            started: false,
        })
    }

    fn queue_from_start(&mut self) {
        self.sink.clear();
        match Decoder::new(Cursor::new(Arc::clone(&self.data))) {
            Ok(decoder) => self.sink.append(decoder),
            Err(e) => warn!("Failed to restart {}: {}", self.path.display(), e),
        }
    }
}

impl MusicStream for RodioStream {
    fn play(&mut self) {
        self.queue_from_start();
        self.sink.play();
        self.started = true;
    }

    fn stop(&mut self) {
        self.sink.clear();
        self.started = false;
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        if self.started {
            self.sink.play();
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        self.sink.set_volume(volume);
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    /// Polls the sink. Decoding itself happens on rodio's output thread, so
    /// this only has to notice when the queue has drained.
    fn update(&mut self) -> StreamStatus {
        if !self.started {
            StreamStatus::Idle
        } else if self.sink.empty() {
            StreamStatus::Finished
        } else if self.sink.is_paused() {
            StreamStatus::Paused
        } else {
            StreamStatus::Playing
        }
    }

    fn is_started(&self) -> bool {
        self.started
    }

    fn time_played(&self) -> Duration {
        if self.started {
            self.sink.get_pos()
        } else {
            Duration::ZERO
        }
    }

    fn time_length(&self) -> Option<Duration> {
        self.length
    }
}
