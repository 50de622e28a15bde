//! Recording stream used by tests in place of the audio device.

use super::stream::{MusicLoader, MusicStream, StreamStatus};
use super::AudioError;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

/// Time a playing mock stream advances per `update`.
pub const FRAME: Duration = Duration::from_millis(16);

/// Observable state of a [`MockStream`].
#[derive(Debug, Clone)]
pub struct MockState {
    pub started: bool,
    pub paused: bool,
    pub volume: f32,
    pub position: Duration,
    pub length: Option<Duration>,
    pub plays: u32,
    pub stops: u32,
    pub updates: u32,
    /// Set by a test to make the next update report `Finished`.
    pub finished: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            started: false,
            paused: false,
            volume: 1.0,
            position: Duration::ZERO,
            length: Some(Duration::from_secs(120)),
            plays: 0,
            stops: 0,
            updates: 0,
            finished: false,
        }
    }
}

pub type MockHandle = Rc<RefCell<MockState>>;

pub struct MockStream {
    state: MockHandle,
}

impl MockStream {
    pub fn new() -> (Self, MockHandle) {
        let state = MockHandle::default();
        (
            Self {
                state: Rc::clone(&state),
            },
            state,
        )
    }
}

impl MusicStream for MockStream {
    fn play(&mut self) {
        let mut s = self.state.borrow_mut();
        s.started = true;
        s.paused = false;
        s.finished = false;
        s.position = Duration::ZERO;
        s.plays += 1;
    }

    fn stop(&mut self) {
        let mut s = self.state.borrow_mut();
        s.started = false;
        s.paused = false;
        s.position = Duration::ZERO;
        s.stops += 1;
    }

    fn pause(&mut self) {
        self.state.borrow_mut().paused = true;
    }

    fn resume(&mut self) {
        self.state.borrow_mut().paused = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.borrow_mut().volume = volume;
    }

    fn volume(&self) -> f32 {
        self.state.borrow().volume
    }

    fn update(&mut self) -> StreamStatus {
        let mut s = self.state.borrow_mut();
        s.updates += 1;
        if !s.started {
            StreamStatus::Idle
        } else if s.finished {
            StreamStatus::Finished
        } else if s.paused {
            StreamStatus::Paused
        } else {
            s.position += FRAME;
            StreamStatus::Playing
        }
    }

    fn is_started(&self) -> bool {
        self.state.borrow().started
    }

    fn time_played(&self) -> Duration {
        self.state.borrow().position
    }

    fn time_length(&self) -> Option<Duration> {
        self.state.borrow().length
    }
}

/// Loader handing out mock streams and remembering them by path.
#[derive(Default)]
pub struct MockLoader {
    pub loaded: Vec<(PathBuf, MockHandle)>,
    pub failing: HashSet<PathBuf>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes loading `path` fail.
    pub fn fail(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing.insert(path.into());
        self
    }

    /// The handle of the stream loaded from `path`.
    pub fn handle(&self, path: impl AsRef<Path>) -> MockHandle {
        let path = path.as_ref();
        self.loaded
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, h)| Rc::clone(h))
            .unwrap_or_else(|| panic!("no stream loaded from {}", path.display()))
    }

    /// Number of streams currently started.
    pub fn started_count(&self) -> usize {
        self.loaded
            .iter()
            .filter(|(_, h)| h.borrow().started)
            .count()
    }
}

impl MusicLoader for MockLoader {
    fn load_music(&mut self, path: &Path) -> Result<Box<dyn MusicStream>, AudioError> {
        if self.failing.contains(path) {
            return Err(AudioError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            });
        }
        let (stream, handle) = MockStream::new();
        self.loaded.push((path.to_path_buf(), handle));
        Ok(Box::new(stream))
    }
}
