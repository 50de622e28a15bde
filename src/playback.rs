//! Playback state machine.
//!
//! [`Player`] owns the [`Catalog`] and decides which segment's streams are
//! running. At most one segment is started at a time: every transition stops
//! the outgoing segment before starting the incoming one. The combat layer is
//! a volume swap on two streams that always run together.

use crate::audio::{MusicStream, StreamStatus};
use crate::catalog::{Catalog, Level, Segment};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Coarse playback state, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing selected.
    Idle,
    /// A segment is running.
    Playing,
    /// A segment is selected and paused.
    Paused,
}

/// A transition that was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("no level at index {0}")]
    InvalidLevel(usize),
    #[error("no segment at index {0}")]
    InvalidSegment(usize),
    #[error("level has no playable segments")]
    EmptyLevel,
    #[error("nothing is playing")]
    NothingPlaying,
}

/// Something the player did on its own during [`Player::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The segment ended and was restarted (repeat on).
    Repeated,
    /// The segment ended and playback moved on.
    Advanced { level: usize, segment: usize },
}

/// The playback cursor plus the catalog it points into.
#[derive(Debug)]
pub struct Player {
    catalog: Catalog,
    /// Index of the active level, `None` when idle.
    current: Option<usize>,
    paused: bool,
    /// Combat layer audible instead of the free layer, kept across switches.
    persistent_combat: bool,
    /// Restart the segment when it ends instead of moving on.
    repeat_segment: bool,
}

impl Player {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            current: None,
            paused: false,
            persistent_combat: false,
            repeat_segment: false,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> PlaybackState {
        match (self.current, self.paused) {
            (None, _) => PlaybackState::Idle,
            (Some(_), false) => PlaybackState::Playing,
            (Some(_), true) => PlaybackState::Paused,
        }
    }

    /// Index of the active level.
    pub fn current_level(&self) -> Option<usize> {
        self.current
    }

    /// Index of the active segment within the active level.
    pub fn current_segment_index(&self) -> Option<usize> {
        self.active_level().map(Level::current_segment)
    }

    pub fn active_level(&self) -> Option<&Level> {
        self.current.and_then(|i| self.catalog.level(i))
    }

    pub fn active_segment(&self) -> Option<&Segment> {
        let level = self.active_level()?;
        level.segment(level.current_segment())
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn persistent_combat(&self) -> bool {
        self.persistent_combat
    }

    pub fn repeat_segment(&self) -> bool {
        self.repeat_segment
    }

    /// Whether the active segment has a combat layer.
    pub fn combat_available(&self) -> bool {
        self.active_segment().is_some_and(Segment::has_combat)
    }

    /// Whether the combat layer is the audible one right now.
    pub fn combat_audible(&self) -> bool {
        self.active_segment()
            .and_then(Segment::combat)
            .is_some_and(|combat| combat.is_started() && combat.volume() > 0.0)
    }

    /// Time played and total length of the active free track.
    pub fn progress(&self) -> Option<(Duration, Option<Duration>)> {
        let free = self.active_segment()?.free();
        Some((free.time_played(), free.time_length()))
    }

    /// Starts level `index` from its first segment.
    ///
    /// Stops whatever was playing first. Selecting the active level restarts
    /// it from segment 0.
    pub fn select_level(&mut self, index: usize) -> Result<(), PlaybackError> {
        let level = self
            .catalog
            .level(index)
            .ok_or(PlaybackError::InvalidLevel(index))?;
        if level.segment_count() == 0 {
            return Err(PlaybackError::EmptyLevel);
        }

        self.stop_active();
        self.current = Some(index);
        self.start(index, 0);
        debug!("Selected level {}", index);
        Ok(())
    }

    /// Switches the active level to segment `index`.
    pub fn select_segment(&mut self, index: usize) -> Result<(), PlaybackError> {
        let level_index = self.current.ok_or(PlaybackError::NothingPlaying)?;
        let level = self
            .catalog
            .level(level_index)
            .ok_or(PlaybackError::InvalidLevel(level_index))?;
        if index >= level.segment_count() {
            return Err(PlaybackError::InvalidSegment(index));
        }

        self.stop_active();
        self.start(level_index, index);
        debug!("Selected segment {} of level {}", index, level_index);
        Ok(())
    }

    /// Pauses or resumes both layers of the active segment.
    ///
    /// Returns `false` (and changes nothing) when idle.
    pub fn toggle_pause(&mut self) -> bool {
        if self.current.is_none() {
            return false;
        }
        self.paused = !self.paused;
        let paused = self.paused;
        if let Some(segment) = self.active_segment_mut() {
            segment.for_each_stream(|stream| {
                if paused {
                    stream.pause();
                } else {
                    stream.resume();
                }
            });
        }
        true
    }

    /// Swaps the audible layer of the active segment.
    ///
    /// Returns `false` (and changes nothing) when idle or when the active
    /// segment has no combat layer.
    pub fn toggle_combat(&mut self) -> bool {
        if !self.combat_available() {
            return false;
        }
        self.persistent_combat = !self.persistent_combat;
        self.apply_volumes();
        true
    }

    /// Flips the repeat flag and returns the new value.
    pub fn toggle_repeat(&mut self) -> bool {
        self.repeat_segment = !self.repeat_segment;
        self.repeat_segment
    }

    /// Moves to the next segment, rolling over to the first segment of the
    /// next level after the last one, and back to the first level at the end
    /// of the catalog.
    pub fn advance_segment(&mut self) -> Result<(), PlaybackError> {
        let (level, segment) = self.neighbour(true)?;
        self.jump_to(level, segment);
        Ok(())
    }

    /// Moves to the previous segment, rolling over to the last segment of the
    /// previous level.
    pub fn previous_segment(&mut self) -> Result<(), PlaybackError> {
        let (level, segment) = self.neighbour(false)?;
        self.jump_to(level, segment);
        Ok(())
    }

    /// Stops everything and returns to idle.
    pub fn stop(&mut self) {
        self.stop_active();
        self.current = None;
        self.paused = false;
    }

    /// Per-frame update of the active segment's streams.
    ///
    /// Every stream of the active segment is updated, paused or not. When the
    /// free track has finished, the segment restarts (repeat on) or playback
    /// advances.
    pub fn update(&mut self) -> Option<PlayerEvent> {
        let segment = self.active_segment_mut()?;
        let free = segment.free_mut().update();
        if let Some(combat) = segment.combat_mut() {
            combat.update();
        }

        if free != StreamStatus::Finished || self.paused {
            return None;
        }

        if self.repeat_segment {
            let level = self.current?;
            let index = self.current_segment_index()?;
            self.stop_active();
            self.start(level, index);
            Some(PlayerEvent::Repeated)
        } else {
            self.advance_segment().ok()?;
            Some(PlayerEvent::Advanced {
                level: self.current?,
                segment: self.current_segment_index()?,
            })
        }
    }

    fn active_segment_mut(&mut self) -> Option<&mut Segment> {
        let level = self.catalog.level_mut(self.current?)?;
        let index = level.current_segment();
        level.segment_mut(index)
    }

    fn stop_active(&mut self) {
        if let Some(segment) = self.active_segment_mut() {
            segment.for_each_stream(|stream| stream.stop());
        }
    }

    /// Makes `segment` of `level` current and starts its streams. The
    /// previous segment must already be stopped.
    fn start(&mut self, level: usize, segment: usize) {
        self.current = Some(level);
        self.paused = false;
        if let Some(level) = self.catalog.level_mut(level) {
            level.set_current_segment(segment);
        }
        if let Some(segment) = self.active_segment_mut() {
            segment.for_each_stream(|stream| stream.play());
        }
        self.apply_volumes();
    }

    fn jump_to(&mut self, level: usize, segment: usize) {
        self.stop_active();
        self.start(level, segment);
        debug!("Moved to segment {} of level {}", segment, level);
    }

    fn apply_volumes(&mut self) {
        let combat_on = self.persistent_combat;
        if let Some(segment) = self.active_segment_mut() {
            let (free, combat) = if segment.has_combat() && combat_on {
                (0.0, 1.0)
            } else {
                (1.0, 0.0)
            };
            segment.free_mut().set_volume(free);
            if let Some(stream) = segment.combat_mut() {
                stream.set_volume(combat);
            }
        }
    }

    /// The (level, segment) one step forward or back from the cursor,
    /// skipping levels without segments.
    fn neighbour(&self, forward: bool) -> Result<(usize, usize), PlaybackError> {
        let level_index = self.current.ok_or(PlaybackError::NothingPlaying)?;
        let level = self
            .catalog
            .level(level_index)
            .ok_or(PlaybackError::InvalidLevel(level_index))?;
        let segment = level.current_segment();

        if forward && segment + 1 < level.segment_count() {
            return Ok((level_index, segment + 1));
        }
        if !forward && segment > 0 {
            return Ok((level_index, segment - 1));
        }

        let count = self.catalog.len();
        for step in 1..=count {
            let candidate = if forward {
                (level_index + step) % count
            } else {
                (level_index + count - step) % count
            };
            let Some(level) = self.catalog.level(candidate) else {
                continue;
            };
            if level.segment_count() > 0 {
                let segment = if forward { 0 } else { level.segment_count() - 1 };
                return Ok((candidate, segment));
            }
        }
        Err(PlaybackError::EmptyLevel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mock::{MockHandle, MockLoader, FRAME};
    use crate::catalog::Manifest;

    const MANIFEST: &str = r#"{
        "base-folder": "a",
        "levels": {
            "Forest": {"folder": "f", "thumbnail": "t.png", "segments": {
                "0": {"name": "Calm", "free": "calm.ogg", "combat": "fight.ogg"},
                "1": {"name": "Deep", "free": "deep.ogg"}
            }},
            "Cave": {"folder": "c", "thumbnail": "t.png", "segments": {
                "0": {"name": "Drip", "free": "drip.ogg", "combat": "bats.ogg"}
            }},
            "Empty": {"folder": "e", "thumbnail": "t.png", "segments": {}},
            "Keep": {"folder": "k", "thumbnail": "t.png", "segments": {
                "0": {"name": "Gate", "free": "gate.ogg"},
                "1": {"name": "Hall", "free": "hall.ogg", "combat": "guards.ogg"}
            }}
        }
    }"#;

    fn setup() -> (Player, MockLoader) {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let mut loader = MockLoader::new();
        let catalog = Catalog::from_manifest(&manifest, &mut loader).unwrap();
        (Player::new(catalog), loader)
    }

    fn h(loader: &MockLoader, path: &str) -> MockHandle {
        loader.handle(path)
    }

    #[test]
    fn test_starts_idle() {
        let (player, loader) = setup();
        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(player.current_level(), None);
        assert!(player.active_segment().is_none());
        assert_eq!(loader.started_count(), 0);
    }

    #[test]
    fn test_select_level_starts_both_layers() {
        let (mut player, loader) = setup();
        player.select_level(0).unwrap();

        assert_eq!(player.state(), PlaybackState::Playing);
        assert_eq!(player.current_level(), Some(0));
        assert_eq!(player.current_segment_index(), Some(0));

        let free = h(&loader, "a/f/calm.ogg");
        let combat = h(&loader, "a/f/fight.ogg");
        assert!(free.borrow().started);
        assert!(combat.borrow().started);
        assert_eq!(free.borrow().volume, 1.0);
        assert_eq!(combat.borrow().volume, 0.0);
        assert_eq!(loader.started_count(), 2);
    }

    #[test]
    fn test_select_level_stops_previous_level() {
        let (mut player, loader) = setup();
        player.select_level(0).unwrap();
        player.select_level(1).unwrap();

        let calm = h(&loader, "a/f/calm.ogg");
        let fight = h(&loader, "a/f/fight.ogg");
        assert!(!calm.borrow().started);
        assert!(!fight.borrow().started);
        assert_eq!(calm.borrow().stops, 1);
        assert_eq!(fight.borrow().stops, 1);

        assert!(h(&loader, "a/c/drip.ogg").borrow().started);
        assert!(h(&loader, "a/c/bats.ogg").borrow().started);
        assert_eq!(loader.started_count(), 2);
    }

    #[test]
    fn test_select_level_applies_persistent_combat() {
        let (mut player, loader) = setup();
        player.select_level(0).unwrap();
        assert!(player.toggle_combat());
        player.select_level(1).unwrap();

        assert!(player.persistent_combat());
        assert_eq!(h(&loader, "a/c/drip.ogg").borrow().volume, 0.0);
        assert_eq!(h(&loader, "a/c/bats.ogg").borrow().volume, 1.0);
    }

    #[test]
    fn test_free_layer_audible_without_combat_track() {
        let (mut player, loader) = setup();
        player.select_level(0).unwrap();
        player.toggle_combat();
        player.select_level(3).unwrap();

        // Gate has no combat layer: free stays audible even with combat on
        assert_eq!(h(&loader, "a/k/gate.ogg").borrow().volume, 1.0);
        assert!(!player.combat_audible());
    }

    #[test]
    fn test_select_invalid_or_empty_level() {
        let (mut player, loader) = setup();
        player.select_level(0).unwrap();

        assert_eq!(player.select_level(42), Err(PlaybackError::InvalidLevel(42)));
        assert_eq!(player.select_level(2), Err(PlaybackError::EmptyLevel));
        // The running level is untouched
        assert_eq!(player.current_level(), Some(0));
        assert!(h(&loader, "a/f/calm.ogg").borrow().started);
    }

    #[test]
    fn test_select_segment() {
        let (mut player, loader) = setup();
        assert_eq!(player.select_segment(0), Err(PlaybackError::NothingPlaying));

        player.select_level(0).unwrap();
        player.select_segment(1).unwrap();

        assert_eq!(player.current_segment_index(), Some(1));
        assert!(!h(&loader, "a/f/calm.ogg").borrow().started);
        assert!(!h(&loader, "a/f/fight.ogg").borrow().started);
        assert!(h(&loader, "a/f/deep.ogg").borrow().started);
        assert_eq!(loader.started_count(), 1);

        assert_eq!(player.select_segment(2), Err(PlaybackError::InvalidSegment(2)));
        assert_eq!(player.current_segment_index(), Some(1));
    }

    #[test]
    fn test_select_level_resets_segment() {
        let (mut player, _loader) = setup();
        player.select_level(0).unwrap();
        player.select_segment(1).unwrap();
        player.select_level(1).unwrap();
        player.select_level(0).unwrap();
        assert_eq!(player.current_segment_index(), Some(0));
    }

    #[test]
    fn test_toggle_pause_moves_both_layers() {
        let (mut player, loader) = setup();
        assert!(!player.toggle_pause());
        assert_eq!(player.state(), PlaybackState::Idle);

        player.select_level(0).unwrap();
        assert!(player.toggle_pause());
        assert_eq!(player.state(), PlaybackState::Paused);
        assert!(h(&loader, "a/f/calm.ogg").borrow().paused);
        assert!(h(&loader, "a/f/fight.ogg").borrow().paused);

        assert!(player.toggle_pause());
        assert_eq!(player.state(), PlaybackState::Playing);
        assert!(!h(&loader, "a/f/calm.ogg").borrow().paused);
        assert!(!h(&loader, "a/f/fight.ogg").borrow().paused);
    }

    #[test]
    fn test_pause_resume_keeps_position() {
        let (mut player, loader) = setup();
        player.select_level(0).unwrap();
        for _ in 0..10 {
            player.update();
        }
        let before = h(&loader, "a/f/calm.ogg").borrow().position;
        assert_eq!(before, FRAME * 10);

        player.toggle_pause();
        for _ in 0..5 {
            player.update();
        }
        player.toggle_pause();

        assert_eq!(h(&loader, "a/f/calm.ogg").borrow().position, before);
        assert_eq!(player.progress().unwrap().0, before);
    }

    #[test]
    fn test_toggle_combat_without_combat_is_noop() {
        let (mut player, loader) = setup();
        assert!(!player.toggle_combat());

        player.select_level(0).unwrap();
        player.select_segment(1).unwrap();
        assert!(!player.toggle_combat());
        assert!(!player.persistent_combat());
        assert_eq!(h(&loader, "a/f/deep.ogg").borrow().volume, 1.0);
    }

    #[test]
    fn test_toggle_combat_swaps_volumes() {
        let (mut player, loader) = setup();
        player.select_level(0).unwrap();

        assert!(player.toggle_combat());
        assert!(player.combat_audible());
        assert_eq!(h(&loader, "a/f/calm.ogg").borrow().volume, 0.0);
        assert_eq!(h(&loader, "a/f/fight.ogg").borrow().volume, 1.0);

        let segment = player.active_segment().unwrap();
        assert_eq!(segment.free().volume(), 0.0);
        assert!(segment.combat().is_some_and(|c| c.is_started()));

        assert!(player.toggle_combat());
        assert!(!player.combat_audible());
        assert_eq!(h(&loader, "a/f/calm.ogg").borrow().volume, 1.0);
        assert_eq!(h(&loader, "a/f/fight.ogg").borrow().volume, 0.0);
        // Both layers kept running throughout
        assert_eq!(h(&loader, "a/f/calm.ogg").borrow().plays, 1);
    }

    #[test]
    fn test_advance_rolls_over_levels() {
        let (mut player, _loader) = setup();
        assert_eq!(player.advance_segment(), Err(PlaybackError::NothingPlaying));

        player.select_level(0).unwrap();
        player.advance_segment().unwrap();
        assert_eq!((player.current_level(), player.current_segment_index()), (Some(0), Some(1)));

        player.advance_segment().unwrap();
        assert_eq!((player.current_level(), player.current_segment_index()), (Some(1), Some(0)));

        // Empty level is skipped
        player.advance_segment().unwrap();
        assert_eq!((player.current_level(), player.current_segment_index()), (Some(3), Some(0)));

        player.advance_segment().unwrap();
        player.advance_segment().unwrap();
        assert_eq!((player.current_level(), player.current_segment_index()), (Some(0), Some(0)));
    }

    #[test]
    fn test_previous_rolls_back_to_last_segment() {
        let (mut player, loader) = setup();
        player.select_level(1).unwrap();
        player.previous_segment().unwrap();
        assert_eq!((player.current_level(), player.current_segment_index()), (Some(0), Some(1)));

        player.select_level(0).unwrap();
        player.previous_segment().unwrap();
        assert_eq!((player.current_level(), player.current_segment_index()), (Some(3), Some(1)));
        assert_eq!(loader.started_count(), 2);
        assert!(h(&loader, "a/k/hall.ogg").borrow().started);
        assert!(h(&loader, "a/k/guards.ogg").borrow().started);
    }

    #[test]
    fn test_update_pumps_every_active_stream() {
        let (mut player, loader) = setup();
        assert_eq!(player.update(), None);

        player.select_level(0).unwrap();
        player.toggle_pause();
        player.update();
        player.update();
        assert_eq!(h(&loader, "a/f/calm.ogg").borrow().updates, 2);
        assert_eq!(h(&loader, "a/f/fight.ogg").borrow().updates, 2);
        assert_eq!(h(&loader, "a/c/drip.ogg").borrow().updates, 0);
    }

    #[test]
    fn test_finished_segment_advances() {
        let (mut player, loader) = setup();
        player.select_level(0).unwrap();
        h(&loader, "a/f/calm.ogg").borrow_mut().finished = true;

        assert_eq!(
            player.update(),
            Some(PlayerEvent::Advanced {
                level: 0,
                segment: 1
            })
        );
        assert!(h(&loader, "a/f/deep.ogg").borrow().started);
        assert!(!h(&loader, "a/f/calm.ogg").borrow().started);
    }

    #[test]
    fn test_finished_segment_repeats() {
        let (mut player, loader) = setup();
        player.select_level(0).unwrap();
        assert!(player.toggle_repeat());
        h(&loader, "a/f/calm.ogg").borrow_mut().finished = true;

        assert_eq!(player.update(), Some(PlayerEvent::Repeated));
        assert_eq!(player.current_segment_index(), Some(0));
        assert_eq!(h(&loader, "a/f/calm.ogg").borrow().plays, 2);
        assert_eq!(h(&loader, "a/f/fight.ogg").borrow().plays, 2);
        assert!(h(&loader, "a/f/calm.ogg").borrow().started);
    }

    #[test]
    fn test_stop_returns_to_idle() {
        let (mut player, loader) = setup();
        player.select_level(3).unwrap();
        player.stop();
        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(loader.started_count(), 0);
    }
}
