//! Application state and event handling.
//!
//! This module defines the main application state that coordinates the
//! playback state machine with the terminal interface: scroll position,
//! overlays, the status line and the screen regions used for mouse hit
//! testing. Input arrives as [`Action`]s from the [`input`](crate::input)
//! module.

use crate::catalog::Catalog;
use crate::input::Action;
use crate::playback::{PlaybackState, Player, PlayerEvent};
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

/// How long a status message stays visible.
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Layout regions for mouse hit testing.
/// Stores the screen coordinates of everything clickable, as last drawn.
#[derive(Debug, Clone, Default)]
pub struct LayoutRegions {
    /// The scrollable level grid.
    pub grid: Rect,
    /// Visible level tiles, by catalog index.
    pub tiles: Vec<(usize, Rect)>,
    /// Tiles per grid row.
    pub columns: usize,
    /// Tile rows that fit in the grid.
    pub visible_rows: usize,
    pub pause_button: Rect,
    pub combat_button: Rect,
    pub repeat_button: Rect,
    pub segments_button: Rect,
    pub progress_bar: Rect,
    /// The open segment menu (empty when closed).
    pub segment_menu: Rect,
    /// Segment menu rows, by segment index.
    pub segment_rows: Vec<(usize, Rect)>,
    /// Largest help overlay scroll offset, as last drawn.
    pub help_max_scroll: u16,
}

impl LayoutRegions {
    /// Checks if a point is within a rectangle.
    pub fn hits(&self, rect: Rect, x: u16, y: u16) -> bool {
        x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
    }

    /// The level tile under the point, if any.
    pub fn tile_at(&self, x: u16, y: u16) -> Option<usize> {
        if !self.hits(self.grid, x, y) {
            return None;
        }
        self.tiles
            .iter()
            .find(|(_, rect)| self.hits(*rect, x, y))
            .map(|(index, _)| *index)
    }

    /// The segment menu row under the point, if any.
    pub fn segment_row_at(&self, x: u16, y: u16) -> Option<usize> {
        self.segment_rows
            .iter()
            .find(|(_, rect)| self.hits(*rect, x, y))
            .map(|(index, _)| *index)
    }
}

/// State of the segment pop-up menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentMenuState {
    pub open: bool,
    /// Keyboard-highlighted row.
    pub highlighted: usize,
}

/// The whole application.
pub struct App {
    /// Playback state machine and the catalog it owns.
    pub player: Player,
    /// First visible grid row.
    pub scroll_row: usize,
    pub segment_menu: SegmentMenuState,
    /// Whether the help overlay is visible.
    pub show_help: bool,
    /// Help overlay scroll offset.
    pub help_scroll: u16,
    /// Transient status message and when it was set.
    pub status_message: Option<(String, Instant)>,
    /// Regions recorded by the last render.
    pub layout: LayoutRegions,
}

impl App {
    /// Creates the application around a loaded catalog. Nothing plays yet.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            player: Player::new(catalog),
            scroll_row: 0,
            segment_menu: SegmentMenuState::default(),
            show_help: false,
            help_scroll: 0,
            status_message: None,
            layout: LayoutRegions::default(),
        }
    }

    /// Per-frame work: pumps the active streams and expires the status line.
    pub fn tick(&mut self) {
        let previous = self.player.current_level();
        match self.player.update() {
            Some(PlayerEvent::Repeated) => self.set_status("Repeating segment"),
            Some(PlayerEvent::Advanced { level, .. }) => {
                self.follow_segment_change(previous);
                self.reveal_level(level);
                self.announce_now_playing();
            }
            None => {}
        }
        self.clear_expired_status();
    }

    /// Applies an action.
    ///
    /// # Returns
    ///
    /// `true` if the application should quit
    pub fn dispatch(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::SelectLevel(index) => {
                self.segment_menu.open = false;
                match self.player.select_level(index) {
                    Ok(()) => self.announce_now_playing(),
                    Err(e) => self.set_status(format!("Cannot play level: {}", e)),
                }
            }
            Action::SelectSegment(index) => {
                self.segment_menu.open = false;
                match self.player.select_segment(index) {
                    Ok(()) => self.announce_now_playing(),
                    Err(e) => self.set_status(format!("Cannot play segment: {}", e)),
                }
            }
            Action::TogglePause => {
                if self.player.toggle_pause() {
                    if self.player.is_paused() {
                        self.set_status("Paused");
                    } else {
                        self.set_status("Resumed");
                    }
                } else {
                    self.set_status("Nothing is playing");
                }
            }
            Action::ToggleCombat => {
                if self.player.toggle_combat() {
                    if self.player.persistent_combat() {
                        self.set_status("Combat layer on");
                    } else {
                        self.set_status("Combat layer off");
                    }
                } else {
                    self.set_status("No combat layer for this segment");
                }
            }
            Action::ToggleRepeat => {
                if self.player.toggle_repeat() {
                    self.set_status("Repeat segment on");
                } else {
                    self.set_status("Repeat segment off");
                }
            }
            Action::NextSegment | Action::PreviousSegment => {
                let previous = self.player.current_level();
                let moved = if action == Action::NextSegment {
                    self.player.advance_segment()
                } else {
                    self.player.previous_segment()
                };
                match moved {
                    Ok(()) => {
                        self.follow_segment_change(previous);
                        if let Some(level) = self.player.current_level() {
                            self.reveal_level(level);
                        }
                        self.announce_now_playing();
                    }
                    Err(e) => self.set_status(format!("Cannot move: {}", e)),
                }
            }
            Action::ToggleSegmentMenu => {
                if self.segment_menu.open {
                    self.segment_menu.open = false;
                } else if self.segment_menu_available() {
                    self.segment_menu = SegmentMenuState {
                        open: true,
                        highlighted: self.player.current_segment_index().unwrap_or(0),
                    };
                } else {
                    self.set_status("No other segments to choose from");
                }
            }
            Action::CloseSegmentMenu => self.segment_menu.open = false,
            Action::MenuUp => {
                self.segment_menu.highlighted = self.segment_menu.highlighted.saturating_sub(1);
            }
            Action::MenuDown => {
                let count = self.active_segment_count();
                if self.segment_menu.highlighted + 1 < count {
                    self.segment_menu.highlighted += 1;
                }
            }
            Action::MenuConfirm => {
                if !self.segment_menu.open {
                    return false;
                }
                let index = self.segment_menu.highlighted;
                return self.dispatch(Action::SelectSegment(index));
            }
            Action::Scroll(delta) => self.scroll_by(delta),
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                self.help_scroll = 0;
            }
            Action::HelpScroll(delta) => {
                let target = if delta < 0 {
                    self.help_scroll.saturating_sub(delta.unsigned_abs() as u16)
                } else {
                    self.help_scroll.saturating_add(delta as u16)
                };
                self.help_scroll = target.min(self.layout.help_max_scroll);
            }
        }
        false
    }

    /// Sets a status message to display temporarily.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Clears expired status messages.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    /// Updates the layout regions after a render and keeps the scroll
    /// position in range for the new grid size.
    pub fn update_layout(&mut self, layout: LayoutRegions) {
        self.layout = layout;
        self.scroll_row = self.scroll_row.min(self.max_scroll());
    }

    /// Total number of grid rows.
    pub fn total_rows(&self) -> usize {
        let columns = self.layout.columns.max(1);
        self.player.catalog().len().div_ceil(columns)
    }

    /// Largest valid `scroll_row`.
    pub fn max_scroll(&self) -> usize {
        self.total_rows()
            .saturating_sub(self.layout.visible_rows.max(1))
    }

    /// Whether the segment menu can be opened.
    pub fn segment_menu_available(&self) -> bool {
        self.player.state() != PlaybackState::Idle && self.active_segment_count() > 1
    }

    fn active_segment_count(&self) -> usize {
        self.player
            .active_level()
            .map(|level| level.segment_count())
            .unwrap_or(0)
    }

    /// Keeps the segment menu in step with playback moving on by itself or
    /// by Left/Right: it closes when the level changes and otherwise
    /// highlights the segment now playing.
    fn follow_segment_change(&mut self, previous_level: Option<usize>) {
        if !self.segment_menu.open {
            return;
        }
        let current = self.player.current_segment_index().unwrap_or(0);
        self.segment_menu.highlighted = current;
        if self.player.current_level() != previous_level || !self.segment_menu_available() {
            self.segment_menu.open = false;
        }
    }

    fn scroll_by(&mut self, delta: i32) {
        let target = if delta < 0 {
            self.scroll_row.saturating_sub(delta.unsigned_abs() as usize)
        } else {
            self.scroll_row.saturating_add(delta as usize)
        };
        self.scroll_row = target.min(self.max_scroll());
    }

    /// Scrolls just enough to bring level `index` into view.
    fn reveal_level(&mut self, index: usize) {
        let columns = self.layout.columns.max(1);
        let visible = self.layout.visible_rows.max(1);
        let row = index / columns;
        if row < self.scroll_row {
            self.scroll_row = row;
        } else if row >= self.scroll_row + visible {
            self.scroll_row = row + 1 - visible;
        }
    }

    fn announce_now_playing(&mut self) {
        let message = match (self.player.active_level(), self.player.active_segment()) {
            (Some(level), Some(segment)) => format!("Playing {}: {}", level.name, segment.name),
            _ => return,
        };
        self.set_status(message);
    }
}
