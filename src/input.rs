//! Input mapping.
//!
//! Turns terminal key and mouse events into [`Action`]s. Mapping only reads
//! the application state (which overlays are open, where things were drawn);
//! all mutation happens in [`App::dispatch`](crate::app::App::dispatch).

use crate::app::App;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Rows scrolled by PageUp/PageDown when the grid height is not known yet.
const DEFAULT_PAGE_ROWS: i32 = 3;

/// Lines the help overlay scrolls per mouse wheel notch.
const HELP_WHEEL_LINES: i32 = 3;

/// A user intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SelectLevel(usize),
    SelectSegment(usize),
    TogglePause,
    ToggleCombat,
    ToggleRepeat,
    NextSegment,
    PreviousSegment,
    ToggleSegmentMenu,
    CloseSegmentMenu,
    MenuUp,
    MenuDown,
    MenuConfirm,
    /// Scroll the level grid by this many rows (negative is up).
    Scroll(i32),
    ToggleHelp,
    HelpScroll(i32),
    Quit,
}

/// Maps a key press to an action.
pub fn map_key(app: &App, key: KeyEvent) -> Option<Action> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }

    if app.show_help {
        return match key.code {
            KeyCode::Char('?') | KeyCode::Esc => Some(Action::ToggleHelp),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::HelpScroll(-1)),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::HelpScroll(1)),
            KeyCode::PageUp => Some(Action::HelpScroll(-10)),
            KeyCode::PageDown => Some(Action::HelpScroll(10)),
            _ => None,
        };
    }

    if app.segment_menu.open {
        let menu_action = match key.code {
            KeyCode::Esc | KeyCode::Char('s') | KeyCode::Char('q') => {
                Some(Action::CloseSegmentMenu)
            }
            KeyCode::Up | KeyCode::Char('k') => Some(Action::MenuUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::MenuDown),
            KeyCode::Enter => Some(Action::MenuConfirm),
            KeyCode::Char(c @ '1'..='9') => Some(Action::SelectSegment(c as usize - '1' as usize)),
            _ => None,
        };
        if menu_action.is_some() {
            return menu_action;
        }
    }

    let page = match app.layout.visible_rows {
        0 => DEFAULT_PAGE_ROWS,
        rows => rows as i32,
    };

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(Action::ToggleCombat),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::ToggleRepeat),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Action::ToggleSegmentMenu),
        KeyCode::Left => Some(Action::PreviousSegment),
        KeyCode::Right => Some(Action::NextSegment),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::Scroll(-1)),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::Scroll(1)),
        KeyCode::PageUp => Some(Action::Scroll(-page)),
        KeyCode::PageDown => Some(Action::Scroll(page)),
        KeyCode::Home => Some(Action::Scroll(i32::MIN)),
        KeyCode::End => Some(Action::Scroll(i32::MAX)),
        _ => None,
    }
}

/// Maps a mouse event to an action using the regions recorded by the last
/// render.
pub fn map_mouse(app: &App, mouse: MouseEvent) -> Option<Action> {
    let (x, y) = (mouse.column, mouse.row);
    let layout = &app.layout;

    if app.show_help {
        return match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(Action::ToggleHelp),
            MouseEventKind::ScrollUp => Some(Action::HelpScroll(-HELP_WHEEL_LINES)),
            MouseEventKind::ScrollDown => Some(Action::HelpScroll(HELP_WHEEL_LINES)),
            _ => None,
        };
    }

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) if app.segment_menu.open => {
            if let Some(index) = layout.segment_row_at(x, y) {
                Some(Action::SelectSegment(index))
            } else if layout.hits(layout.segments_button, x, y) {
                Some(Action::ToggleSegmentMenu)
            } else {
                Some(Action::CloseSegmentMenu)
            }
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if layout.hits(layout.pause_button, x, y) {
                Some(Action::TogglePause)
            } else if layout.hits(layout.combat_button, x, y) {
                Some(Action::ToggleCombat)
            } else if layout.hits(layout.repeat_button, x, y) {
                Some(Action::ToggleRepeat)
            } else if layout.hits(layout.segments_button, x, y) {
                Some(Action::ToggleSegmentMenu)
            } else {
                layout.tile_at(x, y).map(Action::SelectLevel)
            }
        }
        MouseEventKind::ScrollUp if app.segment_menu.open => Some(Action::MenuUp),
        MouseEventKind::ScrollDown if app.segment_menu.open => Some(Action::MenuDown),
        MouseEventKind::ScrollUp => Some(Action::Scroll(-1)),
        MouseEventKind::ScrollDown => Some(Action::Scroll(1)),
        _ => None,
    }
}
