//! Terminal user interface components.
//!
//! This module draws the level grid, the control panel with its progress bar,
//! the segment menu and the help overlay. Rendering only reads application
//! state; the one thing it writes back is the set of screen regions used for
//! mouse hit testing.

mod controls;
mod grid;
mod help;
mod segment_menu;

use crate::app::{App, LayoutRegions};
use crate::playback::PlaybackState;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use std::time::Duration;

pub use controls::render_controls;
pub use grid::{render_grid, ThumbnailView};
pub use help::render_help;
pub use segment_menu::render_segment_menu;

/// Tile width in columns, borders included.
pub const TILE_WIDTH: u16 = 26;

/// Tile height in rows, borders included.
pub const TILE_HEIGHT: u16 = 12;

/// Gap between tiles, horizontally.
pub const TILE_GAP: u16 = 1;

/// Tile and button colours.
pub const DARK_RED: Color = Color::Rgb(84, 8, 8);
pub const DEEP_RED: Color = Color::Rgb(54, 8, 8);
pub const BRIGHT_RED: Color = Color::Rgb(130, 8, 8);

/// Screen areas of the top-level panels.
struct Panels {
    title: Rect,
    grid: Rect,
    controls: Rect,
    status: Rect,
}

/// Splits the terminal into panels and computes the grid and control
/// regions. Tiles and menu rows are filled in while drawing.
fn calculate_layout(size: Rect) -> (LayoutRegions, Panels) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Min(TILE_HEIGHT + 2),
            Constraint::Length(3), // Controls
            Constraint::Length(1), // Status
        ])
        .split(size);

    let controls = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(10), // Pause
            Constraint::Length(10), // Combat
            Constraint::Length(10), // Repeat
            Constraint::Min(20),    // Progress
            Constraint::Length(14), // Segments
        ])
        .split(main_chunks[2]);

    // Inside the grid border
    let grid = Rect {
        x: main_chunks[1].x + 1,
        y: main_chunks[1].y + 1,
        width: main_chunks[1].width.saturating_sub(2),
        height: main_chunks[1].height.saturating_sub(2),
    };

    let columns = ((grid.width + TILE_GAP) / (TILE_WIDTH + TILE_GAP)).max(1) as usize;
    let visible_rows = (grid.height / TILE_HEIGHT).max(1) as usize;

    let layout = LayoutRegions {
        grid,
        columns,
        visible_rows,
        pause_button: controls[0],
        combat_button: controls[1],
        repeat_button: controls[2],
        progress_bar: controls[3],
        segments_button: controls[4],
        ..LayoutRegions::default()
    };

    let panels = Panels {
        title: main_chunks[0],
        grid: main_chunks[1],
        controls: main_chunks[2],
        status: main_chunks[3],
    };

    (layout, panels)
}

/// Renders the complete UI and updates layout regions.
///
/// The layout is divided into:
/// - Top: title with the level and segment playing
/// - Center: scrollable grid of level tiles
/// - Bottom: control panel, then the status line
pub fn render(frame: &mut Frame, app: &mut App) {
    let (layout, panels) = calculate_layout(frame.area());

    // Clamps the scroll position for the new size before tiles are placed
    app.update_layout(layout);

    render_title(frame, panels.title, app);
    app.layout.tiles = render_grid(frame, panels.grid, app);
    render_controls(frame, panels.controls, app);
    render_status(frame, panels.status, app);

    if app.segment_menu.open {
        let (menu, rows) = render_segment_menu(frame, app);
        app.layout.segment_menu = menu;
        app.layout.segment_rows = rows;
    }

    if app.show_help {
        let max_scroll = render_help(frame, app.help_scroll);
        app.layout.help_max_scroll = max_scroll;
        app.help_scroll = app.help_scroll.min(max_scroll);
    }
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        " UltraPlayer ",
        Style::default()
            .fg(Color::White)
            .bg(BRIGHT_RED)
            .add_modifier(Modifier::BOLD),
    )];

    if let (Some(level), Some(segment)) = (app.player.active_level(), app.player.active_segment())
    {
        let state = match app.player.state() {
            PlaybackState::Paused => " [||] ",
            _ => " [>] ",
        };
        spans.push(Span::styled(state, Style::default().fg(Color::Yellow)));
        spans.push(Span::styled(
            format!("{} / {}", level.name, segment.name),
            Style::default().fg(Color::White),
        ));
        if app.player.combat_audible() {
            spans.push(Span::styled(" (combat)", Style::default().fg(Color::Red)));
        }
        if app.player.repeat_segment() {
            spans.push(Span::styled(" (repeat)", Style::default().fg(Color::DarkGray)));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let line = if let Some((msg, _)) = &app.status_message {
        Line::from(Span::styled(
            msg.as_str(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        ))
    } else {
        Line::from(Span::styled(
            format!(
                "{} levels  |  ? help  |  q quit",
                app.player.catalog().len()
            ),
            Style::default().fg(Color::DarkGray),
        ))
    };
    frame.render_widget(Paragraph::new(line), area);
}

/// Formats a stream time as `MM:SS`, or `--:--` when unknown.
pub fn format_time(time: Option<Duration>) -> String {
    match time {
        Some(time) => {
            let secs = time.as_secs();
            format!("{:02}:{:02}", secs / 60, secs % 60)
        }
        None => "--:--".to_string(),
    }
}

/// Helper function to center a rectangle within another rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
