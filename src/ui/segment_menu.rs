//! Segment menu pop-up, anchored above the Segments button.

use super::{BRIGHT_RED, DARK_RED};
use crate::app::App;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

const MIN_MENU_WIDTH: u16 = 20;

/// Renders the segment list of the active level.
///
/// # Returns
///
/// The menu area and the row regions drawn, by segment index
pub fn render_segment_menu(frame: &mut Frame, app: &App) -> (Rect, Vec<(usize, Rect)>) {
    let Some(level) = app.player.active_level() else {
        return (Rect::default(), Vec::new());
    };
    let screen = frame.area();
    let anchor = app.layout.segments_button;

    let longest = level
        .segments()
        .iter()
        .map(|s| s.name.chars().count() as u16)
        .max()
        .unwrap_or(0);
    let width = (longest + 6).max(MIN_MENU_WIDTH).min(screen.width);
    let height = (level.segment_count() as u16 + 2).min(anchor.y.saturating_sub(screen.y));
    if height < 3 || width < 3 {
        return (Rect::default(), Vec::new());
    }

    let right = anchor.x + anchor.width;
    let area = Rect {
        x: right.saturating_sub(width).max(screen.x),
        y: anchor.y - height,
        width,
        height,
    }
    .intersection(screen);

    frame.render_widget(Clear, area);
    let block = Block::default()
        .title(format!(" {} ", level.name))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BRIGHT_RED))
        .style(Style::default().bg(Color::Black));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let current = level.current_segment();
    let mut rows = Vec::new();
    for (index, segment) in level.segments().iter().enumerate() {
        let y = inner.y + index as u16;
        if y >= inner.bottom() {
            break;
        }
        let row = Rect {
            y,
            height: 1,
            ..inner
        };

        let marker = if index == current { "> " } else { "  " };
        let mut style = Style::default().fg(Color::White);
        if index == current {
            style = style.add_modifier(Modifier::BOLD);
        }
        if index == app.segment_menu.highlighted {
            style = style.bg(DARK_RED);
        }
        let combat = if segment.has_combat() { " *" } else { "" };
        let line = Line::from(vec![
            Span::styled(marker, style),
            Span::styled(segment.name.as_str(), style),
            Span::styled(combat, style.fg(Color::Red)),
        ]);
        frame.render_widget(Paragraph::new(line).style(style), row);
        rows.push((index, row));
    }

    (area, rows)
}
