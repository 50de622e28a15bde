//! Level grid rendering.
//!
//! Each level is a bordered tile with its thumbnail drawn in half blocks and
//! its name underneath. The level playing gets a bright border.

use super::{BRIGHT_RED, DARK_RED, DEEP_RED, TILE_GAP, TILE_HEIGHT, TILE_WIDTH};
use crate::app::App;
use crate::catalog::{Level, Thumbnail};
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget, Wrap};
use ratatui::Frame;

/// Upper half block: foreground paints the top pixel, background the bottom.
const HALF_BLOCK: &str = "\u{2580}";

/// Draws a thumbnail two pixel rows per cell, centered in its area. Without
/// a thumbnail it fills the area with a placeholder.
pub struct ThumbnailView<'a> {
    thumbnail: Option<&'a Thumbnail>,
}

impl<'a> ThumbnailView<'a> {
    pub fn new(thumbnail: Option<&'a Thumbnail>) -> Self {
        Self { thumbnail }
    }
}

impl Widget for ThumbnailView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let area = area.intersection(buf.area);
        let Some(thumb) = self.thumbnail else {
            for y in area.top()..area.bottom() {
                for x in area.left()..area.right() {
                    if let Some(cell) = buf.cell_mut((x, y)) {
                        cell.set_char(' ').set_bg(DEEP_RED);
                    }
                }
            }
            let label = Rect {
                y: area.y + area.height / 2,
                height: area.height.min(1),
                ..area
            };
            Paragraph::new("no image")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray).bg(DEEP_RED))
                .render(label, buf);
            return;
        };

        let cols = (thumb.width() as u16).min(area.width);
        let rows = (thumb.height().div_ceil(2) as u16).min(area.height);
        let left = area.x + (area.width - cols) / 2;
        let top = area.y + (area.height - rows) / 2;

        for row in 0..rows {
            for col in 0..cols {
                let px = col as u32;
                let py = row as u32 * 2;
                let Some(upper) = thumb.pixel(px, py) else {
                    continue;
                };
                let lower = thumb.pixel(px, py + 1).unwrap_or([0, 0, 0]);
                if let Some(cell) = buf.cell_mut((left + col, top + row)) {
                    cell.set_symbol(HALF_BLOCK)
                        .set_fg(rgb(upper))
                        .set_bg(rgb(lower));
                }
            }
        }
    }
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb(r, g, b)
}

/// Renders the level grid and returns the tile regions drawn, by level index.
pub fn render_grid(frame: &mut Frame, area: Rect, app: &App) -> Vec<(usize, Rect)> {
    let block = Block::default()
        .title(" Levels ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DARK_RED));
    frame.render_widget(block, area);

    let grid = app.layout.grid;
    let columns = app.layout.columns.max(1);
    let levels = app.player.catalog().levels();

    // Center the columns in the grid
    let used = columns as u16 * TILE_WIDTH + (columns as u16 - 1) * TILE_GAP;
    let margin = grid.width.saturating_sub(used) / 2;

    let mut tiles = Vec::new();
    for row in 0..app.layout.visible_rows {
        for col in 0..columns {
            let index = (app.scroll_row + row) * columns + col;
            let Some(level) = levels.get(index) else {
                break;
            };
            let rect = Rect {
                x: grid.x + margin + col as u16 * (TILE_WIDTH + TILE_GAP),
                y: grid.y + row as u16 * TILE_HEIGHT,
                width: TILE_WIDTH,
                height: TILE_HEIGHT,
            }
            .intersection(grid);
            if rect.is_empty() {
                continue;
            }
            let playing = app.player.current_level() == Some(index);
            render_tile(frame, rect, level, playing);
            tiles.push((index, rect));
        }
    }
    tiles
}

fn render_tile(frame: &mut Frame, area: Rect, level: &Level, playing: bool) {
    let border = if playing {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DARK_RED)
    };
    let block = Block::default().borders(Borders::ALL).border_style(border);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let name_rows = 2.min(inner.height);
    let picture = Rect {
        height: inner.height - name_rows,
        ..inner
    };
    let caption = Rect {
        y: picture.y + picture.height,
        height: name_rows,
        ..inner
    };

    frame.render_widget(ThumbnailView::new(level.thumbnail.as_ref()), picture);

    let name_style = if playing {
        Style::default()
            .fg(Color::White)
            .bg(BRIGHT_RED)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let name = Paragraph::new(Line::from(Span::styled(level.name.as_str(), name_style)))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(name, caption);
}
