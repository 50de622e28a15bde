//! Help overlay rendering.
//!
//! Displays keyboard shortcuts and mouse controls in a modal overlay.

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::centered_rect;

/// Key binding entry for the help display.
struct KeyBinding {
    key: &'static str,
    description: &'static str,
}

const GENERAL_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "?",
        description: "Toggle this help",
    },
    KeyBinding {
        key: "q / Esc",
        description: "Quit",
    },
    KeyBinding {
        key: "Ctrl+C",
        description: "Force quit",
    },
];

const PLAYBACK_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "Space",
        description: "Pause / Resume",
    },
    KeyBinding {
        key: "c",
        description: "Toggle combat layer (kept across switches)",
    },
    KeyBinding {
        key: "r",
        description: "Toggle repeat segment",
    },
    KeyBinding {
        key: "Left",
        description: "Previous segment or level",
    },
    KeyBinding {
        key: "Right",
        description: "Next segment or level",
    },
];

const SEGMENT_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "s",
        description: "Open / close the segment menu",
    },
    KeyBinding {
        key: "Up / Down",
        description: "Move the highlight",
    },
    KeyBinding {
        key: "Enter",
        description: "Play the highlighted segment",
    },
    KeyBinding {
        key: "1-9",
        description: "Play segment by number",
    },
];

const GRID_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "k / Up",
        description: "Scroll up one row",
    },
    KeyBinding {
        key: "j / Down",
        description: "Scroll down one row",
    },
    KeyBinding {
        key: "PgUp / PgDn",
        description: "Scroll by a page",
    },
    KeyBinding {
        key: "Home / End",
        description: "Jump to top / bottom",
    },
];

const MOUSE_BINDINGS: &[KeyBinding] = &[
    KeyBinding {
        key: "Click tile",
        description: "Play level from its first segment",
    },
    KeyBinding {
        key: "Click button",
        description: "Pause, Combat, Repeat, Segments",
    },
    KeyBinding {
        key: "Click menu row",
        description: "Play that segment",
    },
    KeyBinding {
        key: "Scroll wheel",
        description: "Scroll the level grid",
    },
];

/// Renders the help overlay.
///
/// # Arguments
///
/// * `frame` - The frame to render to
/// * `scroll` - Vertical scroll offset, clamped to the content
///
/// # Returns
///
/// The largest scroll offset that still fills the overlay
pub fn render_help(frame: &mut Frame, scroll: u16) -> u16 {
    let area = centered_rect(70, 80, frame.area());

    // Clear the area behind the popup
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Help - Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Scrollable content
            Constraint::Length(1), // Fixed footer
        ])
        .split(inner);

    let section_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let key_style = Style::default()
        .fg(Color::LightRed)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(Color::White);

    let sections: [(&'static str, &[KeyBinding]); 5] = [
        ("General", GENERAL_BINDINGS),
        ("Playback", PLAYBACK_BINDINGS),
        ("Segment Menu", SEGMENT_BINDINGS),
        ("Level Grid", GRID_BINDINGS),
        ("Mouse Controls", MOUSE_BINDINGS),
    ];

    let mut lines: Vec<Line<'static>> = Vec::new();
    for (title, bindings) in sections {
        lines.push(Line::from(Span::styled(title, section_style)));
        for binding in bindings {
            lines.push(Line::from(vec![
                Span::styled(format!("{:16}", binding.key), key_style),
                Span::styled(binding.description, desc_style),
            ]));
        }
        lines.push(Line::from(""));
    }

    let max_scroll = (lines.len() as u16).saturating_sub(chunks[0].height);
    frame.render_widget(
        Paragraph::new(lines).scroll((scroll.min(max_scroll), 0)),
        chunks[0],
    );

    let footer = Paragraph::new(Line::from(Span::styled(
        "Scroll: Up/Down/j/k/Mouse  |  Close: ?/Esc/Click",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));
    frame.render_widget(footer, chunks[1]);

    max_scroll
}
