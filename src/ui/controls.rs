//! Control panel rendering: transport buttons and the progress bar.

use super::{format_time, BRIGHT_RED, DARK_RED};
use crate::app::App;
use crate::playback::PlaybackState;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::Frame;

/// How a button is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ButtonLook {
    Disabled,
    Off,
    On,
}

impl ButtonLook {
    fn style(self) -> Style {
        match self {
            ButtonLook::Disabled => Style::default().fg(Color::DarkGray),
            ButtonLook::Off => Style::default().fg(Color::White).bg(DARK_RED),
            ButtonLook::On => Style::default()
                .fg(Color::White)
                .bg(BRIGHT_RED)
                .add_modifier(Modifier::BOLD),
        }
    }
}

fn render_button(frame: &mut Frame, area: Rect, label: &str, look: ButtonLook) {
    let border = match look {
        ButtonLook::Disabled => Style::default().fg(Color::DarkGray),
        _ => Style::default().fg(BRIGHT_RED),
    };
    let button = Paragraph::new(label)
        .alignment(Alignment::Center)
        .style(look.style())
        .block(Block::default().borders(Borders::ALL).border_style(border));
    frame.render_widget(button, area);
}

/// Renders the control panel into the button regions recorded in the
/// layout. `area` is the whole panel.
pub fn render_controls(frame: &mut Frame, area: Rect, app: &App) {
    let area = area.intersection(frame.area());
    if area.is_empty() {
        return;
    }
    let layout = &app.layout;
    let player = &app.player;
    let state = player.state();

    let (pause_label, pause_look) = match state {
        PlaybackState::Idle => ("Pause", ButtonLook::Disabled),
        PlaybackState::Playing => ("Pause", ButtonLook::Off),
        PlaybackState::Paused => ("Resume", ButtonLook::On),
    };
    render_button(frame, layout.pause_button, pause_label, pause_look);

    let combat_look = if !player.combat_available() {
        ButtonLook::Disabled
    } else if player.persistent_combat() {
        ButtonLook::On
    } else {
        ButtonLook::Off
    };
    render_button(frame, layout.combat_button, "Combat", combat_look);

    let repeat_look = if player.repeat_segment() {
        ButtonLook::On
    } else {
        ButtonLook::Off
    };
    render_button(frame, layout.repeat_button, "Repeat", repeat_look);

    let segments_look = if app.segment_menu.open {
        ButtonLook::On
    } else if app.segment_menu_available() {
        ButtonLook::Off
    } else {
        ButtonLook::Disabled
    };
    render_button(frame, layout.segments_button, "Segments", segments_look);

    render_progress(frame, layout.progress_bar, app);
}

fn render_progress(frame: &mut Frame, area: Rect, app: &App) {
    let (ratio, label) = match app.player.progress() {
        Some((played, length)) => {
            let ratio = match length {
                Some(length) if !length.is_zero() => {
                    (played.as_secs_f64() / length.as_secs_f64()).clamp(0.0, 1.0)
                }
                _ => 0.0,
            };
            let label = format!("{} / {}", format_time(Some(played)), format_time(length));
            (ratio, label)
        }
        None => (0.0, String::from("--:-- / --:--")),
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(DARK_RED)),
        )
        .gauge_style(Style::default().fg(BRIGHT_RED).bg(Color::Black))
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, area);
}
