//! ultraplayer - A terminal jukebox for layered level music.
//!
//! Reads a JSON manifest of levels, each with a thumbnail and a list of music
//! segments, and lets you browse the levels as a grid of tiles and play their
//! segments. A segment can carry a combat layer that plays in sync with the
//! free layer and is swapped in by volume.
//!
//! # Usage
//!
//! ```bash
//! cargo run                          # Load data.json from the current directory
//! cargo run -- --manifest other.json # Load another manifest
//! ```
//!
//! Press `?` for help with keyboard shortcuts.

use ultraplayer::app::App;
use ultraplayer::audio::AudioEngine;
use ultraplayer::catalog::{Catalog, DEFAULT_MANIFEST};
use ultraplayer::input::{map_key, map_mouse};
use ultraplayer::ui;

use anyhow::{Context, Result};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Frame period of the main loop.
const FRAME: Duration = Duration::from_millis(16);

/// Command-line options for the application.
struct CliOptions {
    /// Path to the level manifest.
    manifest: PathBuf,
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `--manifest <path>` or `-m <path>`: Load a manifest other than `data.json`
    /// - `--help` or `-h`: Print help and exit
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut manifest = PathBuf::from(DEFAULT_MANIFEST);
        let mut i = 1;

        while i < args.len() {
            match args[i].as_str() {
                "--manifest" | "-m" => {
                    i += 1;
                    if i >= args.len() {
                        eprintln!("Error: --manifest requires a path argument");
                        std::process::exit(1);
                    }
                    manifest = PathBuf::from(&args[i]);
                }
                "--help" | "-h" => {
                    eprintln!("ultraplayer - Terminal jukebox for layered level music");
                    eprintln!();
                    eprintln!(
                        "Usage: {} [OPTIONS]",
                        args.first().map(String::as_str).unwrap_or("ultraplayer")
                    );
                    eprintln!();
                    eprintln!("Options:");
                    eprintln!(
                        "  -m, --manifest PATH  Level manifest to load (default: {})",
                        DEFAULT_MANIFEST
                    );
                    eprintln!("  -h, --help           Print this help message");
                    eprintln!();
                    eprintln!("Set RUST_LOG=info or RUST_LOG=debug for more log output.");
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown option: {}", other);
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
            i += 1;
        }

        Ok(Self { manifest })
    }
}

fn main() -> Result<()> {
    // Parse CLI options first (before any terminal setup)
    let cli = CliOptions::parse()?;

    // Asset warnings show during the load unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Declared before the app so every sink is dropped before the device
    let mut engine = AudioEngine::new().context("Failed to open audio output")?;

    let catalog = Catalog::load(&cli.manifest, &mut engine)
        .with_context(|| format!("Failed to load manifest {}", cli.manifest.display()))?;
    info!("Ready with {} levels", catalog.len());

    let mut app = App::new(catalog);

    let mut terminal = setup_terminal().context("Failed to setup terminal")?;

    // Run main loop
    let result = run_app(&mut terminal, &mut app);

    // Stop audio before handing the terminal back
    app.player.stop();
    restore_terminal(&mut terminal).context("Failed to restore terminal")?;

    // Handle any errors from the main loop
    result
}

/// Sets up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main application loop: update, draw, then at most one input event.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Pump the active streams every frame, paused or not
        app.tick();

        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(FRAME)? {
            let action = match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => map_key(app, key),
                Event::Mouse(mouse) => map_mouse(app, mouse),
                _ => None,
            };
            if let Some(action) = action {
                if app.dispatch(action) {
                    return Ok(());
                }
            }
        }
    }
}
