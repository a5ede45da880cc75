//! Interactive terminal browser
//!
//! ```text
//! ┌ Tensor Explorer ──────────────────────────────────────────────────┐
//! │ Files: 2   Tensors: 291   Parameters: 7.2B   Size: 13.5 GB         │
//! ├ Tensors ───────────────────────────────────┬ Metadata ────────────┤
//! │ ▼ model (291 tensors, 13.5 GB)              │ general.name  llama  │
//! │   ▶ layers (288 tensors, 12.9 GB)           │ ...                  │
//! │     norm [BF16, (4096), 8.0 KB]             │                      │
//! ├─────────────────────────────────────────────┴──────────────────────┤
//! │ [↑↓] Move  [Enter] Open  [/] Search  [m] Metadata  [Tab] Focus  [q] │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All state transitions go through [`crate::navigation::apply`]; this module
//! only decodes keys, acts on effects and draws.

mod ui;

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

use crate::error::{ExplorerError, Result};
use crate::loader::LoadReport;
use crate::navigation::{apply, Effect, InputEvent, NavigationState, Session, Viewport};
use crate::record::{MetadataEntry, TensorRecord};

pub use ui::draw;

/// TUI configuration
#[derive(Debug, Clone)]
pub struct TuiConfig {
    /// Title for the header block
    pub title: String,
    /// Input poll interval
    pub tick_rate: Duration,
    /// Open with the metadata panel visible
    pub show_metadata: bool,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            title: "Tensor Explorer".to_string(),
            tick_rate: Duration::from_millis(100),
            show_metadata: false,
        }
    }
}

/// Modal shown over the browser
#[derive(Debug, Clone, PartialEq, Eq)]
enum Overlay {
    Tensor(String),
    Metadata(usize),
}

/// Browser application state
#[derive(Debug)]
pub struct App {
    config: TuiConfig,
    session: Session,
    state: NavigationState,
    file_count: usize,
    tree_view: Viewport,
    results_view: Viewport,
    metadata_view: Viewport,
    overlay: Option<Overlay>,
    should_quit: bool,
}

impl App {
    /// Build the app from a finished load
    #[must_use]
    pub fn new(report: LoadReport, config: TuiConfig) -> Self {
        let file_count = report.file_count();
        let mut state = NavigationState::new();
        state.show_metadata = config.show_metadata;
        Self {
            config,
            session: Session::with_metadata(report.tree, report.metadata),
            state,
            file_count,
            tree_view: Viewport::default(),
            results_view: Viewport::default(),
            metadata_view: Viewport::default(),
            overlay: None,
            should_quit: false,
        }
    }

    /// Feed one input event
    ///
    /// While a detail view is open any key closes it and is otherwise
    /// ignored; `ForceQuit` still quits.
    pub fn handle_event(&mut self, event: InputEvent) {
        if self.overlay.take().is_some() {
            if event == InputEvent::ForceQuit {
                self.should_quit = true;
            }
            return;
        }

        let state = std::mem::take(&mut self.state);
        let transition = apply(state, event, &self.session);
        self.state = transition.state;
        match transition.effect {
            Some(Effect::Quit) => self.should_quit = true,
            Some(Effect::ShowDetail(name)) => self.overlay = Some(Overlay::Tensor(name)),
            Some(Effect::ShowMetadata(index)) => self.overlay = Some(Overlay::Metadata(index)),
            None => {},
        }
    }

    /// Whether the session has ended
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Current navigation state
    #[must_use]
    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    /// Tensor shown in the detail view, if open
    #[must_use]
    pub fn detail(&self) -> Option<&TensorRecord> {
        match &self.overlay {
            Some(Overlay::Tensor(name)) => self.session.tree().find(name),
            _ => None,
        }
    }

    /// Metadata entry shown in the detail view, if open
    #[must_use]
    pub fn metadata_detail(&self) -> Option<&MetadataEntry> {
        match self.overlay {
            Some(Overlay::Metadata(index)) => self.session.metadata().get(index),
            _ => None,
        }
    }

    /// Loaded file metadata
    #[must_use]
    pub fn metadata(&self) -> &[MetadataEntry] {
        self.session.metadata()
    }
}

/// Decode a crossterm key into an input event
///
/// Ctrl-C is `ForceQuit`; other control chords and unmapped keys are dropped.
#[must_use]
pub fn map_key(key: KeyEvent) -> Option<InputEvent> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => Some(InputEvent::ForceQuit),
        KeyCode::Char(_) if ctrl => None,
        KeyCode::Char(c) => Some(InputEvent::Char(c)),
        KeyCode::Up => Some(InputEvent::Up),
        KeyCode::Down => Some(InputEvent::Down),
        KeyCode::PageUp => Some(InputEvent::PageUp),
        KeyCode::PageDown => Some(InputEvent::PageDown),
        KeyCode::Home => Some(InputEvent::Home),
        KeyCode::End => Some(InputEvent::End),
        KeyCode::Enter => Some(InputEvent::Enter),
        KeyCode::Esc => Some(InputEvent::Esc),
        KeyCode::Tab => Some(InputEvent::Tab),
        KeyCode::Backspace => Some(InputEvent::Backspace),
        _ => None,
    }
}

fn terminal_error(e: io::Error) -> ExplorerError {
    ExplorerError::Terminal {
        message: e.to_string(),
    }
}

/// Run the browser until the user quits
///
/// # Errors
///
/// Returns `ExplorerError::Terminal` if the terminal cannot be set up, drawn
/// to, or restored.
pub fn run(report: LoadReport, config: TuiConfig) -> Result<()> {
    let mut app = App::new(report, config);

    enable_raw_mode().map_err(terminal_error)?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(terminal_error(e));
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(terminal) => terminal,
        Err(e) => {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            return Err(terminal_error(e));
        },
    };

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().map_err(terminal_error)?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).map_err(terminal_error)?;
    terminal.show_cursor().map_err(terminal_error)?;

    result.map_err(terminal_error)
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        if event::poll(app.config.tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(input) = map_key(key) {
                        app.handle_event(input);
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
