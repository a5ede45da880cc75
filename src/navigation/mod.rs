//! Browse/search navigation state machine
//!
//! The whole interactive session is an explicit [`NavigationState`] value
//! advanced by the pure function [`apply`]. Anything the state machine
//! cannot do itself (opening a detail view, quitting) comes back as an
//! [`Effect`] for the caller to act on.
//!
//! ```text
//!            '/'                         Enter | Esc
//!   Browse ───────> Search ─────────────────────────> Browse
//!     │  ^            │ Char(c) / Backspace
//!     │  │            ├──> Search (query edited, results re-ranked)
//!     │  │            └── Tab ──> Effect::ShowDetail(highlighted hit)
//!     │  └── Up/Down/PgUp/PgDn/Home/End, Enter/Space (toggle group)
//!     ├── Tab ──> Metadata ── Tab | Esc | 'm' ──> Browse
//!     │             └── Enter/Space ──> Effect::ShowMetadata(entry)
//!     └── 'q' / ForceQuit ──> Effect::Quit
//! ```
//!
//! Whether a character is a command or query text depends only on the mode:
//! in Search every `Char` is text, including `q`, `/`, `m` and space.

use std::collections::HashSet;

use crate::flatten::{flatten, position_of, VisibleRow};
use crate::record::MetadataEntry;
use crate::search::{SearchHit, SearchIndex};
use crate::tree::{Node, TensorTree};

/// Rows moved by PageUp / PageDown
pub const PAGE_STEP: usize = 10;

/// Discrete input, already decoded from raw key events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Cursor up
    Up,
    /// Cursor down
    Down,
    /// Cursor up by a page
    PageUp,
    /// Cursor down by a page
    PageDown,
    /// First row
    Home,
    /// Last row
    End,
    /// Enter / Return
    Enter,
    /// Escape
    Esc,
    /// Tab: focus the metadata panel, or open the highlighted search hit
    Tab,
    /// Delete the last query character
    Backspace,
    /// A printable character (space included)
    Char(char),
    /// Quit regardless of mode (Ctrl-C)
    ForceQuit,
}

/// Interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Tree browsing
    #[default]
    Browse,
    /// Live fuzzy search
    Search,
    /// Metadata panel focused
    Metadata,
}

/// Side effect requested from the renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Show the detail view for the named tensor
    ShowDetail(String),
    /// Show the detail view for the metadata entry at this index
    ShowMetadata(usize),
    /// End the session
    Quit,
}

/// Immutable data the state machine navigates
#[derive(Debug)]
pub struct Session {
    tree: TensorTree,
    index: SearchIndex,
    metadata: Vec<MetadataEntry>,
}

impl Session {
    /// Take ownership of a fully loaded tree and index it
    #[must_use]
    pub fn new(tree: TensorTree) -> Self {
        Self::with_metadata(tree, Vec::new())
    }

    /// Like [`Session::new`], also holding the loaded files' metadata
    #[must_use]
    pub fn with_metadata(tree: TensorTree, metadata: Vec<MetadataEntry>) -> Self {
        let index = SearchIndex::build(&tree);
        Self {
            tree,
            index,
            metadata,
        }
    }

    /// The merged tree
    #[must_use]
    pub fn tree(&self) -> &TensorTree {
        &self.tree
    }

    /// The search index over the tree
    #[must_use]
    pub fn index(&self) -> &SearchIndex {
        debug_assert!(!self.index.is_stale(&self.tree));
        &self.index
    }

    /// File metadata, in load order
    #[must_use]
    pub fn metadata(&self) -> &[MetadataEntry] {
        &self.metadata
    }
}

/// Per-session navigation state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationState {
    /// Cursor into the visible rows (Browse mode)
    pub cursor: usize,
    /// Paths of expanded groups
    pub expanded: HashSet<String>,
    /// Current mode
    pub mode: Mode,
    /// Search query (Search mode)
    pub query: String,
    /// Ranked results for `query`
    pub results: Vec<SearchHit>,
    /// Highlighted entry in `results`
    pub result_cursor: usize,
    /// Whether the file metadata panel is shown
    pub show_metadata: bool,
    /// Highlighted entry in the metadata panel
    pub metadata_cursor: usize,
}

impl NavigationState {
    /// Initial state: Browse, fully collapsed, cursor on the first row
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible rows for the current expansion state
    #[must_use]
    pub fn rows<'t>(&self, tree: &'t TensorTree) -> Vec<VisibleRow<'t>> {
        flatten(tree.root(), &self.expanded)
    }

    /// Row under the cursor
    #[must_use]
    pub fn selected<'t>(&self, tree: &'t TensorTree) -> Option<VisibleRow<'t>> {
        self.rows(tree).get(self.cursor).copied()
    }

    /// Highlighted search result
    #[must_use]
    pub fn selected_result(&self) -> Option<&SearchHit> {
        self.results.get(self.result_cursor)
    }
}

/// Result of one transition
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// State after the event
    pub state: NavigationState,
    /// Side effect for the caller, if any
    pub effect: Option<Effect>,
}

impl Transition {
    fn to(state: NavigationState) -> Self {
        Self {
            state,
            effect: None,
        }
    }

    fn with(state: NavigationState, effect: Effect) -> Self {
        Self {
            state,
            effect: Some(effect),
        }
    }
}

/// Advance `state` by one input event
#[must_use]
pub fn apply(state: NavigationState, event: InputEvent, session: &Session) -> Transition {
    if event == InputEvent::ForceQuit {
        return Transition::with(state, Effect::Quit);
    }
    match state.mode {
        Mode::Browse => browse(state, event, session),
        Mode::Search => search(state, event, session),
        Mode::Metadata => metadata(state, event, session.metadata().len()),
    }
}

fn enter_search(state: &mut NavigationState) {
    state.mode = Mode::Search;
    state.query.clear();
    state.results.clear();
    state.result_cursor = 0;
}

fn browse(mut state: NavigationState, event: InputEvent, session: &Session) -> Transition {
    let tree = session.tree();
    let len = state.rows(tree).len();
    match event {
        InputEvent::Up => state.cursor = step_back(state.cursor, 1),
        InputEvent::Down => state.cursor = step_forward(state.cursor, 1, len),
        InputEvent::PageUp => state.cursor = step_back(state.cursor, PAGE_STEP),
        InputEvent::PageDown => state.cursor = step_forward(state.cursor, PAGE_STEP, len),
        InputEvent::Home => state.cursor = 0,
        InputEvent::End => state.cursor = len.saturating_sub(1),
        InputEvent::Enter | InputEvent::Char(' ') => return activate(state, tree),
        InputEvent::Char('/') => enter_search(&mut state),
        InputEvent::Char('q') => return Transition::with(state, Effect::Quit),
        InputEvent::Char('m') => state.show_metadata = !state.show_metadata,
        InputEvent::Tab => {
            // The panel opens if hidden; with nothing to list it stays unfocused
            if !session.metadata().is_empty() {
                state.show_metadata = true;
                state.mode = Mode::Metadata;
            }
        },
        InputEvent::Esc
        | InputEvent::Backspace
        | InputEvent::Char(_)
        | InputEvent::ForceQuit => {},
    }
    state.cursor = clamp_cursor(state.cursor, len);
    Transition::to(state)
}

/// Enter / Space on the cursor row: toggle a group, or ask for leaf details
fn activate(mut state: NavigationState, tree: &TensorTree) -> Transition {
    let rows = state.rows(tree);
    let Some(row) = rows.get(state.cursor) else {
        state.cursor = clamp_cursor(state.cursor, rows.len());
        return Transition::to(state);
    };
    match row.node {
        Node::Leaf(record) => {
            let effect = Effect::ShowDetail(record.name.clone());
            Transition::with(state, effect)
        },
        Node::Group(group) => {
            let id = row.id();
            let path = group.path().to_string();
            if !state.expanded.remove(&path) {
                state.expanded.insert(path);
            }
            let rows = state.rows(tree);
            state.cursor = position_of(&rows, &id)
                .unwrap_or_else(|| clamp_cursor(state.cursor, rows.len()));
            Transition::to(state)
        },
    }
}

fn search(mut state: NavigationState, event: InputEvent, session: &Session) -> Transition {
    match event {
        InputEvent::Char(c) => {
            state.query.push(c);
            refresh_results(&mut state, session.index());
        },
        InputEvent::Backspace => {
            if state.query.pop().is_some() {
                refresh_results(&mut state, session.index());
            }
        },
        InputEvent::Up => state.result_cursor = step_back(state.result_cursor, 1),
        InputEvent::Down => {
            state.result_cursor = step_forward(state.result_cursor, 1, state.results.len());
        },
        InputEvent::PageUp => state.result_cursor = step_back(state.result_cursor, PAGE_STEP),
        InputEvent::PageDown => {
            state.result_cursor =
                step_forward(state.result_cursor, PAGE_STEP, state.results.len());
        },
        InputEvent::Home => state.result_cursor = 0,
        InputEvent::End => state.result_cursor = state.results.len().saturating_sub(1),
        InputEvent::Tab => {
            if let Some(hit) = state.selected_result() {
                let effect = Effect::ShowDetail(hit.path.clone());
                return Transition::with(state, effect);
            }
        },
        InputEvent::Enter | InputEvent::Esc => {
            state.mode = Mode::Browse;
            state.query.clear();
            state.results.clear();
            state.result_cursor = 0;
            let len = state.rows(session.tree()).len();
            if state.cursor >= len {
                state.cursor = 0;
            }
        },
        InputEvent::ForceQuit => return Transition::with(state, Effect::Quit),
    }
    Transition::to(state)
}

fn metadata(mut state: NavigationState, event: InputEvent, len: usize) -> Transition {
    match event {
        InputEvent::Up => state.metadata_cursor = step_back(state.metadata_cursor, 1),
        InputEvent::Down => state.metadata_cursor = step_forward(state.metadata_cursor, 1, len),
        InputEvent::PageUp => state.metadata_cursor = step_back(state.metadata_cursor, PAGE_STEP),
        InputEvent::PageDown => {
            state.metadata_cursor = step_forward(state.metadata_cursor, PAGE_STEP, len);
        },
        InputEvent::Home => state.metadata_cursor = 0,
        InputEvent::End => state.metadata_cursor = len.saturating_sub(1),
        InputEvent::Enter | InputEvent::Char(' ') => {
            if state.metadata_cursor < len {
                let effect = Effect::ShowMetadata(state.metadata_cursor);
                return Transition::with(state, effect);
            }
        },
        InputEvent::Tab | InputEvent::Esc => state.mode = Mode::Browse,
        InputEvent::Char('m') => {
            state.show_metadata = false;
            state.mode = Mode::Browse;
        },
        InputEvent::Char('/') => enter_search(&mut state),
        InputEvent::Char('q') | InputEvent::ForceQuit => {
            return Transition::with(state, Effect::Quit);
        },
        InputEvent::Backspace | InputEvent::Char(_) => {},
    }
    state.metadata_cursor = clamp_cursor(state.metadata_cursor, len);
    Transition::to(state)
}

fn refresh_results(state: &mut NavigationState, index: &SearchIndex) {
    state.results = index.search(&state.query);
    state.result_cursor = 0;
}

fn step_back(cursor: usize, by: usize) -> usize {
    cursor.saturating_sub(by)
}

fn step_forward(cursor: usize, by: usize, len: usize) -> usize {
    cursor.saturating_add(by).min(len.saturating_sub(1))
}

fn clamp_cursor(cursor: usize, len: usize) -> usize {
    cursor.min(len.saturating_sub(1))
}

/// Scroll window that keeps the cursor on screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    /// Index of the first visible row
    pub offset: usize,
    /// Number of rows that fit on screen
    pub height: usize,
}

impl Viewport {
    /// Move the window the minimum amount needed to show `cursor`
    pub fn follow(&mut self, cursor: usize, height: usize) {
        self.height = height;
        if height == 0 {
            self.offset = cursor;
            return;
        }
        if cursor < self.offset {
            self.offset = cursor;
        } else if cursor >= self.offset + height {
            self.offset = cursor + 1 - height;
        }
    }

    /// Visible index range for a list of `len` rows
    #[must_use]
    pub fn window(&self, len: usize) -> std::ops::Range<usize> {
        let start = self.offset.min(len);
        let end = start.saturating_add(self.height).min(len);
        start..end
    }
}

#[cfg(test)]
mod tests;
