use super::*;
use crate::record::{MetadataEntry, TensorRecord};

fn session_of(names: &[&str]) -> Session {
    Session::new(TensorTree::from_records(
        names
            .iter()
            .map(|n| TensorRecord::new(*n, "F32", vec![4], 16)),
    ))
}

fn session_with_metadata(names: &[&str], keys: usize) -> Session {
    Session::with_metadata(
        TensorTree::from_records(
            names
                .iter()
                .map(|n| TensorRecord::new(*n, "F32", vec![4], 16)),
        ),
        (0..keys)
            .map(|i| MetadataEntry::new(format!("key.{i}"), "v", "STRING"))
            .collect(),
    )
}

fn row_paths(state: &NavigationState, session: &Session) -> Vec<String> {
    state
        .rows(session.tree())
        .iter()
        .map(|r| r.node.path().to_string())
        .collect()
}

fn press(state: NavigationState, events: &[InputEvent], session: &Session) -> NavigationState {
    events
        .iter()
        .fold(state, |s, e| apply(s, *e, session).state)
}

fn typed(text: &str) -> Vec<InputEvent> {
    text.chars().map(InputEvent::Char).collect()
}

fn cursor_path(state: &NavigationState, session: &Session) -> String {
    state
        .selected(session.tree())
        .map(|row| row.node.path().to_string())
        .unwrap_or_default()
}

#[test]
fn test_initial_state() {
    let state = NavigationState::new();
    assert_eq!(state.mode, Mode::Browse);
    assert_eq!(state.cursor, 0);
    assert!(state.expanded.is_empty());
    assert!(!state.show_metadata);
}

#[test]
fn test_cursor_clamps_without_wrapping() {
    let session = session_of(&["a", "b", "c"]);
    let state = press(NavigationState::new(), &[InputEvent::Up], &session);
    assert_eq!(state.cursor, 0);
    let state = press(
        state,
        &[InputEvent::Down, InputEvent::Down, InputEvent::Down, InputEvent::Down],
        &session,
    );
    assert_eq!(state.cursor, 2);
}

#[test]
fn test_page_home_end() {
    let names: Vec<String> = (0..25).map(|i| format!("t{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let session = session_of(&refs);

    let state = press(NavigationState::new(), &[InputEvent::PageDown], &session);
    assert_eq!(state.cursor, PAGE_STEP);
    let state = press(state, &[InputEvent::End], &session);
    assert_eq!(state.cursor, 24);
    let state = press(state, &[InputEvent::PageDown], &session);
    assert_eq!(state.cursor, 24);
    let state = press(state, &[InputEvent::PageUp], &session);
    assert_eq!(state.cursor, 24 - PAGE_STEP);
    let state = press(state, &[InputEvent::Home], &session);
    assert_eq!(state.cursor, 0);
}

#[test]
fn test_empty_tree_navigation_is_harmless() {
    let session = session_of(&[]);
    let state = press(
        NavigationState::new(),
        &[InputEvent::Down, InputEvent::End, InputEvent::Enter, InputEvent::PageDown],
        &session,
    );
    assert_eq!(state.cursor, 0);
    assert!(state.expanded.is_empty());
}

#[test]
fn test_enter_toggles_group_and_keeps_cursor() {
    let session = session_of(&["a.x", "a.y", "b.z"]);
    let state = press(NavigationState::new(), &[InputEvent::Down], &session);
    assert_eq!(cursor_path(&state, &session), "b");

    let t = apply(state, InputEvent::Enter, &session);
    assert!(t.effect.is_none());
    assert!(t.state.expanded.contains("b"));
    assert_eq!(cursor_path(&t.state, &session), "b");

    let state = press(t.state, &[InputEvent::Home], &session);
    let before = row_paths(&state, &session);
    assert_eq!(before, vec!["a", "b", "b.z"]);

    let state = press(state, &[InputEvent::Char(' ')], &session);
    assert!(state.expanded.contains("a"));
    assert_eq!(row_paths(&state, &session), vec!["a", "a.x", "a.y", "b", "b.z"]);
    assert_eq!(cursor_path(&state, &session), "a");

    // Toggling twice restores the exact row sequence and cursor
    let state = press(state, &[InputEvent::Enter], &session);
    assert!(!state.expanded.contains("a"));
    assert_eq!(row_paths(&state, &session), before);
    assert_eq!(cursor_path(&state, &session), "a");
}

#[test]
fn test_enter_on_leaf_requests_detail() {
    let session = session_of(&["emb", "h.0.w"]);
    let t = apply(NavigationState::new(), InputEvent::Enter, &session);
    assert_eq!(t.effect, Some(Effect::ShowDetail("emb".to_string())));
    assert_eq!(t.state.cursor, 0);
}

#[test]
fn test_expanding_group_in_the_middle() {
    // h.0.w / h.1.w example: expand h, then h.1, cursor stays on h.1
    let session = session_of(&["h.0.w", "h.1.w"]);
    let state = press(
        NavigationState::new(),
        &[InputEvent::Enter, InputEvent::Down, InputEvent::Down],
        &session,
    );
    assert_eq!(cursor_path(&state, &session), "h.1");
    let state = press(state, &[InputEvent::Enter], &session);
    let paths: Vec<&str> = state
        .rows(session.tree())
        .iter()
        .map(|r| r.node.path())
        .collect();
    assert_eq!(paths, vec!["h", "h.0", "h.1", "h.1.w"]);
    assert_eq!(state.cursor, 2);
}

#[test]
fn test_quit_only_in_browse() {
    let session = session_of(&["a"]);
    let t = apply(NavigationState::new(), InputEvent::Char('q'), &session);
    assert_eq!(t.effect, Some(Effect::Quit));

    let state = press(NavigationState::new(), &[InputEvent::Char('/')], &session);
    let t = apply(state, InputEvent::Char('q'), &session);
    assert!(t.effect.is_none());
    assert_eq!(t.state.query, "q");
}

#[test]
fn test_force_quit_in_any_mode() {
    let session = session_of(&["a"]);
    let t = apply(NavigationState::new(), InputEvent::ForceQuit, &session);
    assert_eq!(t.effect, Some(Effect::Quit));

    let state = press(NavigationState::new(), &[InputEvent::Char('/')], &session);
    let t = apply(state, InputEvent::ForceQuit, &session);
    assert_eq!(t.effect, Some(Effect::Quit));
}

#[test]
fn test_metadata_toggle() {
    let session = session_of(&["a"]);
    let state = press(NavigationState::new(), &[InputEvent::Char('m')], &session);
    assert!(state.show_metadata);
    let state = press(state, &[InputEvent::Char('m')], &session);
    assert!(!state.show_metadata);
}

#[test]
fn test_esc_in_browse_is_noop() {
    let session = session_of(&["a", "b"]);
    let state = press(NavigationState::new(), &[InputEvent::Down], &session);
    let t = apply(state.clone(), InputEvent::Esc, &session);
    assert_eq!(t.state, state);
    assert!(t.effect.is_none());
}

#[test]
fn test_search_command_chars_are_query_text() {
    let session = session_of(&["a/q m"]);
    let mut events = vec![InputEvent::Char('/')];
    events.extend(typed("q/m "));
    let state = press(NavigationState::new(), &events, &session);
    assert_eq!(state.mode, Mode::Search);
    assert_eq!(state.query, "q/m ");
    assert!(!state.show_metadata);
}

#[test]
fn test_search_results_follow_query() {
    let session = session_of(&["model.norm.weight", "lm_head.weight", "h.0.attn"]);
    let mut events = vec![InputEvent::Char('/')];
    events.extend(typed("norm"));
    let state = press(NavigationState::new(), &events, &session);
    assert_eq!(state.results.len(), 1);
    assert_eq!(state.results[0].path, "model.norm.weight");

    let state = press(
        state,
        &[
            InputEvent::Backspace,
            InputEvent::Backspace,
            InputEvent::Backspace,
            InputEvent::Backspace,
        ],
        &session,
    );
    assert!(state.query.is_empty());
    assert!(state.results.is_empty());

    // extra backspace on an empty query stays empty
    let state = press(state, &[InputEvent::Backspace], &session);
    assert!(state.query.is_empty());
    assert_eq!(state.mode, Mode::Search);
}

#[test]
fn test_search_result_cursor_clamps() {
    let session = session_of(&["a.w", "b.w", "c.w"]);
    let mut events = vec![InputEvent::Char('/'), InputEvent::Char('w')];
    events.extend([InputEvent::Down; 5]);
    let state = press(NavigationState::new(), &events, &session);
    assert_eq!(state.results.len(), 3);
    assert_eq!(state.result_cursor, 2);
    let state = press(state, &[InputEvent::Up; 5], &session);
    assert_eq!(state.result_cursor, 0);
}

#[test]
fn test_editing_query_resets_result_cursor() {
    let session = session_of(&["a.w", "b.w"]);
    let state = press(
        NavigationState::new(),
        &[InputEvent::Char('/'), InputEvent::Char('w'), InputEvent::Down],
        &session,
    );
    assert_eq!(state.result_cursor, 1);
    let state = press(state, &[InputEvent::Backspace], &session);
    assert_eq!(state.result_cursor, 0);
}

#[test]
fn test_leaving_search_restores_browse() {
    let session = session_of(&["a.x", "b.y", "c.z"]);
    let before = press(NavigationState::new(), &[InputEvent::End], &session);
    assert_eq!(before.cursor, 2);

    for exit in [InputEvent::Enter, InputEvent::Esc] {
        let mut events = vec![InputEvent::Char('/')];
        events.extend(typed("xyz"));
        events.push(exit);
        let state = press(before.clone(), &events, &session);
        assert_eq!(state.mode, Mode::Browse);
        assert!(state.query.is_empty());
        assert!(state.results.is_empty());
        assert_eq!(state.cursor, 2);
    }
}

#[test]
fn test_leaving_search_resets_out_of_range_cursor() {
    let session = session_of(&["a", "b"]);
    let state = NavigationState {
        cursor: 7,
        mode: Mode::Search,
        ..NavigationState::new()
    };
    let state = press(state, &[InputEvent::Esc], &session);
    assert_eq!(state.cursor, 0);
}

#[test]
fn test_reentering_search_starts_empty() {
    let session = session_of(&["a.w"]);
    let state = press(
        NavigationState::new(),
        &[InputEvent::Char('/'), InputEvent::Char('w'), InputEvent::Esc, InputEvent::Char('/')],
        &session,
    );
    assert_eq!(state.mode, Mode::Search);
    assert!(state.query.is_empty());
    assert!(state.results.is_empty());
}

#[test]
fn test_viewport_follows_cursor() {
    let mut vp = Viewport::default();
    vp.follow(0, 5);
    assert_eq!(vp.window(20), 0..5);
    vp.follow(4, 5);
    assert_eq!(vp.offset, 0);
    vp.follow(7, 5);
    assert_eq!(vp.offset, 3);
    assert_eq!(vp.window(20), 3..8);
    vp.follow(1, 5);
    assert_eq!(vp.offset, 1);
}

#[test]
fn test_viewport_short_list() {
    let mut vp = Viewport::default();
    vp.follow(2, 10);
    assert_eq!(vp.window(3), 0..3);
    assert_eq!(vp.window(0), 0..0);
}

#[test]
fn test_tab_focuses_metadata_panel() {
    let session = session_with_metadata(&["a"], 3);
    let t = apply(NavigationState::new(), InputEvent::Tab, &session);
    assert!(t.effect.is_none());
    assert_eq!(t.state.mode, Mode::Metadata);
    assert!(t.state.show_metadata);
    assert_eq!(t.state.metadata_cursor, 0);

    let state = press(t.state, &[InputEvent::Tab], &session);
    assert_eq!(state.mode, Mode::Browse);
    assert!(state.show_metadata);
}

#[test]
fn test_tab_without_metadata_stays_in_browse() {
    let session = session_of(&["a"]);
    let state = press(NavigationState::new(), &[InputEvent::Tab], &session);
    assert_eq!(state.mode, Mode::Browse);
    assert!(!state.show_metadata);
}

#[test]
fn test_metadata_cursor_moves_and_clamps() {
    let session = session_with_metadata(&["a"], 25);
    let state = press(
        NavigationState::new(),
        &[InputEvent::Tab, InputEvent::Up, InputEvent::PageDown],
        &session,
    );
    assert_eq!(state.metadata_cursor, PAGE_STEP);
    let state = press(state, &[InputEvent::End, InputEvent::Down], &session);
    assert_eq!(state.metadata_cursor, 24);
    let state = press(state, &[InputEvent::PageUp, InputEvent::Home], &session);
    assert_eq!(state.metadata_cursor, 0);
    // The tree cursor is untouched while the panel has focus
    assert_eq!(state.cursor, 0);
}

#[test]
fn test_enter_on_metadata_entry_requests_detail() {
    let session = session_with_metadata(&["a"], 4);
    let state = press(
        NavigationState::new(),
        &[InputEvent::Tab, InputEvent::Down, InputEvent::Down],
        &session,
    );
    let t = apply(state, InputEvent::Enter, &session);
    assert_eq!(t.effect, Some(Effect::ShowMetadata(2)));
    assert_eq!(t.state.mode, Mode::Metadata);
}

#[test]
fn test_leaving_metadata_focus() {
    let session = session_with_metadata(&["a"], 2);
    let focused = press(NavigationState::new(), &[InputEvent::Tab], &session);

    let state = press(focused.clone(), &[InputEvent::Esc], &session);
    assert_eq!(state.mode, Mode::Browse);
    assert!(state.show_metadata);

    let state = press(focused.clone(), &[InputEvent::Char('m')], &session);
    assert_eq!(state.mode, Mode::Browse);
    assert!(!state.show_metadata);

    let state = press(focused.clone(), &[InputEvent::Char('/')], &session);
    assert_eq!(state.mode, Mode::Search);

    let t = apply(focused, InputEvent::Char('q'), &session);
    assert_eq!(t.effect, Some(Effect::Quit));
}

#[test]
fn test_tab_in_search_opens_highlighted_hit() {
    let session = session_of(&["a.w", "b.w", "c.w"]);
    let state = press(
        NavigationState::new(),
        &[InputEvent::Char('/'), InputEvent::Char('w'), InputEvent::Down],
        &session,
    );
    let expected = state.selected_result().map(|h| h.path.clone());
    assert_eq!(expected.as_deref(), Some("b.w"));

    let t = apply(state, InputEvent::Tab, &session);
    assert_eq!(t.effect, Some(Effect::ShowDetail("b.w".to_string())));
    // Search stays open with its query and results
    assert_eq!(t.state.mode, Mode::Search);
    assert_eq!(t.state.query, "w");
    assert_eq!(t.state.result_cursor, 1);
}

#[test]
fn test_tab_in_search_without_results_is_noop() {
    let session = session_of(&["a.w"]);
    let state = press(NavigationState::new(), &[InputEvent::Char('/')], &session);
    assert!(state.selected_result().is_none());
    let t = apply(state.clone(), InputEvent::Tab, &session);
    assert!(t.effect.is_none());
    assert_eq!(t.state, state);
}
