use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::{App, Overlay};
use crate::display::{
    format_count, format_number, format_shape, format_size, group_label, leaf_label,
};
use crate::navigation::Mode;
use crate::tree::Node;

/// Draw one frame
///
/// Takes the app mutably so the scroll windows can follow the cursors.
pub fn draw(f: &mut Frame, app: &mut App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(area);

    draw_header(f, app, chunks[0]);

    let body = if app.state.show_metadata {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        draw_metadata(f, app, split[1]);
        split[0]
    } else {
        chunks[1]
    };

    match app.state.mode {
        Mode::Browse | Mode::Metadata => draw_tree(f, app, body),
        Mode::Search => draw_search(f, app, body),
    }

    draw_footer(f, app, chunks[2]);

    match app.overlay {
        Some(Overlay::Tensor(_)) => draw_detail(f, app, area),
        Some(Overlay::Metadata(_)) => draw_metadata_detail(f, app, area),
        None => {},
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let tree = app.session.tree();
    let text = Paragraph::new(Line::from(vec![
        Span::raw(" Files: "),
        Span::styled(
            format_number(app.file_count as u64),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("   Tensors: "),
        Span::styled(
            format_number(tree.tensor_count()),
            Style::default().fg(Color::Yellow).bold(),
        ),
        Span::raw("   Parameters: "),
        Span::styled(
            format_count(tree.total_parameters()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("   Size: "),
        Span::styled(
            format_size(tree.total_bytes()),
            Style::default().fg(Color::Magenta),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", app.config.title)),
    );
    f.render_widget(text, area);
}

fn draw_tree(f: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
        .title(" Tensors ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let tree = app.session.tree();
    if tree.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  No tensors found in the loaded files",
                Style::default().fg(Color::DarkGray),
            )),
        ]);
        f.render_widget(empty, inner);
        return;
    }

    let rows = app.state.rows(tree);
    app.tree_view.follow(app.state.cursor, inner.height as usize);

    let lines: Vec<Line> = rows[app.tree_view.window(rows.len())]
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let index = app.tree_view.offset + i;
            let indent = "  ".repeat(row.depth);
            let (marker, label, color) = match row.node {
                Node::Group(group) => {
                    let marker = if row.is_expanded { "▼ " } else { "▶ " };
                    (marker, group_label(group), Color::Cyan)
                },
                Node::Leaf(record) => ("  ", leaf_label(record), Color::White),
            };
            let mut style = Style::default().fg(color);
            if index == app.state.cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Line::from(Span::styled(format!("{indent}{marker}{label}"), style))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_search(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let input = Paragraph::new(Line::from(vec![
        Span::styled("/", Style::default().fg(Color::Yellow)),
        Span::raw(app.state.query.clone()),
        Span::styled("█", Style::default().fg(Color::Yellow)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Search "),
    );
    f.render_widget(input, chunks[0]);

    let title = format!(" Results ({}) ", format_number(app.state.results.len() as u64));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue))
        .title(title);
    let inner = block.inner(chunks[1]);
    f.render_widget(block, chunks[1]);

    if app.state.results.is_empty() {
        let hint = if app.state.query.is_empty() {
            "  Type to search tensor names"
        } else {
            "  No matching tensors"
        };
        f.render_widget(
            Paragraph::new(Span::styled(hint, Style::default().fg(Color::DarkGray))),
            inner,
        );
        return;
    }

    app.results_view
        .follow(app.state.result_cursor, inner.height as usize);
    let tree = app.session.tree();
    let lines: Vec<Line> = app.state.results[app.results_view.window(app.state.results.len())]
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            let index = app.results_view.offset + i;
            let mut spans = vec![Span::raw(hit.path.clone())];
            if let Some(record) = tree.find(&hit.path) {
                spans.push(Span::styled(
                    format!(
                        "  [{}, {}, {}]",
                        record.dtype,
                        format_shape(&record.shape),
                        format_size(record.byte_size)
                    ),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            let mut line = Line::from(spans);
            if index == app.state.result_cursor {
                line = line.style(Style::default().add_modifier(Modifier::REVERSED));
            }
            line
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

/// One line per entry so the scroll window maps rows to entries
fn draw_metadata(f: &mut Frame, app: &mut App, area: Rect) {
    let focused = app.state.mode == Mode::Metadata;
    let entries = app.session.metadata();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if focused {
            Color::Yellow
        } else {
            Color::DarkGray
        }))
        .title(format!(" Metadata ({}) ", format_number(entries.len() as u64)));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if entries.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled(
                "No metadata",
                Style::default().fg(Color::DarkGray),
            )),
            inner,
        );
        return;
    }

    app.metadata_view
        .follow(app.state.metadata_cursor, inner.height as usize);
    let lines: Vec<Line> = entries[app.metadata_view.window(entries.len())]
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let index = app.metadata_view.offset + i;
            let mut line = Line::from(vec![
                Span::styled(entry.key.clone(), Style::default().fg(Color::Cyan)),
                Span::raw(": "),
                Span::raw(entry.value.clone()),
            ]);
            if focused && index == app.state.metadata_cursor {
                line = line.style(Style::default().add_modifier(Modifier::REVERSED));
            }
            line
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn key(k: &str) -> Span<'_> {
    Span::styled(k, Style::default().fg(Color::Cyan))
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let spans = if app.overlay.is_some() {
        vec![key("[any key]"), Span::raw(" Close")]
    } else {
        match app.state.mode {
            Mode::Browse => vec![
                key("[↑↓]"),
                Span::raw(" Move  "),
                key("[Enter]"),
                Span::raw(" Open  "),
                key("[/]"),
                Span::raw(" Search  "),
                key("[m]"),
                Span::raw(" Metadata  "),
                key("[Tab]"),
                Span::raw(" Focus  "),
                key("[q]"),
                Span::raw(" Quit"),
            ],
            Mode::Metadata => vec![
                key("[↑↓]"),
                Span::raw(" Scroll  "),
                key("[Enter]"),
                Span::raw(" Details  "),
                key("[Tab/Esc]"),
                Span::raw(" Tree  "),
                key("[m]"),
                Span::raw(" Hide  "),
                key("[q]"),
                Span::raw(" Quit"),
            ],
            Mode::Search => vec![
                key("[↑↓]"),
                Span::raw(" Select  "),
                key("[Tab]"),
                Span::raw(" Details  "),
                key("[Enter/Esc]"),
                Span::raw(" Back  "),
                key("[Ctrl-C]"),
                Span::raw(" Quit"),
            ],
        }
    };
    let footer = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(footer, area);
}

fn draw_detail(f: &mut Frame, app: &App, area: Rect) {
    let Some(record) = app.detail() else {
        return;
    };
    let source = record
        .source()
        .map_or_else(|| "-".to_string(), |p| p.display().to_string());
    let field = |name: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("  {name:<10}"), Style::default().fg(Color::Cyan)),
            Span::raw(value),
        ])
    };
    let text = Paragraph::new(vec![
        Line::from(""),
        field("Name:", record.name.clone()),
        field("Type:", record.dtype.clone()),
        field("Shape:", format_shape(&record.shape)),
        field("Size:", format_size(record.byte_size)),
        field("Elements:", format_count(record.num_elements())),
        field("File:", source),
    ])
    .wrap(Wrap { trim: false })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Tensor "),
    );

    let popup = centered_rect(70, 11, area);
    f.render_widget(Clear, popup);
    f.render_widget(text, popup);
}

fn draw_metadata_detail(f: &mut Frame, app: &App, area: Rect) {
    let Some(entry) = app.metadata_detail() else {
        return;
    };
    let source = entry
        .source
        .as_ref()
        .map_or_else(|| "-".to_string(), |p| p.display().to_string());
    let label = |name: &'static str| {
        Span::styled(format!("  {name:<7}"), Style::default().fg(Color::Cyan))
    };
    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(vec![label("Key:"), Span::raw(entry.key.clone())]),
        Line::from(vec![label("Type:"), Span::raw(entry.value_type.clone())]),
        Line::from(vec![label("File:"), Span::raw(source)]),
        Line::from(label("Value:")),
        Line::from(format!("  {}", entry.value)),
    ])
    .wrap(Wrap { trim: false })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Metadata Details "),
    );

    let popup = centered_rect(70, 12, area);
    f.render_widget(Clear, popup);
    f.render_widget(text, popup);
}

/// Rect of `percent_x` width and `height` rows centred in `area`
fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let height = height.min(area.height);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
