use crate::app::{phase_label, App, FocusPane};
use heropick_core::{CatalogState, Millis, RevealPhase, RevealSession, Severity, MAX_SELECTION};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Alignment, Color, Line, Modifier, Span, Style, Stylize};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

const TRACK_WINDOW: usize = 2;

pub fn draw(frame: &mut Frame, app: &App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(7),
        ])
        .split(frame.area());

    draw_header(frame, root[0], app);
    draw_search(frame, root[1], app);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(root[2]);

    draw_catalog(frame, middle[0], app);
    draw_selected(frame, middle[1], app);
    draw_events(frame, root[3], app);

    if app.reveal_open() {
        draw_reveal(frame, app);
    }
    if app.show_help {
        draw_help_popup(frame);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let total = app.catalog().entities().len();
    let title = format!(
        "Hero Picker | {} heroes | Selected: {}/{} | ? help",
        total,
        app.session.selection().len(),
        MAX_SELECTION
    );
    let toast = match app.session.notification() {
        Some(note) => Line::from(Span::styled(
            note.message.clone(),
            Style::default()
                .fg(severity_color(note.severity))
                .add_modifier(Modifier::BOLD),
        )),
        None => Line::from(format!("Status: {}", app.status_line)),
    };
    let block = Block::default().borders(Borders::ALL).title("Overview");
    let paragraph = Paragraph::new(vec![Line::from(title.bold()), toast])
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(paragraph, area);
}

fn draw_search(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::raw(app.session.search_term().to_string())];
    if app.search_active {
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
    }
    if app.is_filtering() {
        spans.push(Span::styled("  filtering...", Style::default().fg(Color::DarkGray)));
    }
    let title = if app.search_active {
        "Search (Enter/Esc to leave)"
    } else {
        "Search (/ to edit, x to clear)"
    };
    let block = pane_block(title, app.search_active);
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_catalog(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == FocusPane::Catalog && !app.search_active;
    let block = pane_block("Heroes", focused);
    match app.catalog() {
        CatalogState::Loading => {
            let body = Paragraph::new("Loading heroes...")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(body, area);
            return;
        }
        CatalogState::Failed(err) => {
            let lines = vec![
                Line::from(Span::styled(
                    "Could not load heroes",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                Line::from(err.to_string()),
                Line::from(""),
                Line::from("Press R or Enter to retry"),
            ];
            let body = Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(body, area);
            return;
        }
        CatalogState::Ready(_) => {}
    }

    let visible = app.visible_catalog();
    if visible.is_empty() {
        let body = Paragraph::new("No heroes found")
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(body, area);
        return;
    }

    let mut items: Vec<ListItem> = visible
        .iter()
        .map(|hero| {
            let selected = app.session.selection().is_selected(hero);
            let marker = if selected { "[x]" } else { "[ ]" };
            let line = format!("{marker} {}", hero.name);
            if selected {
                ListItem::new(line).style(Style::default().fg(Color::Green))
            } else {
                ListItem::new(line)
            }
        })
        .collect();
    let remaining = app.remaining();
    if remaining > 0 {
        items.push(
            ListItem::new(format!("   m: load more ({remaining} remaining)"))
                .style(Style::default().fg(Color::DarkGray)),
        );
    }
    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");
    let mut state = ListState::default();
    if focused {
        state.select(Some(app.catalog_cursor.min(visible.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_selected(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == FocusPane::Selected && !app.search_active;
    let selection = app.session.selection();
    let title = format!("Selected: {}/{}", selection.len(), MAX_SELECTION);
    let block = pane_block(&title, focused);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(2)])
        .split(block.inner(area));
    frame.render_widget(block, area);

    if selection.is_empty() {
        frame.render_widget(
            Paragraph::new("Pick heroes with space").style(Style::default().fg(Color::DarkGray)),
            rows[0],
        );
    } else {
        let items: Vec<ListItem> = selection
            .items()
            .iter()
            .enumerate()
            .map(|(idx, hero)| ListItem::new(format!("{:>2}. {}", idx + 1, hero.name)))
            .collect();
        let list = List::new(items)
            .highlight_style(Style::default().fg(Color::Black).bg(Color::Yellow))
            .highlight_symbol(">> ");
        let mut state = ListState::default();
        if focused {
            state.select(Some(app.selected_cursor.min(selection.len() - 1)));
        }
        frame.render_stateful_widget(list, rows[0], &mut state);
    }

    let pick_style = if app.can_pick() {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let actions = Line::from(vec![
        Span::styled("r random pick", pick_style),
        Span::raw("  |  c clear all"),
    ]);
    frame.render_widget(Paragraph::new(actions), rows[1]);
}

fn draw_events(frame: &mut Frame, area: Rect, app: &App) {
    let capacity = area.height.saturating_sub(2) as usize;
    let start = app.event_log.len().saturating_sub(capacity);
    let lines: Vec<Line<'_>> = app
        .event_log
        .iter()
        .skip(start)
        .map(|line| Line::from(line.clone()))
        .collect();
    frame.render_widget(Paragraph::new(lines).block(pane_block("Events", false)), area);
}

fn draw_reveal(frame: &mut Frame, app: &App) {
    let area = centered_rect(70, 60, frame.area());
    frame.render_widget(Clear, area);
    let phase = app.session.reveal_phase();
    let block = Block::default()
        .title(format!("Random pick | {}", phase_label(phase)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));
    let Some(session) = app.session.reveal().session() else {
        frame.render_widget(block, area);
        return;
    };
    let now = app.now();
    let width = area.width.saturating_sub(2) as usize;

    let mut lines = vec![Line::from("")];
    lines.extend(track_lines(session, now));
    lines.push(Line::from(""));
    if phase == RevealPhase::Revealed {
        if let Some(winner) = session.displayed() {
            lines.push(confetti_line(session, now, width));
            lines.push(Line::from(Span::styled(
                winner.name.clone(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                winner.image_ref.clone(),
                Style::default().fg(Color::DarkGray),
            )));
            lines.push(Line::from(format!("round {}", session.round())));
            lines.push(confetti_line(session, now, width));
            lines.push(Line::from(""));
            lines.push(Line::from("a pick again  |  Esc/w/Enter close"));
        }
    } else {
        lines.push(Line::from(Span::styled(
            "...",
            Style::default().fg(Color::DarkGray),
        )));
        lines.push(Line::from(""));
        lines.push(Line::from("Esc/w close"));
    }
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}

fn track_lines(session: &RevealSession, now: Millis) -> Vec<Line<'static>> {
    let track = session.track();
    let len = track.len();
    let center = session.position(now);
    (0..=TRACK_WINDOW * 2)
        .map(|row| {
            let idx = (center + len * 2 + row - TRACK_WINDOW) % len;
            let name = track[idx].name.clone();
            if row == TRACK_WINDOW {
                Line::from(Span::styled(
                    format!("> {name} <"),
                    Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED),
                ))
            } else {
                Line::from(Span::styled(name, Style::default().fg(Color::Gray)))
            }
        })
        .collect()
}

fn confetti_line(session: &RevealSession, now: Millis, width: usize) -> Line<'static> {
    let Some(revealed_at) = session.revealed_at() else {
        return Line::from("");
    };
    let elapsed = now.saturating_sub(revealed_at);
    let width = width.max(1);
    let mut row = vec![' '; width];
    for particle in session.particles() {
        if particle.delay_ms > elapsed {
            continue;
        }
        let col = (particle.column as usize * width) / 100;
        row[col.min(width - 1)] = '*';
    }
    Line::from(Span::styled(
        row.into_iter().collect::<String>(),
        Style::default().fg(Color::Magenta),
    ))
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Cyan,
        Severity::Error => Color::Red,
        Severity::Success => Color::Green,
    }
}

fn draw_help_popup(frame: &mut Frame) {
    let area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, area);
    let lines = vec![
        Line::from("q quit | ? help | tab focus | arrows/jk move"),
        Line::from("space toggle hero | enter context action"),
        Line::from("/ search | x clear search | m load more"),
        Line::from("c clear selection | r random pick"),
        Line::from("during a reveal: a pick again | Esc/w close"),
        Line::from("R retry loading the catalog"),
    ];
    let block = Block::default()
        .title("Help")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let mut block = Block::default().title(title).borders(Borders::ALL);
    if focused {
        block = block.border_style(Style::default().fg(Color::Yellow));
    }
    block
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
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
