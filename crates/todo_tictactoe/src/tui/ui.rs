//! Stateless UI rendering.

use super::app::App;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use strum::IntoEnumIterator;
use todo_tictactoe::{Board, Mark, Phase, Position, Session, Square, Theme};

/// Renders the whole screen for the current phase.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(12),   // Body
            Constraint::Length(3), // Status
        ])
        .split(area);

    let title = Paragraph::new("Todo Tic-Tac-Toe")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    let session = app.session();
    if session.phase() == Phase::NotStarted {
        draw_menu(frame, chunks[1], session);
    } else {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(42), Constraint::Min(20)])
            .split(chunks[1]);
        draw_board(frame, body[0], session.board(), app.cursor());
        draw_side_panel(frame, body[1], app);
    }

    let status = Paragraph::new(app.status_message())
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, chunks[2]);

    if let Some((pos, task)) = session.pending_task() {
        draw_task_modal(frame, area, session, pos, task.description());
    }
}

fn draw_menu(frame: &mut Frame, area: Rect, session: &Session) {
    let settings = session.settings();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(4)])
        .split(area);

    let items: Vec<ListItem> = Theme::iter().map(|t| ListItem::new(t.label())).collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Choose Your Vibe"))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(settings.theme.ordinal()));
    frame.render_stateful_widget(list, rows[0], &mut state);

    let options = Paragraph::new(vec![
        Line::from(format!(
            "Difficulty: [ {} ]    Who Goes First? [ {} ]",
            settings.difficulty.label(),
            settings.first_player.label()
        )),
        Line::from(Span::styled(
            "↑↓: Theme | d: Difficulty | f: First player | Enter: Start | q: Quit",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(options, rows[1]);
}

fn draw_board(frame: &mut Frame, area: Rect, board: &Board, cursor: Position) {
    let board_area = center_rect(area, 40, 11);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(board_area);

    for (row, chunk) in [rows[0], rows[2], rows[4]].into_iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(12),
                Constraint::Length(1),
                Constraint::Length(12),
                Constraint::Length(1),
                Constraint::Length(12),
            ])
            .split(chunk);
        for col in 0..3 {
            if let Some(pos) = Position::from_index(row * 3 + col) {
                draw_cell(frame, cols[col * 2], board, cursor, pos);
            }
            if col < 2 {
                let sep = Paragraph::new("│").style(Style::default().fg(Color::DarkGray));
                frame.render_widget(sep, cols[col * 2 + 1]);
            }
        }
    }
    for sep_row in [rows[1], rows[3]] {
        let sep = Paragraph::new("────────────┼────────────┼────────────")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(sep, sep_row);
    }
}

fn draw_cell(frame: &mut Frame, area: Rect, board: &Board, cursor: Position, pos: Position) {
    let label = format!(" {} ", pos.to_index() + 1);
    let (symbol, base_style) = match board.get(pos) {
        Square::Empty => (label, Style::default().fg(Color::DarkGray)),
        Square::Occupied(Mark::X) => (
            " X ".to_string(),
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        ),
        Square::Occupied(Mark::O) => (
            " O ".to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };
    let style = if pos == cursor {
        base_style.bg(Color::White).fg(Color::Black)
    } else {
        base_style
    };
    let paragraph = Paragraph::new(Line::from(Span::styled(symbol, style))).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

fn draw_side_panel(frame: &mut Frame, area: Rect, app: &App) {
    let session = app.session();
    let settings = session.settings();
    let turn_style = match session.phase() {
        Phase::Finished(_) => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        Phase::OpponentTurn => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::Blue),
    };

    let mut lines = vec![
        Line::from(Span::styled(app.turn_label(), turn_style)),
        Line::from(""),
        Line::from(format!("Theme: {}", settings.theme)),
        Line::from(format!("Difficulty: {}", settings.difficulty)),
        Line::from(format!("Tasks done: {}", session.tasks().iter().filter(|(_, t)| *t.completed()).count())),
        Line::from(""),
        Line::from(Span::styled(
            "Opponent Strategy",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(session.reasoning().unwrap_or("Waiting for the first move...")),
        Line::from(""),
    ];
    let help = if app.is_stalled() {
        "m: Retry opponent | r: Forfeit | q: Quit"
    } else if session.outcome().is_some() {
        "Enter: Play again | r: Menu | q: Quit"
    } else {
        "Arrows: Move | Enter: Get task | r: Forfeit | q: Quit"
    };
    lines.push(Line::from(Span::styled(help, Style::default().fg(Color::DarkGray))));

    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(panel, area);
}

fn draw_task_modal(frame: &mut Frame, area: Rect, session: &Session, pos: Position, task: &str) {
    let modal = center_rect(area, 56, 11);
    let settings = session.settings();
    let text = vec![
        Line::from(Span::styled(
            format!("Quest for square {}", pos.to_index() + 1),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(task.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            format!("{} | {}", settings.difficulty, settings.theme),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from("Enter: Done!   Esc: I'm not ready yet"),
    ];
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Task"));
    frame.render_widget(Clear, modal);
    frame.render_widget(paragraph, modal);
}

fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(area.width.saturating_sub(width) / 2),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vert[1])[1]
}
