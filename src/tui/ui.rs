//! Stateless UI rendering for the board, side panel and menu.

use super::app::App;
use super::menu::Menu;
use crate::status;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use shakmaty::{Color as Side, File, Piece, Rank, Square};
use strictly_chess_core::{RenderRequest, TurnState};

const LIGHT: Color = Color::Rgb(240, 217, 181);
const DARK: Color = Color::Rgb(181, 136, 99);

/// Renders the game screen.
pub fn draw(frame: &mut Frame, app: &App, request: &RenderRequest) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(12),   // Board and panel
            Constraint::Length(3), // Status
        ])
        .split(area);

    let title = Paragraph::new("Strictly Chess")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(24)])
        .split(chunks[1]);

    draw_board(frame, body[0], app, request);
    draw_panel(frame, body[1], app, request);

    let status_text = Paragraph::new(app.status_message())
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_text, chunks[2]);

    if let TurnState::GameOver(outcome) = &request.state {
        draw_banner(frame, area, &status::banner(outcome, request.human));
    }
}

fn draw_board(frame: &mut Frame, area: Rect, app: &App, request: &RenderRequest) {
    let ranks: Vec<u32> = match request.human {
        Side::White => (0..8).rev().collect(),
        Side::Black => (0..8).collect(),
    };
    let files: Vec<u32> = match request.human {
        Side::White => (0..8).collect(),
        Side::Black => (0..8).rev().collect(),
    };

    let mut lines: Vec<Line> = Vec::with_capacity(9);
    for rank in &ranks {
        let mut spans = vec![Span::raw(format!("{} ", rank + 1))];
        for file in &files {
            let square = Square::from_coords(File::new(*file), Rank::new(*rank));
            spans.push(cell(square, app, request));
        }
        lines.push(Line::from(spans));
    }
    let labels: String = files
        .iter()
        .map(|f| format!(" {} ", File::new(*f).char()))
        .collect();
    lines.push(Line::from(format!("  {}", labels)));

    let board = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Board"));
    frame.render_widget(board, center_rect(area, 30, 11));
}

fn cell(square: Square, app: &App, request: &RenderRequest) -> Span<'static> {
    let light = (square.file() as u32 + square.rank() as u32) % 2 == 1;
    let mut style = Style::default().bg(if light { LIGHT } else { DARK });

    if request.is_last_agent_move(square) {
        style = style.bg(Color::Rgb(205, 210, 106));
    }
    if request.is_destination(square) {
        style = style.bg(Color::LightGreen);
    }
    if request.selected == Some(square) {
        style = style.bg(Color::LightBlue);
    }
    if app.cursor() == square {
        style = style.bg(Color::Yellow);
    }

    let symbol = match request.piece_at(square) {
        Some(piece) => {
            style = style.fg(piece_color(piece)).add_modifier(Modifier::BOLD);
            format!(" {} ", piece.role.char().to_ascii_uppercase())
        }
        None if request.is_destination(square) => " · ".to_string(),
        None => "   ".to_string(),
    };
    Span::styled(symbol, style)
}

fn piece_color(piece: Piece) -> Color {
    match piece.color {
        Side::White => Color::White,
        Side::Black => Color::Black,
    }
}

fn draw_panel(frame: &mut Frame, area: Rect, app: &App, request: &RenderRequest) {
    let mut lines = vec![
        Line::from(format!("You: {}", status::color_name(request.human))),
        Line::from(status::turn_line(&request.state, request.to_move)),
    ];
    if let Some(left) = request.remaining {
        lines.push(Line::from(format!("Time left: {}s", left.as_secs())));
    }
    if app.promotion().is_some() {
        lines.push(Line::from(Span::styled(
            "Promote: [q]ueen [r]ook [b]ishop k[n]ight",
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from("Moves:"));
    for (i, san) in request.history_tail.iter().enumerate() {
        lines.push(Line::from(format!("  {:>2}. {}", i + 1, san)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Arrows move  Enter select  u undo  y redo",
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(Span::styled(
        "r restart  m menu  q quit",
        Style::default().fg(Color::DarkGray),
    )));

    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Game"));
    frame.render_widget(panel, area);
}

fn draw_banner(frame: &mut Frame, area: Rect, text: &str) {
    let width = (text.len() as u16 + 6).min(area.width);
    let rect = center_rect(area, width, 5);
    let banner = Paragraph::new(vec![
        Line::from(Span::styled(
            text.to_string(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from("r restart  m menu  q quit"),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title("Game over"));
    frame.render_widget(Clear, rect);
    frame.render_widget(banner, rect);
}

/// Renders the setup menu.
pub fn draw_menu(frame: &mut Frame, menu: &Menu) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(3),
        ])
        .split(area);

    let title = Paragraph::new("Strictly Chess")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    let items = vec![
        ListItem::new(format!("Play as        [ {} ]", menu.color())),
        ListItem::new(format!("Difficulty     [ {} ]", menu.difficulty())),
    ];
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("New game"))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut list_state = menu.list_state();
    frame.render_stateful_widget(list, chunks[1], &mut list_state);

    let help = Paragraph::new("↑↓ choose | ←→ change | Enter: Start | q: Quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[2]);
}

fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height.saturating_sub(height)) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width.saturating_sub(width)) / 2),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vert[1])[1]
}
