use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::state::{AppState, Dialog};

pub fn draw_dialog(f: &mut Frame, area: Rect, state: &AppState) {
    let Some(dialog) = state.top_dialog() else {
        return;
    };

    match dialog {
        Dialog::ConfirmQuit => draw_confirm_quit(f, area),
        Dialog::Notice(msg) => draw_notice(f, area, msg),
        Dialog::Help => draw_help(f, area),
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

fn render_box(f: &mut Frame, area: Rect, lines: Vec<Line<'static>>, width: u16, color: Color, title: &str) {
    let rect = centered_rect(width, lines.len() as u16 + 2, area);
    f.render_widget(Clear, rect);
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    if !title.is_empty() {
        block = block.title(format!(" {} ", title));
    }
    let widget = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(widget, rect);
}

fn draw_confirm_quit(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Leave the quiz?",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("   Your answers will not be saved."),
        Line::from(""),
        Line::from(vec![
            Span::styled("   [Enter] Leave", Style::default().fg(Color::Red)),
            Span::raw("    "),
            Span::styled("[Esc] Stay", Style::default().fg(Color::DarkGray)),
        ]),
    ];
    render_box(f, area, lines, 42, Color::Yellow, "");
}

fn draw_notice(f: &mut Frame, area: Rect, msg: &str) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("   {}", msg),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "   [any key] OK",
            Style::default().fg(Color::Green),
        )),
    ];
    render_box(f, area, lines, 40, Color::Yellow, "");
}

fn draw_help(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from("   letter     Select/toggle option"),
        Line::from("   ↑/↓        Move between options/rows"),
        Line::from("   Space      Select focused option"),
        Line::from("   ←/→        Change a match"),
        Line::from("   Enter      Answer and go on"),
        Line::from("   Ctrl+K     Skip, come back later"),
        Line::from("   Ctrl+Q     Leave the quiz"),
        Line::from("   ?  F1      This help"),
        Line::from(""),
        Line::from(Span::styled(
            "        [Esc] Close",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    render_box(f, area, lines, 44, Color::Cyan, "Help");
}
