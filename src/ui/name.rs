use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::state::AppState;
use crate::timer::format_duration;

pub fn draw_name_entry(f: &mut Frame, area: Rect, state: &AppState) {
    let box_width = area.width.saturating_sub(8).min(48) as usize;
    let name_padded = format!(
        "{:<width$}",
        format!("{}▏", state.name_input),
        width = box_width
    );

    let limit = match state.time_limit_secs() {
        0 => "no time limit".to_string(),
        secs => format!("time limit {}", format_duration(secs)),
    };

    let prefs = &state.prefs;
    let prompt = match (prefs.restrict_name_to_list, prefs.known_names.is_empty()) {
        (true, true) => Span::styled(
            "The name list is empty. Add names to names_base.txt.",
            Style::default().fg(Color::Yellow),
        ),
        (true, false) => Span::raw("Pick your name with ↑/↓ and press Enter to begin."),
        (false, true) => Span::raw("Type your name and press Enter to begin."),
        (false, false) => Span::raw("Type your name or pick one with ↑/↓, then press Enter."),
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "plainquiz",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("{} questions, {}", state.question_count(), limit),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(prompt),
        Line::from(""),
        Line::from(format!("┌{}┐", "─".repeat(box_width))),
        Line::from(vec![
            Span::raw("│"),
            Span::styled(name_padded, Style::default().fg(Color::Yellow)),
            Span::raw("│"),
        ]),
        Line::from(format!("└{}┘", "─".repeat(box_width))),
        Line::from(""),
        Line::from(Span::styled(
            "[↑/↓] Names    [Enter] Start    [Esc] Quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default().borders(Borders::ALL);
    let widget = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);
    f.render_widget(widget, area);
}
