use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::state::{AppState, InputMode};

pub fn bindings(mode: &InputMode) -> Vec<(&'static str, &'static str)> {
    match mode {
        InputMode::NameInput => vec![("↑/↓", "saved names"), ("Enter", "start"), ("Esc", "quit")],
        InputMode::ChoiceSelect => vec![
            ("letter", "select"),
            ("↑/↓ Space", "move/select"),
            ("Enter", "answer"),
            ("Ctrl+K", "skip"),
            ("Ctrl+Q", "quit"),
        ],
        InputMode::MatchingSelect => vec![
            ("↑/↓", "row"),
            ("←/→ letter", "choose"),
            ("Enter", "answer"),
            ("Ctrl+K", "skip"),
            ("Ctrl+Q", "quit"),
        ],
        InputMode::TextInput => vec![
            ("←/→", "cursor"),
            ("Enter", "answer"),
            ("Ctrl+K", "skip"),
            ("F1", "help"),
            ("Ctrl+Q", "quit"),
        ],
        InputMode::Navigation => vec![("↑/↓", "scroll"), ("Enter", "exit")],
    }
}

pub fn draw_keybar(f: &mut Frame, area: Rect, state: &AppState) {
    let mut spans: Vec<Span> = vec![Span::raw(" ")];
    for (i, (key, action)) in bindings(&state.input_mode).iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("   "));
        }
        spans.push(Span::styled(
            key.to_string(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {}", action)));
    }

    let line = Line::from(spans);
    let widget = Paragraph::new(line).style(Style::default().bg(Color::Rgb(20, 20, 20)));
    f.render_widget(widget, area);
}
