use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::engine::Progress;
use crate::state::AppState;

pub fn progress_text(p: &Progress) -> String {
    format!("answered {}/{} | skipped {}", p.answered, p.total, p.pending)
}

pub fn draw_statusbar(f: &mut Frame, area: Rect, state: &AppState) {
    let progress = state
        .session
        .as_ref()
        .map(|s| s.progress())
        .unwrap_or_default();

    let mut spans = vec![
        Span::raw(" "),
        Span::styled(progress_text(&progress), Style::default().fg(Color::Green)),
    ];
    if let Some(topic) = state
        .current_question()
        .map(|q| q.source_topic.as_str())
        .filter(|t| !t.is_empty())
    {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(topic.to_string(), Style::default().fg(Color::Blue)));
    }
    spans.push(Span::raw("   "));
    spans.push(Span::styled("[?] help", Style::default().fg(Color::DarkGray)));

    let widget = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Rgb(30, 30, 30)));
    f.render_widget(widget, area);
}
