use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::report;
use crate::state::AppState;

pub fn draw_finished(f: &mut Frame, area: Rect, state: &AppState) {
    let Some(result) = state.result.as_ref() else {
        return;
    };

    let (verdict, color) = if result.passed {
        ("✓ PASSED", Color::Green)
    } else {
        ("✗ FAILED", Color::Red)
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", verdict),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    lines.extend(
        report::summary(result, &state.prefs.grade_mode)
            .lines()
            .map(|l| Line::from(format!("  {}", l))),
    );
    if let Some(delivery) = &state.delivery {
        lines.push(Line::from(Span::styled(
            format!("  {}", delivery),
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Mistakes",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));
    lines.extend(
        report::mistakes(result)
            .lines()
            .map(|l| Line::from(format!("  {}", l))),
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Result  [↑/↓] scroll  [Enter] exit ");
    let widget = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((state.result_scroll.min(u16::MAX as usize) as u16, 0));
    f.render_widget(widget, area);
}
