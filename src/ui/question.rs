use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::model::{Question, QuestionKind};
use crate::state::AppState;
use crate::ui::markdown::text_to_lines;

fn kind_label(kind: QuestionKind) -> &'static str {
    match kind {
        QuestionKind::Single => "one answer",
        QuestionKind::Multiple => "several answers",
        QuestionKind::Matching => "match the pairs",
        QuestionKind::FreeForm => "type the answer",
    }
}

pub fn draw_question(f: &mut Frame, area: Rect, state: &AppState) {
    let Some(question) = state.current_question() else {
        return;
    };

    let mut lines: Vec<Line<'static>> = Vec::new();
    lines.push(Line::from(Span::styled(
        format!("({})", kind_label(question.kind())),
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(""));
    lines.extend(text_to_lines(&question.text));

    if !question.images.is_empty() {
        lines.push(Line::from(""));
        lines.extend(image_lines(question));
    }

    lines.push(Line::from(""));
    lines.extend(match question.kind() {
        QuestionKind::Single | QuestionKind::Multiple => choice_lines(question, state),
        QuestionKind::Matching => matching_lines(question, state),
        QuestionKind::FreeForm => input_lines(state, area.width),
    });

    // Keep the focused row in view
    let focus_line = lines.len().saturating_sub(answer_rows(question, state)) + state.choice_cursor;
    let visible = area.height.saturating_sub(2) as usize;
    let scroll = focus_line.saturating_sub(visible.saturating_sub(1));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let widget = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll.min(u16::MAX as usize) as u16, 0));
    f.render_widget(widget, area);
}

fn answer_rows(question: &Question, state: &AppState) -> usize {
    match question.kind() {
        QuestionKind::Single | QuestionKind::Multiple => question.choices.len(),
        QuestionKind::Matching => state.matching.len() + question.matching_sides().1.len() + 2,
        QuestionKind::FreeForm => 3,
    }
}

fn image_lines(question: &Question) -> Vec<Line<'static>> {
    question
        .images
        .iter()
        .map(|img| {
            let mut spans = vec![
                Span::styled("  ▣ ", Style::default().fg(Color::Cyan)),
                Span::raw(img.caption.clone()),
                Span::styled(
                    format!("  {}", img.path.display()),
                    Style::default().fg(Color::DarkGray),
                ),
            ];
            if img.is_missing() {
                spans.push(Span::styled(
                    "  (missing)",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ));
            }
            Line::from(spans)
        })
        .collect()
}

fn choice_lines(question: &Question, state: &AppState) -> Vec<Line<'static>> {
    let multiple = question.kind() == QuestionKind::Multiple;
    question
        .choices
        .iter()
        .enumerate()
        .map(|(i, choice)| {
            let selected = state.selected.contains(&choice.label);
            let marker = match (multiple, selected) {
                (true, true) => "[x]",
                (true, false) => "[ ]",
                (false, true) => "(●)",
                (false, false) => "( )",
            };
            let mut style = if selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            if i == state.choice_cursor {
                style = style.bg(Color::Rgb(40, 40, 60));
            }
            Line::from(vec![
                Span::raw("  "),
                Span::styled(format!("{} {}", marker, choice), style),
            ])
        })
        .collect()
}

fn matching_lines(question: &Question, state: &AppState) -> Vec<Line<'static>> {
    let (rows, candidates) = question.matching_sides();
    let mut lines: Vec<Line<'static>> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let chosen = state
                .matching
                .get(i)
                .copied()
                .flatten()
                .and_then(|idx| candidates.get(idx))
                .map(|c| c.to_string())
                .unwrap_or_else(|| "—".to_string());
            let mut style = Style::default();
            if i == state.choice_cursor {
                style = style.bg(Color::Rgb(40, 40, 60));
            }
            Line::from(vec![
                Span::styled(format!("  {}", row), style),
                Span::styled("  →  ", Style::default().fg(Color::DarkGray)),
                Span::styled(format!("[ {} ]", chosen), style.fg(Color::Green)),
            ])
        })
        .collect();

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Options:",
        Style::default().fg(Color::DarkGray),
    )));
    lines.extend(
        candidates
            .iter()
            .map(|c| Line::from(format!("    {}", c))),
    );
    lines
}

fn input_lines(state: &AppState, width: u16) -> Vec<Line<'static>> {
    let box_width = width.saturating_sub(8).max(10) as usize;
    let chars: Vec<char> = state.text_input.chars().collect();
    let cursor = state.text_cursor.min(chars.len());

    // Show the tail of long input so the cursor stays inside the box
    let start = (cursor + 1).saturating_sub(box_width);
    let before: String = chars[start..cursor].iter().collect();
    let at: String = chars.get(cursor).map(|c| c.to_string()).unwrap_or_else(|| " ".to_string());
    let after: String = chars
        .iter()
        .skip(cursor + 1)
        .take(box_width.saturating_sub(cursor - start + 1))
        .collect();
    let used = before.chars().count() + 1 + after.chars().count();
    let pad = " ".repeat(box_width.saturating_sub(used));

    vec![
        Line::from(format!("  ┌{}┐", "─".repeat(box_width))),
        Line::from(vec![
            Span::raw("  │"),
            Span::styled(before, Style::default().fg(Color::Yellow)),
            Span::styled(at, Style::default().fg(Color::Black).bg(Color::Yellow)),
            Span::styled(after, Style::default().fg(Color::Yellow)),
            Span::raw(pad),
            Span::raw("│"),
        ]),
        Line::from(format!("  └{}┘", "─".repeat(box_width))),
    ]
}
