use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Render question text. Only inline markup is styled; every source line
/// stays its own display line.
pub fn text_to_lines(text: &str) -> Vec<Line<'static>> {
    text.lines().map(inline_line).collect()
}

/// One line of inline markdown: bold, italic, strikethrough, code.
pub fn inline_line(text: &str) -> Line<'static> {
    if text.trim().is_empty() {
        return Line::from("");
    }

    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);

    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut style_stack: Vec<Style> = vec![Style::default()];
    let current = |stack: &Vec<Style>| *stack.last().unwrap_or(&Style::default());

    // A leading "1." or "-" would turn the line into a list; keep it literal.
    let escaped = escape_block_markers(text);

    for event in Parser::new_ext(&escaped, opts) {
        match event {
            Event::Start(Tag::Strong) => {
                let s = current(&style_stack).add_modifier(Modifier::BOLD);
                style_stack.push(s);
            }
            Event::Start(Tag::Emphasis) => {
                let s = current(&style_stack).add_modifier(Modifier::ITALIC);
                style_stack.push(s);
            }
            Event::Start(Tag::Strikethrough) => {
                let s = current(&style_stack).add_modifier(Modifier::CROSSED_OUT);
                style_stack.push(s);
            }
            Event::End(TagEnd::Strong | TagEnd::Emphasis | TagEnd::Strikethrough) => {
                style_stack.pop();
            }
            Event::Text(t) => {
                spans.push(Span::styled(t.to_string(), current(&style_stack)));
            }
            Event::Code(code) => {
                spans.push(Span::styled(code.to_string(), Style::default().fg(Color::Yellow)));
            }
            Event::SoftBreak | Event::HardBreak => spans.push(Span::raw(" ")),
            _ => {}
        }
    }

    if spans.is_empty() {
        return Line::from(text.to_string());
    }
    Line::from(spans)
}

fn escape_block_markers(text: &str) -> String {
    let trimmed = text.trim_start();
    let indent = &text[..text.len() - trimmed.len()];
    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && trimmed[digits..].starts_with(['.', ')']) {
        return format!("{}{}\\{}", indent, &trimmed[..digits], &trimmed[digits..]);
    }
    let bullet = trimmed.starts_with(['-', '+', '*'])
        && trimmed[1..].starts_with(char::is_whitespace);
    if bullet || trimmed.starts_with(['#', '>']) {
        return format!("{}\\{}", indent, trimmed);
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn bold_is_styled() {
        let line = inline_line("Which is **largest**?");
        assert_eq!(plain(&line), "Which is largest?");
        assert!(line
            .spans
            .iter()
            .any(|s| s.content == "largest" && s.style.add_modifier.contains(Modifier::BOLD)));
    }

    #[test]
    fn numbered_text_stays_literal() {
        assert_eq!(plain(&inline_line("1. First")), "1. First");
        assert_eq!(plain(&inline_line("- dash")), "- dash");
    }

    #[test]
    fn each_source_line_is_kept() {
        let lines = text_to_lines("one\n\ntwo");
        assert_eq!(lines.len(), 3);
        assert_eq!(plain(&lines[2]), "two");
    }
}
