use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::state::AppState;
use crate::timer::format_clock;

/// Countdown turns red for the last minute.
const WARN_SECS: u64 = 60;

pub fn draw_titlebar(f: &mut Frame, area: Rect, state: &AppState) {
    let Some(session) = state.session.as_ref() else {
        return;
    };

    let timer = if state.prefs.show_timer && session.timer_active() {
        Some(session.time_left())
    } else {
        None
    };

    let timer_span = match timer {
        Some(secs) => {
            let formatted = format!(" {} ", format_clock(secs));
            let style = if secs <= WARN_SECS {
                Style::default()
                    .fg(Color::White)
                    .bg(Color::Red)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Rgb(200, 200, 120))
            };
            Span::styled(formatted, style)
        }
        None => Span::raw(""),
    };

    let title_text = format!("[ {} ]", session.quiz_name());
    let title_span = Span::styled(
        title_text.clone(),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    // Title centred over the full width, timer flush right
    let available = area.width as usize;
    let timer_len = timer_span.content.chars().count();
    let title_len = title_text.chars().count();
    let center_pad = available.saturating_sub(title_len) / 2;
    let right_pad = available.saturating_sub(center_pad + title_len + timer_len);

    let line = Line::from(vec![
        Span::raw(" ".repeat(center_pad)),
        title_span,
        Span::raw(" ".repeat(right_pad)),
        timer_span,
    ]);

    let widget = Paragraph::new(line)
        .style(Style::default().bg(Color::DarkGray))
        .alignment(Alignment::Left);
    f.render_widget(widget, area);
}
