pub mod dialog;
pub mod keybar;
pub mod layout;
pub mod markdown;
pub mod name;
pub mod question;
pub mod result;
pub mod statusbar;
pub mod titlebar;

use ratatui::Frame;

use crate::state::{AppState, Screen};

pub fn draw(f: &mut Frame, state: &AppState) {
    let area = f.area();

    match state.screen {
        Screen::NameEntry => {
            name::draw_name_entry(f, area, state);
        }
        Screen::Quiz => {
            draw_quiz(f, area, state);
        }
        Screen::Finished => {
            result::draw_finished(f, area, state);
        }
    }

    // Draw dialog overlay if any
    if state.has_dialog() {
        dialog::draw_dialog(f, area, state);
    }
}

fn draw_quiz(f: &mut Frame, area: ratatui::layout::Rect, state: &AppState) {
    let layout = layout::compute_layout(area);

    titlebar::draw_titlebar(f, layout.titlebar, state);
    question::draw_question(f, layout.main, state);
    statusbar::draw_statusbar(f, layout.statusbar, state);
    keybar::draw_keybar(f, layout.keybar, state);
}
