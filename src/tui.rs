use std::io;
use std::time::Duration;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, warn};

use crate::library::{ResultSink, SourceRef};
use crate::state::*;
use crate::timer::{spawn_ticker, TimerEvent};

/// Run the interactive quiz and return the final state once the user leaves.
pub fn run_tui(
    mut state: AppState,
    sink: &dyn ResultSink,
    sources: &[SourceRef],
) -> Result<AppState, String> {
    enable_raw_mode().map_err(|e| format!("Cannot enable raw mode: {}", e))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|e| format!("Cannot enter alternate screen: {}", e))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal =
        Terminal::new(backend).map_err(|e| format!("Cannot create terminal: {}", e))?;

    let ticker = spawn_ticker(Duration::from_secs(1));
    let result = main_loop(&mut terminal, &mut state, &ticker.rx, sink, sources);
    ticker.stop();

    // Restore terminal
    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    result.map(|_| state)
}

fn main_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    timer_rx: &std::sync::mpsc::Receiver<TimerEvent>,
    sink: &dyn ResultSink,
    sources: &[SourceRef],
) -> Result<(), String> {
    loop {
        terminal
            .draw(|f| crate::ui::draw(f, state))
            .map_err(|e| format!("Draw error: {}", e))?;

        if state.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(100)).map_err(|e| format!("Poll error: {}", e))? {
            if let Event::Key(key) = event::read().map_err(|e| format!("Read error: {}", e))? {
                if key.kind == KeyEventKind::Press {
                    handle_key(key, state);
                }
            }
        }

        while let Ok(TimerEvent::Tick(secs)) = timer_rx.try_recv() {
            state.tick(secs);
        }

        deliver_once(state, sink, sources);
    }

    Ok(())
}

/// Hand a finished result to the sink the first time it appears.
pub fn deliver_once(state: &mut AppState, sink: &dyn ResultSink, sources: &[SourceRef]) {
    if state.delivery.is_some() {
        return;
    }
    let Some(result) = state.result.as_ref() else {
        return;
    };
    state.delivery = Some(match sink.deliver(result, sources) {
        Ok(path) => format!("Saved to {}", path.display()),
        Err(e) => {
            warn!(error = %e, "result was not saved");
            format!("Not saved: {}", e)
        }
    });
}

fn handle_key(key: KeyEvent, state: &mut AppState) {
    if state.has_dialog() {
        handle_dialog_key(key, state);
        return;
    }

    match state.screen {
        Screen::NameEntry => handle_name_key(key, state),
        Screen::Quiz => handle_quiz_key(key, state),
        Screen::Finished => handle_finished_key(key, state),
    }
}

fn handle_name_key(key: KeyEvent, state: &mut AppState) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('q') if ctrl => state.should_quit = true,
        KeyCode::Up => state.cycle_name(false),
        KeyCode::Down | KeyCode::Tab => state.cycle_name(true),
        // The list is read-only when entry is restricted to it.
        KeyCode::Char(c) if !ctrl && !state.prefs.restrict_name_to_list => {
            state.name_input.push(c);
            state.name_cursor = None;
        }
        KeyCode::Backspace if !state.prefs.restrict_name_to_list => {
            state.name_input.pop();
            state.name_cursor = None;
        }
        KeyCode::Enter => {
            let name = state.name_input.clone();
            match state.check_name(&name) {
                Ok(()) => {
                    state.start(&name);
                }
                Err(msg) => state.push_dialog(Dialog::Notice(msg)),
            }
        }
        KeyCode::Esc => state.should_quit = true,
        _ => {}
    }
}

fn handle_quiz_key(key: KeyEvent, state: &mut AppState) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global bindings
    if ctrl {
        match key.code {
            KeyCode::Char('q') => state.push_dialog(Dialog::ConfirmQuit),
            KeyCode::Char('k') => {
                debug!("skip requested");
                state.skip_current();
            }
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::F(1) => {
            state.push_dialog(Dialog::Help);
            return;
        }
        KeyCode::Enter => {
            state.submit_current();
            return;
        }
        KeyCode::Char('?') if state.input_mode != InputMode::TextInput => {
            state.push_dialog(Dialog::Help);
            return;
        }
        _ => {}
    }

    match state.input_mode {
        InputMode::ChoiceSelect => handle_choice_key(key, state),
        InputMode::MatchingSelect => handle_matching_key(key, state),
        InputMode::TextInput => handle_text_input_key(key, state),
        InputMode::NameInput | InputMode::Navigation => {}
    }
}

fn handle_choice_key(key: KeyEvent, state: &mut AppState) {
    let count = state.current_question().map_or(0, |q| q.choices.len());
    let submit = match key.code {
        KeyCode::Up => {
            state.choice_cursor = state.choice_cursor.saturating_sub(1);
            false
        }
        KeyCode::Down => {
            if state.choice_cursor + 1 < count {
                state.choice_cursor += 1;
            }
            false
        }
        KeyCode::Char(' ') => state.select_choice(state.choice_cursor),
        KeyCode::Char(c) => match label_index(state, c) {
            Some(idx) => state.select_choice(idx),
            None => false,
        },
        _ => false,
    };
    if submit {
        state.submit_current();
    }
}

fn handle_matching_key(key: KeyEvent, state: &mut AppState) {
    let rows = state.matching.len();
    match key.code {
        KeyCode::Up => state.choice_cursor = state.choice_cursor.saturating_sub(1),
        KeyCode::Down | KeyCode::Tab => {
            if state.choice_cursor + 1 < rows {
                state.choice_cursor += 1;
            }
        }
        KeyCode::Right | KeyCode::Char(' ') => state.cycle_matching(state.choice_cursor, true),
        KeyCode::Left => state.cycle_matching(state.choice_cursor, false),
        KeyCode::Char(c) => {
            // Typing a candidate's letter assigns it to the focused row.
            let wanted = c.to_uppercase().to_string();
            let idx = state.current_question().and_then(|q| {
                q.matching_sides()
                    .1
                    .iter()
                    .position(|choice| choice.label == wanted)
            });
            if let (Some(idx), Some(slot)) = (idx, state.matching.get_mut(state.choice_cursor)) {
                *slot = Some(idx);
                if state.choice_cursor + 1 < rows {
                    state.choice_cursor += 1;
                }
            }
        }
        _ => {}
    }
}

fn handle_text_input_key(key: KeyEvent, state: &mut AppState) {
    let len = state.text_input.chars().count();
    match key.code {
        KeyCode::Char(c) => state.insert_char(c),
        KeyCode::Backspace => state.delete_before_cursor(),
        KeyCode::Delete => state.delete_at_cursor(),
        KeyCode::Left => state.text_cursor = state.text_cursor.saturating_sub(1),
        KeyCode::Right => state.text_cursor = (state.text_cursor + 1).min(len),
        KeyCode::Home => state.text_cursor = 0,
        KeyCode::End => state.text_cursor = len,
        _ => {}
    }
}

fn handle_finished_key(key: KeyEvent, state: &mut AppState) {
    match key.code {
        KeyCode::Up => state.result_scroll = state.result_scroll.saturating_sub(1),
        KeyCode::Down => state.result_scroll += 1,
        KeyCode::PageUp => state.result_scroll = state.result_scroll.saturating_sub(10),
        KeyCode::PageDown => state.result_scroll += 10,
        KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q') => state.should_quit = true,
        _ => {}
    }
}

fn handle_dialog_key(key: KeyEvent, state: &mut AppState) {
    match state.top_dialog().cloned() {
        Some(Dialog::ConfirmQuit) => match key.code {
            KeyCode::Enter | KeyCode::Char('y') => {
                state.pop_dialog();
                debug!("quiz abandoned");
                state.should_quit = true;
            }
            KeyCode::Esc | KeyCode::Char('n') => {
                state.pop_dialog();
            }
            _ => {}
        },
        Some(Dialog::Notice(_)) => {
            state.pop_dialog();
        }
        Some(Dialog::Help) => match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('?') | KeyCode::F(1) => {
                state.pop_dialog();
            }
            _ => {}
        },
        None => {}
    }
}

fn label_index(state: &AppState, c: char) -> Option<usize> {
    let wanted = c.to_uppercase().to_string();
    state
        .current_question()?
        .choices
        .iter()
        .position(|choice| choice.label == wanted)
}
