use std::collections::BTreeSet;

use tracing::info;

use crate::engine::{QuestionId, QuizSession, SessionConfig};
use crate::model::*;
use crate::settings::GradeScale;

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    NameEntry,
    Quiz,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    ConfirmQuit,
    /// Validation message shown when Enter is pressed on an incomplete answer.
    Notice(String),
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    NameInput,
    ChoiceSelect,
    MatchingSelect,
    TextInput,
    Navigation,
}

/// Front-end preferences taken from settings.
#[derive(Debug, Clone)]
pub struct Preferences {
    pub auto_next: bool,
    pub show_timer: bool,
    pub grade_mode: Vec<GradeScale>,
    /// Names offered on the name screen.
    pub known_names: Vec<String>,
    /// Only `known_names` may be used.
    pub restrict_name_to_list: bool,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    questions: Vec<Question>,
    config: SessionConfig,
    pub prefs: Preferences,
    pub session: Option<QuizSession>,
    pub current: Option<QuestionId>,
    pub input_mode: InputMode,
    pub dialog_stack: Vec<Dialog>,
    pub name_input: String,
    /// Index into `prefs.known_names` last picked with the arrows.
    pub name_cursor: Option<usize>,
    pub choice_cursor: usize,
    pub selected: BTreeSet<String>,
    /// Chosen candidate index per matching row.
    pub matching: Vec<Option<usize>>,
    pub text_input: String,
    /// Cursor position in characters.
    pub text_cursor: usize,
    pub result: Option<TestResult>,
    /// Where the result went, or why it did not.
    pub delivery: Option<String>,
    pub result_scroll: usize,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(
        questions: Vec<Question>,
        config: SessionConfig,
        prefs: Preferences,
        student_name: Option<String>,
    ) -> Self {
        let mut state = Self {
            screen: Screen::NameEntry,
            questions,
            config,
            prefs,
            session: None,
            current: None,
            input_mode: InputMode::NameInput,
            dialog_stack: Vec::new(),
            name_input: String::new(),
            name_cursor: None,
            choice_cursor: 0,
            selected: BTreeSet::new(),
            matching: Vec::new(),
            text_input: String::new(),
            text_cursor: 0,
            result: None,
            delivery: None,
            result_scroll: 0,
            should_quit: false,
        };
        if let Some(name) = student_name.filter(|n| !n.trim().is_empty()) {
            state.start(&name);
        }
        state
    }

    /// Why `name` cannot be used to start, if it cannot.
    pub fn check_name(&self, name: &str) -> Result<(), String> {
        let name = name.trim();
        if !self.prefs.restrict_name_to_list {
            return if name.is_empty() {
                Err("Enter your name.".to_string())
            } else {
                Ok(())
            };
        }
        if self.prefs.known_names.is_empty() {
            return Err("The name list is empty.".to_string());
        }
        if self.prefs.known_names.iter().any(|n| n == name) {
            Ok(())
        } else {
            Err("Pick a name from the list.".to_string())
        }
    }

    /// Fill the name field with the next or previous known name.
    pub fn cycle_name(&mut self, forward: bool) {
        let count = self.prefs.known_names.len();
        if count == 0 {
            return;
        }
        let idx = match (self.name_cursor, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        };
        self.name_cursor = Some(idx);
        self.name_input = self.prefs.known_names[idx].clone();
    }

    /// Begin the session for `name`. Ignored once a session exists.
    pub fn start(&mut self, name: &str) -> bool {
        let name = name.trim();
        if self.check_name(name).is_err() || self.session.is_some() {
            return false;
        }
        self.session = Some(QuizSession::new(&self.questions, name, self.config.clone()));
        self.screen = Screen::Quiz;
        self.load_next();
        true
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn time_limit_secs(&self) -> u64 {
        self.config.time_limit_secs
    }

    pub fn current_question(&self) -> Option<&Question> {
        let id = self.current?;
        self.session.as_ref()?.question(id)
    }

    /// Move to the next question, finishing the quiz when none is left.
    pub fn load_next(&mut self) {
        let next = self.session.as_mut().and_then(|s| s.get_next_question());
        self.current = next;
        self.choice_cursor = 0;
        self.selected.clear();
        self.text_input.clear();
        self.text_cursor = 0;

        let Some(kind) = self.current_question().map(Question::kind) else {
            self.finish();
            return;
        };
        self.matching = match self.current_question() {
            Some(q) if kind == QuestionKind::Matching => vec![None; q.matching_sides().0.len()],
            _ => Vec::new(),
        };
        self.input_mode = match kind {
            QuestionKind::Single | QuestionKind::Multiple => InputMode::ChoiceSelect,
            QuestionKind::Matching => InputMode::MatchingSelect,
            QuestionKind::FreeForm => InputMode::TextInput,
        };
    }

    /// Select or toggle the option at `idx`. Returns true when the answer
    /// should be submitted right away.
    pub fn select_choice(&mut self, idx: usize) -> bool {
        let Some(q) = self.current_question() else {
            return false;
        };
        let Some(label) = q.choices.get(idx).map(|c| c.label.clone()) else {
            return false;
        };
        let kind = q.kind();
        self.choice_cursor = idx;

        match kind {
            QuestionKind::Single => {
                self.selected.clear();
                self.selected.insert(label);
                self.prefs.auto_next
            }
            QuestionKind::Multiple => {
                if !self.selected.remove(&label) {
                    self.selected.insert(label);
                }
                false
            }
            _ => false,
        }
    }

    /// Cycle the candidate chosen for a matching row.
    pub fn cycle_matching(&mut self, row: usize, forward: bool) {
        let count = self
            .current_question()
            .map(|q| q.matching_sides().1.len())
            .unwrap_or(0);
        let Some(slot) = self.matching.get_mut(row) else {
            return;
        };
        if count == 0 {
            return;
        }
        *slot = Some(match (*slot, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        });
        self.choice_cursor = row;
    }

    /// The answer as currently entered, or the reason it is incomplete.
    pub fn build_answer(&self) -> Result<UserAnswer, String> {
        let q = self
            .current_question()
            .ok_or_else(|| "No question".to_string())?;
        match q.kind() {
            QuestionKind::Single => self
                .selected
                .iter()
                .next()
                .cloned()
                .map(UserAnswer::Single)
                .ok_or_else(|| "Select an option.".to_string()),
            QuestionKind::Multiple => {
                if self.selected.is_empty() {
                    Err("Select at least one option.".to_string())
                } else {
                    Ok(UserAnswer::Multiple(self.selected.clone()))
                }
            }
            QuestionKind::Matching => {
                let (rows, candidates) = q.matching_sides();
                let mut pairs = Vec::with_capacity(rows.len());
                for (row, slot) in rows.iter().zip(&self.matching) {
                    let candidate = slot
                        .and_then(|i| candidates.get(i))
                        .ok_or_else(|| "Fill in every match.".to_string())?;
                    pairs.push((row.label.clone(), candidate.label.clone()));
                }
                Ok(UserAnswer::Matching(pairs))
            }
            QuestionKind::FreeForm => {
                let text = self.text_input.trim();
                if text.is_empty() {
                    Err("Type an answer.".to_string())
                } else {
                    Ok(UserAnswer::FreeForm(text.to_lowercase()))
                }
            }
        }
    }

    /// Grade the current answer and advance. An incomplete answer opens a
    /// notice instead.
    pub fn submit_current(&mut self) -> bool {
        let Some(id) = self.current else {
            return false;
        };
        match self.build_answer() {
            Ok(answer) => {
                if let Some(session) = self.session.as_mut() {
                    session.submit(id, &answer);
                }
                self.load_next();
                true
            }
            Err(msg) => {
                self.push_dialog(Dialog::Notice(msg));
                false
            }
        }
    }

    pub fn skip_current(&mut self) {
        let Some(id) = self.current else {
            return;
        };
        if let Some(session) = self.session.as_mut() {
            session.skip(id);
        }
        self.load_next();
    }

    /// Advance the countdown; a timeout ends the quiz.
    pub fn tick(&mut self, seconds: u64) {
        if self.screen != Screen::Quiz {
            return;
        }
        let timed_out = match self.session.as_mut() {
            Some(session) => {
                session.update_timer(seconds);
                session.is_timed_out()
            }
            None => false,
        };
        if timed_out {
            self.dialog_stack.clear();
            self.finish();
        }
    }

    fn finish(&mut self) {
        if self.result.is_some() {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let result = session.calculate_result();
        info!(
            student = %result.student_name,
            correct = result.correct_answers,
            total = result.total_questions,
            timeout = result.timeout,
            "quiz finished"
        );
        self.result = Some(result);
        self.current = None;
        self.screen = Screen::Finished;
        self.input_mode = InputMode::Navigation;
    }

    pub fn insert_char(&mut self, c: char) {
        let at = byte_offset(&self.text_input, self.text_cursor);
        self.text_input.insert(at, c);
        self.text_cursor += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.text_cursor == 0 {
            return;
        }
        self.text_cursor -= 1;
        let at = byte_offset(&self.text_input, self.text_cursor);
        self.text_input.remove(at);
    }

    pub fn delete_at_cursor(&mut self) {
        if self.text_cursor < self.text_input.chars().count() {
            let at = byte_offset(&self.text_input, self.text_cursor);
            self.text_input.remove(at);
        }
    }

    pub fn has_dialog(&self) -> bool {
        !self.dialog_stack.is_empty()
    }

    pub fn top_dialog(&self) -> Option<&Dialog> {
        self.dialog_stack.last()
    }

    pub fn push_dialog(&mut self, dialog: Dialog) {
        self.dialog_stack.push(dialog);
    }

    pub fn pop_dialog(&mut self) -> Option<Dialog> {
        self.dialog_stack.pop()
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs(auto_next: bool) -> Preferences {
        Preferences {
            auto_next,
            show_timer: true,
            grade_mode: vec![GradeScale::Percent],
            known_names: Vec::new(),
            restrict_name_to_list: false,
        }
    }

    fn single() -> Question {
        Question {
            text: "Pick".into(),
            choices: vec![Choice::new("A", "one"), Choice::new("B", "two")],
            key: AnswerKey::Single("A".into()),
            images: Vec::new(),
            source_topic: String::new(),
        }
    }

    fn matching() -> Question {
        Question {
            text: "Match".into(),
            choices: vec![
                Choice::new("A", "cat"),
                Choice::new("B", "dog"),
                Choice::new("X", "meow"),
                Choice::new("Y", "woof"),
            ],
            key: AnswerKey::Matching(vec![("A".into(), "X".into()), ("B".into(), "Y".into())]),
            images: Vec::new(),
            source_topic: String::new(),
        }
    }

    fn freeform() -> Question {
        Question {
            text: "Capital of France".into(),
            choices: Vec::new(),
            key: AnswerKey::FreeForm(vec!["paris".into()]),
            images: Vec::new(),
            source_topic: String::new(),
        }
    }

    #[test]
    fn name_entry_until_started() {
        let mut state = AppState::new(vec![single()], SessionConfig::default(), prefs(false), None);
        assert_eq!(state.screen, Screen::NameEntry);
        assert!(!state.start("   "));
        assert!(state.start("Ann"));
        assert_eq!(state.screen, Screen::Quiz);
        assert_eq!(state.input_mode, InputMode::ChoiceSelect);
    }

    #[test]
    fn restricted_names_come_from_the_list() {
        let mut p = prefs(false);
        p.known_names = vec!["Ann".into(), "Bo".into()];
        p.restrict_name_to_list = true;
        let mut state = AppState::new(vec![single()], SessionConfig::default(), p, Some("Eve".into()));
        assert_eq!(state.screen, Screen::NameEntry);
        assert!(state.check_name("Eve").is_err());

        state.cycle_name(false);
        assert_eq!(state.name_input, "Bo");
        state.cycle_name(true);
        assert_eq!(state.name_input, "Ann");
        let name = state.name_input.clone();
        assert!(state.start(&name));
        assert_eq!(state.session.as_ref().unwrap().student_name(), "Ann");
    }

    #[test]
    fn restricted_entry_with_empty_list_cannot_start() {
        let mut p = prefs(false);
        p.restrict_name_to_list = true;
        let mut state = AppState::new(vec![single()], SessionConfig::default(), p, None);
        assert_eq!(state.check_name("Ann"), Err("The name list is empty.".to_string()));
        assert!(!state.start("Ann"));
    }

    #[test]
    fn empty_selection_is_rejected() {
        let mut state =
            AppState::new(vec![single()], SessionConfig::default(), prefs(false), Some("Ann".into()));
        assert!(!state.submit_current());
        assert!(matches!(state.top_dialog(), Some(Dialog::Notice(_))));
        assert_eq!(state.screen, Screen::Quiz);
    }

    #[test]
    fn auto_next_requests_submit_for_single_choice() {
        let mut state =
            AppState::new(vec![single()], SessionConfig::default(), prefs(true), Some("Ann".into()));
        assert!(state.select_choice(0));
        assert!(state.submit_current());
        assert_eq!(state.screen, Screen::Finished);
        assert_eq!(state.result.as_ref().unwrap().total_questions, 1);
    }

    #[test]
    fn matching_rows_cycle_through_candidates() {
        let mut state =
            AppState::new(vec![matching()], SessionConfig::default(), prefs(false), Some("Ann".into()));
        assert_eq!(state.input_mode, InputMode::MatchingSelect);
        state.cycle_matching(0, true);
        assert!(state.build_answer().is_err());
        state.cycle_matching(1, true);
        state.cycle_matching(1, true);
        assert_eq!(
            state.build_answer().unwrap(),
            UserAnswer::Matching(vec![("A".into(), "X".into()), ("B".into(), "Y".into())])
        );
        state.cycle_matching(1, true);
        assert_eq!(state.matching[1], Some(0));
    }

    #[test]
    fn freeform_text_is_edited_by_character() {
        let mut state =
            AppState::new(vec![freeform()], SessionConfig::default(), prefs(false), Some("Ann".into()));
        for c in "Пар".chars() {
            state.insert_char(c);
        }
        state.delete_before_cursor();
        assert_eq!(state.text_input, "Па");
        state.text_cursor = 0;
        state.delete_at_cursor();
        assert_eq!(state.text_input, "а");
    }

    #[test]
    fn skipping_the_only_question_brings_it_back() {
        let mut state =
            AppState::new(vec![freeform()], SessionConfig::default(), prefs(false), Some("Ann".into()));
        let first = state.current;
        state.skip_current();
        assert_eq!(state.current, first);
        assert_eq!(state.screen, Screen::Quiz);
    }

    #[test]
    fn timeout_finishes_quiz_once() {
        let config = SessionConfig {
            time_limit_secs: 2,
            ..SessionConfig::default()
        };
        let mut state = AppState::new(vec![single()], config, prefs(false), Some("Ann".into()));
        state.tick(1);
        assert_eq!(state.screen, Screen::Quiz);
        state.tick(1);
        assert_eq!(state.screen, Screen::Finished);
        let result = state.result.clone().unwrap();
        assert!(result.timeout);
        assert_eq!(result.correct_answers, 0);
        state.tick(1);
        assert_eq!(state.result, Some(result));
    }
}
