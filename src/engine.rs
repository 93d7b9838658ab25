use std::collections::{BTreeSet, HashSet, VecDeque};

use rand::Rng;
use tracing::{debug, info};

use crate::grading;
use crate::model::*;
use crate::shuffle::prepare_questions;

pub const DEFAULT_PASS_THRESHOLD: f64 = 65.0;

/// Position of a question in the session's shuffled sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionId(pub usize);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub quiz_name: String,
    /// Zero disables the countdown.
    pub time_limit_secs: u64,
    pub pass_threshold: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            quiz_name: String::new(),
            time_limit_secs: 0,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub answered: usize,
    pub pending: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    student_name: String,
    config: SessionConfig,
    cursor: usize,
    pending: VecDeque<QuestionId>,
    answered: HashSet<QuestionId>,
    score: usize,
    results: Vec<QuestionResult>,
    time_left: u64,
    timer_active: bool,
    timed_out: bool,
}

impl QuizSession {
    pub fn new(questions: &[Question], student_name: &str, config: SessionConfig) -> Self {
        Self::with_rng(questions, student_name, config, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(
        questions: &[Question],
        student_name: &str,
        config: SessionConfig,
        rng: &mut R,
    ) -> Self {
        let questions = prepare_questions(questions, rng);
        info!(
            student = student_name,
            questions = questions.len(),
            time_limit = config.time_limit_secs,
            "session started"
        );
        Self {
            questions,
            student_name: student_name.to_string(),
            time_left: config.time_limit_secs,
            timer_active: config.time_limit_secs > 0,
            config,
            cursor: 0,
            pending: VecDeque::new(),
            answered: HashSet::new(),
            score: 0,
            results: Vec::new(),
            timed_out: false,
        }
    }

    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    pub fn quiz_name(&self) -> &str {
        &self.config.quiz_name
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.get(id.0)
    }

    pub fn is_answered(&self, id: QuestionId) -> bool {
        self.answered.contains(&id)
    }

    /// Next question to present, or `None` once the main sequence and the
    /// pending queue are both exhausted.
    pub fn get_next_question(&mut self) -> Option<QuestionId> {
        if self.cursor < self.questions.len() {
            let id = QuestionId(self.cursor);
            self.cursor += 1;
            return Some(id);
        }

        while let Some(id) = self.pending.pop_front() {
            if !self.answered.contains(&id) {
                return Some(id);
            }
        }
        None
    }

    /// Defer a question to the end of the session.
    pub fn skip(&mut self, id: QuestionId) {
        if id.0 >= self.questions.len() || self.answered.contains(&id) || self.pending.contains(&id) {
            return;
        }
        debug!(question = id.0, "question skipped");
        self.pending.push_back(id);
    }

    /// Grade an answer against the question's key and log it.
    ///
    /// The question does not have to belong to this session.
    pub fn check_answer(&mut self, question: &Question, user_answer: &UserAnswer) -> bool {
        let is_correct = compare_answers(&question.key, user_answer);

        self.results.push(QuestionResult {
            question: question.text.clone(),
            options: question.options(),
            question_type: question.kind(),
            user_answer: user_answer.clone(),
            correct_answer: question.key.clone(),
            is_correct,
        });

        if is_correct {
            self.score += 1;
        }
        is_correct
    }

    /// Grade the session question `id` and mark it answered.
    ///
    /// Returns `None` for an unknown id or a question already answered.
    pub fn submit(&mut self, id: QuestionId, user_answer: &UserAnswer) -> Option<bool> {
        if self.answered.contains(&id) {
            return None;
        }
        let question = self.questions.get(id.0)?.clone();
        let is_correct = self.check_answer(&question, user_answer);
        self.answered.insert(id);
        Some(is_correct)
    }

    pub fn update_timer(&mut self, seconds: u64) {
        if !self.timer_active || self.time_left == 0 {
            return;
        }

        self.time_left = self.time_left.saturating_sub(seconds);
        if self.time_left == 0 {
            info!(student = %self.student_name, "time limit reached");
            self.timed_out = true;
            self.timer_active = false;
        }
    }

    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    pub fn timer_active(&self) -> bool {
        self.timer_active
    }

    pub fn is_timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn progress(&self) -> Progress {
        Progress {
            answered: self.answered.len(),
            pending: self
                .pending
                .iter()
                .filter(|id| !self.answered.contains(id))
                .count(),
            total: self.questions.len(),
        }
    }

    pub fn results(&self) -> &[QuestionResult] {
        &self.results
    }

    pub fn calculate_result(&self) -> TestResult {
        let total = self.questions.len();
        let percentage = grading::percentage(self.score, total);

        let time_left = if self.time_left > 0 && self.config.time_limit_secs > 0 {
            Some((self.time_left / 60, self.time_left % 60))
        } else {
            None
        };

        TestResult {
            student_name: self.student_name.clone(),
            quiz_name: self.config.quiz_name.clone(),
            total_questions: total,
            correct_answers: self.score,
            percentage,
            grade_12: grading::grade_12(percentage),
            grade_5: grading::grade_5(percentage),
            passed: percentage >= self.config.pass_threshold,
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            time_left,
            timeout: self.timed_out,
            detailed_results: self.results.clone(),
        }
    }
}

/// Lower-case and collapse whitespace runs.
pub fn normalize_freeform(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn compare_answers(key: &AnswerKey, user: &UserAnswer) -> bool {
    match (key, user) {
        (AnswerKey::Single(correct), UserAnswer::Single(given)) => correct == given,
        (AnswerKey::Multiple(correct), UserAnswer::Multiple(given)) => correct == given,
        (AnswerKey::Matching(correct), UserAnswer::Matching(given)) => {
            let correct: BTreeSet<&(String, String)> = correct.iter().collect();
            let given: BTreeSet<&(String, String)> = given.iter().collect();
            correct == given
        }
        (AnswerKey::FreeForm(accepted), UserAnswer::FreeForm(given)) => {
            let given = normalize_freeform(given);
            accepted.iter().any(|a| normalize_freeform(a) == given)
        }
        _ => false,
    }
}
