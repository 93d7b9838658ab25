use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Single,
    Multiple,
    Matching,
    FreeForm,
}

impl QuestionKind {
    pub fn tag(self) -> &'static str {
        match self {
            QuestionKind::Single => "single",
            QuestionKind::Multiple => "multiple",
            QuestionKind::Matching => "matching",
            QuestionKind::FreeForm => "freeform",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One lettered option of a choice or matching question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub text: String,
}

impl Choice {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}) {}", self.label, self.text)
    }
}

/// The correct answer of a question. The variant decides the question kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AnswerKey {
    Single(String),
    Multiple(BTreeSet<String>),
    /// (left, right) pairs in authored order.
    Matching(Vec<(String, String)>),
    /// Accepted answers, already lower-cased.
    FreeForm(Vec<String>),
}

impl AnswerKey {
    pub fn kind(&self) -> QuestionKind {
        match self {
            AnswerKey::Single(_) => QuestionKind::Single,
            AnswerKey::Multiple(_) => QuestionKind::Multiple,
            AnswerKey::Matching(_) => QuestionKind::Matching,
            AnswerKey::FreeForm(_) => QuestionKind::FreeForm,
        }
    }
}

/// What a test-taker submitted for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum UserAnswer {
    Single(String),
    Multiple(BTreeSet<String>),
    Matching(Vec<(String, String)>),
    FreeForm(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub caption: String,
    /// Resolved path, or the first candidate when nothing was found on disk.
    pub path: PathBuf,
}

impl ImageRef {
    pub fn is_missing(&self) -> bool {
        !self.path.exists()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub text: String,
    pub choices: Vec<Choice>,
    pub key: AnswerKey,
    pub images: Vec<ImageRef>,
    pub source_topic: String,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        self.key.kind()
    }

    /// Options in their `"<label>) <text>"` display form.
    pub fn options(&self) -> Vec<String> {
        self.choices.iter().map(|c| c.to_string()).collect()
    }

    pub fn choice(&self, label: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.label == label)
    }

    /// Split a matching question's options into the rows to fill in (left
    /// letters of the key, sorted) and the candidates for them.
    pub fn matching_sides(&self) -> (Vec<&Choice>, Vec<&Choice>) {
        let AnswerKey::Matching(pairs) = &self.key else {
            return (Vec::new(), Vec::new());
        };
        let lefts: BTreeSet<&str> = pairs.iter().map(|(l, _)| l.as_str()).collect();
        let mut rows: Vec<&Choice> = self
            .choices
            .iter()
            .filter(|c| lefts.contains(c.label.as_str()))
            .collect();
        rows.sort_by(|a, b| a.label.cmp(&b.label));
        let candidates = self
            .choices
            .iter()
            .filter(|c| !lefts.contains(c.label.as_str()))
            .collect();
        (rows, candidates)
    }
}

#[derive(Debug, Clone)]
pub struct Quiz {
    pub name: String,
    pub questions: Vec<Question>,
    pub file_path: PathBuf,
    pub source_hash: String,
}

impl Quiz {
    /// Join the question lists of several quizzes, keeping their order.
    pub fn concat(quizzes: &[Quiz]) -> Vec<Question> {
        quizzes
            .iter()
            .flat_map(|q| q.questions.iter().cloned())
            .collect()
    }
}

/// Log entry written by the session for every checked answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question: String,
    pub options: Vec<String>,
    pub question_type: QuestionKind,
    pub user_answer: UserAnswer,
    pub correct_answer: AnswerKey,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub student_name: String,
    pub quiz_name: String,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub percentage: f64,
    pub grade_12: u8,
    pub grade_5: u8,
    pub passed: bool,
    pub timestamp: String,
    /// (minutes, seconds) left on the clock, absent when untimed or expired.
    #[serde(default)]
    pub time_left: Option<(u64, u64)>,
    #[serde(default)]
    pub timeout: bool,
    #[serde(default)]
    pub detailed_results: Vec<QuestionResult>,
}

impl TestResult {
    pub fn mistakes(&self) -> impl Iterator<Item = &QuestionResult> {
        self.detailed_results.iter().filter(|r| !r.is_correct)
    }
}
