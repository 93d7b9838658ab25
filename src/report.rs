use std::fmt::{self, Write};

use crate::model::{AnswerKey, QuestionResult, TestResult, UserAnswer};
use crate::settings::GradeScale;
use crate::timer::format_clock;

pub fn format_key(key: &AnswerKey) -> String {
    match key {
        AnswerKey::Single(label) => label.clone(),
        AnswerKey::Multiple(labels) => join_letters(labels.iter()),
        AnswerKey::Matching(pairs) => join_pairs(pairs),
        AnswerKey::FreeForm(accepted) => accepted.join(", "),
    }
}

pub fn format_user_answer(answer: &UserAnswer) -> String {
    match answer {
        UserAnswer::Single(label) => label.clone(),
        UserAnswer::Multiple(labels) => join_letters(labels.iter()),
        UserAnswer::Matching(pairs) => join_pairs(pairs),
        UserAnswer::FreeForm(text) => text.trim().to_string(),
    }
}

fn join_letters<'a>(labels: impl Iterator<Item = &'a String>) -> String {
    let mut labels: Vec<&str> = labels.map(String::as_str).collect();
    labels.sort_unstable();
    labels.join(", ")
}

fn join_pairs(pairs: &[(String, String)]) -> String {
    let mut pairs: Vec<&(String, String)> = pairs.iter().collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(l, r)| format!("{}–{}", l, r))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Score block: name, quiz, the selected grade scales, pass mark and timing.
pub fn summary(result: &TestResult, scales: &[GradeScale]) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_summary(&mut out, result, scales);
    out
}

fn write_summary(out: &mut impl Write, result: &TestResult, scales: &[GradeScale]) -> fmt::Result {
    writeln!(out, "Student: {}", result.student_name)?;
    writeln!(out, "Quiz: {}", result.quiz_name)?;
    writeln!(out, "Correct: {} of {}", result.correct_answers, result.total_questions)?;
    for scale in scales {
        match scale {
            GradeScale::Percent => writeln!(out, "Score: {:.1}%", result.percentage)?,
            GradeScale::Twelve => writeln!(out, "Grade (12-point): {}", result.grade_12)?,
            GradeScale::Five => writeln!(out, "Grade (5-point): {}", result.grade_5)?,
        }
    }
    writeln!(out, "Result: {}", if result.passed { "PASSED" } else { "FAILED" })?;
    if result.timeout {
        writeln!(out, "Time ran out")?;
    } else if let Some((m, s)) = result.time_left {
        writeln!(out, "Time left: {}", format_clock(m * 60 + s))?;
    }
    writeln!(out, "Finished: {}", result.timestamp)
}

fn write_mistake(out: &mut impl Write, n: usize, r: &QuestionResult) -> fmt::Result {
    writeln!(out, "{}. {}", n, r.question)?;
    for option in &r.options {
        writeln!(out, "   {}", option)?;
    }
    writeln!(out, "   Your answer: {}", format_user_answer(&r.user_answer))?;
    writeln!(out, "   Correct: {}", format_key(&r.correct_answer))
}

/// Every wrong answer with the correct one next to it.
pub fn mistakes(result: &TestResult) -> String {
    let wrong: Vec<&QuestionResult> = result.mistakes().collect();
    if wrong.is_empty() {
        return "No mistakes.\n".to_string();
    }
    let mut out = String::new();
    for (i, r) in wrong.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write_mistake(&mut out, i + 1, r);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionKind;
    use std::collections::BTreeSet;

    fn result(detailed: Vec<QuestionResult>) -> TestResult {
        TestResult {
            student_name: "Ann".into(),
            quiz_name: "Capitals".into(),
            total_questions: 2,
            correct_answers: 1,
            percentage: 50.0,
            grade_12: 7,
            grade_5: 3,
            passed: false,
            timestamp: "2025-03-01 09:00:00".into(),
            time_left: Some((1, 5)),
            timeout: false,
            detailed_results: detailed,
        }
    }

    #[test]
    fn answers_are_formatted_by_kind() {
        let letters: BTreeSet<String> = ["C", "A"].iter().map(|s| s.to_string()).collect();
        assert_eq!(format_key(&AnswerKey::Multiple(letters)), "A, C");
        let pairs = vec![("B".into(), "X".into()), ("A".into(), "Y".into())];
        assert_eq!(format_key(&AnswerKey::Matching(pairs)), "A–Y; B–X");
        assert_eq!(
            format_key(&AnswerKey::FreeForm(vec!["kyiv".into(), "kiev".into()])),
            "kyiv, kiev"
        );
        assert_eq!(format_user_answer(&UserAnswer::FreeForm("  Paris ".into())), "Paris");
    }

    #[test]
    fn summary_shows_selected_scales_only() {
        let text = summary(&result(Vec::new()), &[GradeScale::Twelve]);
        assert!(text.contains("Grade (12-point): 7"));
        assert!(!text.contains("5-point"));
        assert!(!text.contains('%'));
        assert!(text.contains("FAILED"));
        assert!(text.contains("Time left: 01:05"));
    }

    #[test]
    fn mistakes_list_wrong_answers() {
        let wrong = QuestionResult {
            question: "Capital of France?".into(),
            options: vec!["A) Paris".into(), "B) Rome".into()],
            question_type: QuestionKind::Single,
            user_answer: UserAnswer::Single("B".into()),
            correct_answer: AnswerKey::Single("A".into()),
            is_correct: false,
        };
        let mut right = wrong.clone();
        right.is_correct = true;
        right.question = "Other".into();

        let text = mistakes(&result(vec![right, wrong]));
        assert!(text.starts_with("1. Capital of France?"));
        assert!(text.contains("Your answer: B"));
        assert!(text.contains("Correct: A"));
        assert!(!text.contains("Other"));

        assert_eq!(mistakes(&result(Vec::new())), "No mistakes.\n");
    }
}
