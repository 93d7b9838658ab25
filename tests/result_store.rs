use std::fs;
use std::path::PathBuf;

use plainquiz::library::{ResultSink, ResultStore, SourceRef};
use plainquiz::model::{AnswerKey, QuestionKind, QuestionResult, TestResult, UserAnswer};
use plainquiz::report;
use plainquiz::settings::GradeScale;

fn result(student: &str, timestamp: &str) -> TestResult {
    TestResult {
        student_name: student.into(),
        quiz_name: "Capitals of Europe".into(),
        total_questions: 2,
        correct_answers: 1,
        percentage: 50.0,
        grade_12: 7,
        grade_5: 3,
        passed: false,
        timestamp: timestamp.into(),
        time_left: Some((0, 42)),
        timeout: false,
        detailed_results: vec![QuestionResult {
            question: "Match the country with its capital".into(),
            options: vec!["A) Germany".into(), "B) Poland".into(), "X) Warsaw".into(), "Y) Berlin".into()],
            question_type: QuestionKind::Matching,
            user_answer: UserAnswer::Matching(vec![("A".into(), "X".into()), ("B".into(), "Y".into())]),
            correct_answer: AnswerKey::Matching(vec![("A".into(), "Y".into()), ("B".into(), "X".into())]),
            is_correct: false,
        }],
    }
}

#[test]
fn test_results_round_trip_newest_first() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ResultStore::new(tmp.path().join("results"));
    let sources = vec![SourceRef {
        path: PathBuf::from("quizzes/geography/capitals.txt"),
        hash: "sha256:abc".into(),
    }];

    let older = store.deliver(&result("Ann", "2025-01-01 10:00:00"), &sources).unwrap();
    let newer = store.deliver(&result("Bob", "2025-02-01 09:30:00"), &[]).unwrap();
    assert!(older.ends_with("Ann_2025-01-01_10-00-00.yaml"));
    assert!(newer.is_file());

    // Stray files do not break loading
    fs::write(tmp.path().join("results/garbage.yaml"), "::: not yaml").unwrap();
    fs::write(tmp.path().join("results/notes.txt"), "hello").unwrap();

    let loaded = store.load_results();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].result.student_name, "Bob");
    assert_eq!(loaded[0].file, newer);
    assert_eq!(loaded[1].result, result("Ann", "2025-01-01 10:00:00"));
    assert_eq!(loaded[1].sources, sources);
}

#[test]
fn test_missing_results_dir_is_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let store = ResultStore::new(tmp.path().join("nothing-here"));
    assert!(store.load_results().is_empty());
}

#[test]
fn test_report_of_stored_result() {
    let r = result("Ann", "2025-01-01 10:00:00");
    let summary = report::summary(&r, &[GradeScale::Percent, GradeScale::Five]);
    assert!(summary.contains("Score: 50.0%"));
    assert!(summary.contains("Grade (5-point): 3"));
    assert!(summary.contains("Time left: 00:42"));

    let mistakes = report::mistakes(&r);
    assert!(mistakes.contains("Your answer: A–X; B–Y"));
    assert!(mistakes.contains("Correct: A–Y; B–X"));
}
