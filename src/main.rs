use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use plainquiz::cli::Cli;
use plainquiz::engine::SessionConfig;
use plainquiz::library::{expand_paths, Library, ResultStore, SourceRef};
use plainquiz::model::{Quiz, QuestionKind};
use plainquiz::parser;
use plainquiz::report;
use plainquiz::settings::{resolve_time_limit_seconds, Settings, TimerSetting};
use plainquiz::shuffle::sample_questions;
use plainquiz::state::{AppState, Preferences};
use plainquiz::tui;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// The terminal belongs to the TUI, so logs go to a file.
fn init_logging(path: &Path) {
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let filter = EnvFilter::try_from_env("PLAINQUIZ_LOG")
        .unwrap_or_else(|_| EnvFilter::new("plainquiz=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();

    let library = Library::open(cli.library.clone()).map_err(|e| e.to_string())?;
    library.ensure_dirs().map_err(|e| e.to_string())?;
    init_logging(&library.log_path());

    let mut settings = Settings::load_or_init(&library.settings_path()).map_err(|e| e.to_string())?;
    if let Some(minutes) = cli.minutes {
        settings.timer = TimerSetting::Minutes(minutes);
    }
    if let Some(n) = cli.max_questions {
        settings.max_questions = n;
    }
    if let Some(p) = cli.pass_threshold {
        settings.pass_threshold = p.clamp(0.0, 100.0);
    }

    let store = ResultStore::new(settings.save_dir(&library.results_dir()));

    // Handle --import
    if let Some(ref path) = cli.import {
        let dest = library.import(path).map_err(|e| e.to_string())?;
        println!("Imported to {}", dest.display());
        return Ok(());
    }

    // Handle --clear-imported
    if cli.clear_imported {
        let removed = library.clear_user_quizzes();
        println!("Removed {} imported quiz file(s)", removed);
        return Ok(());
    }

    // Handle --clear-names
    if cli.clear_names {
        library.clear_user_names().map_err(|e| e.to_string())?;
        println!("Removed remembered names");
        return Ok(());
    }

    // Handle --results
    if cli.results {
        print_results(&store);
        return Ok(());
    }

    let files = if cli.quizzes.is_empty() {
        library.find_quiz_files(!settings.hide_builtin_quizzes)
    } else {
        expand_paths(&cli.quizzes).map_err(|e| e.to_string())?
    };
    if files.is_empty() {
        return Err(format!(
            "No quiz files found in {} or {}",
            library.bundled_dir.display(),
            library.user_dir().display()
        ));
    }

    let ctx = library.parse_context();
    let mut quizzes = Vec::new();
    for file in &files {
        match parser::parse_quiz_file(file, &ctx) {
            Ok(quiz) => quizzes.push(quiz),
            Err(e) => {
                warn!(error = %e, "quiz skipped");
                eprintln!("Warning: {}", e);
            }
        }
    }

    if cli.list {
        print_list(&quizzes);
        return Ok(());
    }
    if cli.check {
        print_check(&quizzes);
        return Ok(());
    }

    let questions = Quiz::concat(&quizzes);
    if questions.is_empty() {
        return Err("No valid questions found".to_string());
    }
    let questions = sample_questions(questions, settings.max_questions, &mut rand::thread_rng());

    let quiz_name = match quizzes.as_slice() {
        [single] => single.name.clone(),
        many => format!("Mixed ({} quizzes)", many.len()),
    };
    let config = SessionConfig {
        quiz_name,
        time_limit_secs: resolve_time_limit_seconds(settings.timer, questions.len()),
        pass_threshold: settings.pass_threshold,
    };
    info!(
        quizzes = quizzes.len(),
        questions = questions.len(),
        time_limit = config.time_limit_secs,
        "starting quiz"
    );

    let prefs = Preferences {
        auto_next: settings.auto_next,
        show_timer: settings.show_timer,
        grade_mode: settings.grade_mode.clone(),
        known_names: library.load_names().offered(settings.restrict_name_to_list),
        restrict_name_to_list: settings.restrict_name_to_list,
    };
    let sources: Vec<SourceRef> = quizzes.iter().map(SourceRef::from_quiz).collect();
    let state = AppState::new(questions, config, prefs, cli.name.clone());

    let state = tui::run_tui(state, &store, &sources)?;

    if let Some(session) = &state.session {
        if let Err(e) = library.save_name(session.student_name()) {
            warn!(error = %e, "name not remembered");
        }
    }

    if let Some(result) = &state.result {
        print!("{}", report::summary(result, &settings.grade_mode));
        if let Some(delivery) = &state.delivery {
            println!("{}", delivery);
        }
    }

    Ok(())
}

fn print_list(quizzes: &[Quiz]) {
    for quiz in quizzes {
        let topic = quiz
            .questions
            .first()
            .map(|q| q.source_topic.as_str())
            .unwrap_or("");
        println!(
            "{:<40} {:>4} questions  {}  ({})",
            quiz.name,
            quiz.questions.len(),
            topic,
            quiz.file_path.display()
        );
    }
}

fn print_check(quizzes: &[Quiz]) {
    for quiz in quizzes {
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for q in &quiz.questions {
            *counts.entry(q.kind().tag()).or_default() += 1;
        }
        let breakdown = [
            QuestionKind::Single,
            QuestionKind::Multiple,
            QuestionKind::Matching,
            QuestionKind::FreeForm,
        ]
        .iter()
        .map(|k| format!("{} {}", counts.get(k.tag()).copied().unwrap_or(0), k))
        .collect::<Vec<_>>()
        .join(", ");
        println!("{}: {} questions ({})", quiz.file_path.display(), quiz.questions.len(), breakdown);
    }
}

fn print_results(store: &ResultStore) {
    let results = store.load_results();
    if results.is_empty() {
        println!("No results in {}", store.dir.display());
        return;
    }
    for stored in results {
        let r = &stored.result;
        println!(
            "{}  {:<20} {:<30} {}/{}  {:.1}%  {}",
            r.timestamp,
            r.student_name,
            r.quiz_name,
            r.correct_answers,
            r.total_questions,
            r.percentage,
            if r.passed { "passed" } else { "failed" }
        );
    }
}
