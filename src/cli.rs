use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "plainquiz", version, about = "Take plain-text quizzes in the terminal")]
pub struct Cli {
    /// Quiz files or directories [default: the whole library]
    pub quizzes: Vec<PathBuf>,

    /// Student name; skips the name prompt
    #[arg(long)]
    pub name: Option<String>,

    /// Time limit in minutes, 0 for none [default: from settings]
    #[arg(long, value_name = "minutes")]
    pub minutes: Option<f64>,

    /// Ask at most this many questions, 0 for all [default: from settings]
    #[arg(long, value_name = "n")]
    pub max_questions: Option<usize>,

    /// Percentage needed to pass [default: from settings]
    #[arg(long, value_name = "percent")]
    pub pass_threshold: Option<f64>,

    /// Directory of bundled quizzes [default: ./quizzes]
    #[arg(long, value_name = "dir")]
    pub library: Option<PathBuf>,

    /// List library quizzes and exit
    #[arg(long)]
    pub list: bool,

    /// Parse the quizzes, print question counts and exit
    #[arg(long)]
    pub check: bool,

    /// List stored results and exit
    #[arg(long)]
    pub results: bool,

    /// Delete every imported quiz and exit
    #[arg(long)]
    pub clear_imported: bool,

    /// Forget remembered student names and exit
    #[arg(long)]
    pub clear_names: bool,

    /// Copy a quiz file into the user library and exit
    #[arg(long, value_name = "file")]
    pub import: Option<PathBuf>,
}
