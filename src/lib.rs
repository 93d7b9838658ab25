pub mod answer;
pub mod cli;
pub mod engine;
pub mod error;
pub mod grading;
pub mod images;
pub mod library;
pub mod model;
pub mod parser;
pub mod report;
pub mod settings;
pub mod shuffle;
pub mod state;
pub mod timer;
pub mod tui;
pub mod ui;
