use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a whole operation.
///
/// Malformed question blocks are not errors: the parser drops them and keeps
/// going. Only a document that cannot be read as text at all ends up here.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("quiz file is empty: {}", path.display())]
    Empty { path: PathBuf },

    #[error("quiz file is not UTF-8 text: {}", path.display())]
    NotText { path: PathBuf },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, QuizError>;
