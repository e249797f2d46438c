use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A question record that the rule chain must never see.
    #[error("question {question_id}: {reason}")]
    DataIntegrity { question_id: u32, reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn integrity(question_id: u32, reason: impl Into<String>) -> Self {
        Error::DataIntegrity {
            question_id,
            reason: reason.into(),
        }
    }
}
