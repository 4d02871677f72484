//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::engine::{EngineError, Rejection};
use quiz_core::model::{ConfigError, QuestionError, SessionKeyError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ChatClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AiError {
    #[error("AI provider is not configured")]
    Disabled,
    #[error("AI provider returned an empty response")]
    EmptyResponse,
    #[error("AI request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by question suppliers. Any of these aborts the session
/// before a question pool exists.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error("could not parse generated questions: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("generated question is invalid: {0}")]
    Schema(#[from] QuestionError),
    #[error("generated questions repeat id {0}")]
    DuplicateId(String),
    #[error("no questions available for this configuration")]
    Empty,
}

/// Failures inside the translator. Never surfaced: the translator falls back
/// to the original question.
#[derive(Debug, Error)]
pub(crate) enum TranslationError {
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error("could not parse translation: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("translation returned {got} options, expected {expected}")]
    OptionCount { expected: usize, got: usize },
    #[error(transparent)]
    Question(#[from] QuestionError),
}

/// Errors emitted by `QuizLoopService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    SessionKey(#[from] SessionKeyError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The engine ignored the request; nothing changed and nothing was saved.
    #[error("request ignored: {0}")]
    Rejected(#[from] Rejection),
}

impl QuizError {
    /// True for ignored requests, which callers usually just report and move past.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
