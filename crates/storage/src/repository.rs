use async_trait::async_trait;
use quiz_core::engine::EngineState;
use quiz_core::model::{ResultId, SessionKey, TestResult};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::warn;

/// How many finalized results are kept. Appending beyond this evicts the oldest.
pub const RESULT_RETENTION: usize = 500;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the single in-progress quiz per student.
#[async_trait]
pub trait QuizStateRepository: Send + Sync {
    /// Persist the state under `key`, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the state cannot be encoded or stored.
    async fn save_state(&self, key: &SessionKey, state: &EngineState) -> Result<(), StorageError>;

    /// Fetch the saved state for `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored blob no longer
    /// decodes, or other storage errors.
    async fn load_state(&self, key: &SessionKey) -> Result<Option<EngineState>, StorageError>;

    /// Remove the saved state for `key`. Erasing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn erase_state(&self, key: &SessionKey) -> Result<(), StorageError>;
}

/// Repository contract for finalized results, newest first.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    /// Store a result and evict the oldest ones past [`RESULT_RETENTION`].
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a result with the same id exists.
    async fn append_result(&self, result: &TestResult) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: ResultId) -> Result<TestResult, StorageError>;

    /// Up to `limit` results, most recently appended first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or decode failure.
    async fn list_recent(&self, limit: usize) -> Result<Vec<TestResult>, StorageError>;

    /// All kept results for one class, most recently appended first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on read or decode failure.
    async fn list_for_class(&self, class_name: &str) -> Result<Vec<TestResult>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone)]
pub struct InMemoryRepository {
    states: Arc<Mutex<HashMap<SessionKey, EngineState>>>,
    results: Arc<Mutex<VecDeque<TestResult>>>,
    retention: usize,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::with_retention(RESULT_RETENTION)
    }

    /// Same as `new` but with a custom result cap.
    #[must_use]
    pub fn with_retention(retention: usize) -> Self {
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
            results: Arc::new(Mutex::new(VecDeque::new())),
            retention: retention.max(1),
        }
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl QuizStateRepository for InMemoryRepository {
    async fn save_state(&self, key: &SessionKey, state: &EngineState) -> Result<(), StorageError> {
        let mut guard = self.states.lock().map_err(poisoned)?;
        guard.insert(key.clone(), state.clone());
        Ok(())
    }

    async fn load_state(&self, key: &SessionKey) -> Result<Option<EngineState>, StorageError> {
        let guard = self.states.lock().map_err(poisoned)?;
        Ok(guard.get(key).cloned())
    }

    async fn erase_state(&self, key: &SessionKey) -> Result<(), StorageError> {
        let mut guard = self.states.lock().map_err(poisoned)?;
        guard.remove(key);
        Ok(())
    }
}

#[async_trait]
impl ResultRepository for InMemoryRepository {
    async fn append_result(&self, result: &TestResult) -> Result<(), StorageError> {
        let mut guard = self.results.lock().map_err(poisoned)?;
        if guard.iter().any(|r| r.id() == result.id()) {
            return Err(StorageError::Conflict);
        }
        guard.push_front(result.clone());
        if guard.len() > self.retention {
            let evicted = guard.len() - self.retention;
            guard.truncate(self.retention);
            warn!(evicted, "evicted old results past retention");
        }
        Ok(())
    }

    async fn get_result(&self, id: ResultId) -> Result<TestResult, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        guard
            .iter()
            .find(|r| r.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<TestResult>, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        Ok(guard.iter().take(limit).cloned().collect())
    }

    async fn list_for_class(&self, class_name: &str) -> Result<Vec<TestResult>, StorageError> {
        let guard = self.results.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|r| r.config().class_name == class_name)
            .cloned()
            .collect())
    }
}

/// Aggregates repositories for higher layers (services/UI).
#[derive(Clone)]
pub struct Storage {
    pub quiz_states: Arc<dyn QuizStateRepository>,
    pub results: Arc<dyn ResultRepository>,
}

impl Storage {
    /// Both repositories over one `InMemoryRepository` keeping `result_retention` results.
    #[must_use]
    pub fn in_memory(result_retention: usize) -> Self {
        let repo = InMemoryRepository::with_retention(result_retention);
        let quiz_states: Arc<dyn QuizStateRepository> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo);
        Self {
            quiz_states,
            results,
        }
    }
}
