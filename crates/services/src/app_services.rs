use std::sync::Arc;

use tracing::{info, warn};

use quiz_core::model::{AiSettings, TestResult};
use storage::repository::{ResultRepository, Storage, StorageError};

use crate::Clock;
use crate::ai::ChatClient;
use crate::error::AppServicesError;
use crate::quiz::{QuizLoopService, QuizSettings};
use crate::supplier::{ChatQuestionSupplier, QuestionBank, QuestionSupplier};
use crate::translation::{ChatTranslator, IdentityTranslator, Translator};

/// Assembles app-facing services and picks the question source.
#[derive(Clone)]
pub struct AppServices {
    quiz: Arc<QuizLoopService>,
    results: Arc<dyn ResultRepository>,
    remote: bool,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// The remote generator and translator are used when `ai` carries an API
    /// key and `offline` is false; otherwise the built-in bank is used and
    /// questions stay untranslated.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: QuizSettings,
        ai: AiSettings,
        offline: bool,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url, settings.result_retention()).await?;
        let (supplier, translator, remote) = collaborators(ai, offline);
        info!(db_url, remote, "app services ready");
        Ok(Self::assemble(clock, settings, supplier, translator, storage, remote))
    }

    /// Build services over in-memory storage with the given collaborators.
    #[must_use]
    pub fn in_memory(
        clock: Clock,
        settings: QuizSettings,
        supplier: Arc<dyn QuestionSupplier>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        let storage = Storage::in_memory(settings.result_retention());
        Self::assemble(clock, settings, supplier, translator, storage, false)
    }

    fn assemble(
        clock: Clock,
        settings: QuizSettings,
        supplier: Arc<dyn QuestionSupplier>,
        translator: Arc<dyn Translator>,
        storage: Storage,
        remote: bool,
    ) -> Self {
        let quiz = QuizLoopService::new(
            clock,
            supplier,
            translator,
            storage.quiz_states,
            Arc::clone(&storage.results),
        )
        .with_settings(settings);
        Self {
            quiz: Arc::new(quiz),
            results: storage.results,
            remote,
        }
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn results(&self) -> Arc<dyn ResultRepository> {
        Arc::clone(&self.results)
    }

    /// True when questions come from the AI provider rather than the bank.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.remote
    }

    /// Every kept result, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the history cannot be read.
    pub async fn history(&self) -> Result<Vec<TestResult>, StorageError> {
        self.results
            .list_recent(self.quiz.settings().result_retention())
            .await
    }
}

fn collaborators(
    ai: AiSettings,
    offline: bool,
) -> (Arc<dyn QuestionSupplier>, Arc<dyn Translator>, bool) {
    if !offline && ai.enabled() {
        let client = ChatClient::new(ai);
        return (
            Arc::new(ChatQuestionSupplier::new(client.clone())),
            Arc::new(ChatTranslator::new(client)),
            true,
        );
    }
    if !offline {
        warn!("no AI API key configured; using the built-in question bank");
    }
    (
        Arc::new(QuestionBank::new().with_shuffle(true)),
        Arc::new(IdentityTranslator),
        false,
    )
}
