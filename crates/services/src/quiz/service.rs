use std::sync::Arc;

use tracing::{debug, info, warn};

use quiz_core::Clock;
use quiz_core::engine::{FeedbackTicket, QuizEngine, Rejection, Submission, Transition};
use quiz_core::model::{Language, ResultId, SessionKey, TestConfig, TestResult};
use storage::repository::{QuizStateRepository, ResultRepository, StorageError};

use super::session::{QuizSession, Translation};
use super::settings::QuizSettings;
use crate::error::QuizError;
use crate::supplier::QuestionSupplier;
use crate::translation::Translator;

/// Orchestrates the mastery loop: supplier, engine, persistence and results.
///
/// Every state-changing call mutates the engine first and then saves, so a
/// saved state never runs ahead of the engine.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    settings: QuizSettings,
    supplier: Arc<dyn QuestionSupplier>,
    translator: Arc<dyn Translator>,
    states: Arc<dyn QuizStateRepository>,
    results: Arc<dyn ResultRepository>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        supplier: Arc<dyn QuestionSupplier>,
        translator: Arc<dyn Translator>,
        states: Arc<dyn QuizStateRepository>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            clock,
            settings: QuizSettings::default(),
            supplier,
            translator,
            states,
            results,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: QuizSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Validate the configuration, fetch questions and start or resume the
    /// student's session.
    ///
    /// A saved session for another subject, or one that no longer decodes,
    /// is replaced by a fresh one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` for an invalid configuration or name, a supplier
    /// failure (nothing is saved in that case), or a storage failure.
    pub async fn start_session(
        &self,
        student_name: &str,
        config: TestConfig,
    ) -> Result<QuizSession, QuizError> {
        let config = config.validate()?;
        let key = SessionKey::for_student(student_name)?;

        let questions = self.supplier.generate(&config).await?;

        let saved = match self.states.load_state(&key).await {
            Ok(saved) => saved,
            Err(StorageError::Serialization(reason)) => {
                warn!(key = %key, %reason, "saved quiz state is unreadable; starting fresh");
                None
            }
            Err(e) => return Err(e.into()),
        };

        let started = QuizEngine::resume_or_start(
            student_name.trim(),
            config,
            questions,
            saved,
            self.clock.now(),
        )?;
        info!(
            key = %key,
            mode = ?started.mode,
            subject = started.engine.state().subject(),
            "quiz session ready"
        );

        let mut session = QuizSession::new(key, started.engine, started.mode);
        if session.engine.is_terminal() {
            // the pending answer settled on load was the last one
            self.complete(&mut session).await?;
        } else {
            self.persist(&session).await?;
        }
        Ok(session)
    }

    /// Record an answer. The caller waits `settings().feedback_delay()` and
    /// then calls `commit_feedback` with the returned ticket.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Rejected` (nothing saved) if the engine ignored
    /// the answer, or a storage error.
    pub async fn submit_answer(
        &self,
        session: &mut QuizSession,
        selected: usize,
    ) -> Result<Submission, QuizError> {
        let submission = session.engine.submit_answer(selected, self.clock.now())?;
        self.persist(session).await?;
        Ok(submission)
    }

    /// Apply the transition scheduled by `submit_answer`. When it completes
    /// the loop, the result is stored and the saved state erased.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Rejected` for a stale or cancelled ticket, or a
    /// storage/engine error while saving or finalizing.
    pub async fn commit_feedback(
        &self,
        session: &mut QuizSession,
        ticket: &FeedbackTicket,
    ) -> Result<Transition, QuizError> {
        let transition = session.engine.commit_pending(ticket)?;
        session.display = None;
        if transition == Transition::Completed {
            self.complete(session).await?;
        } else {
            self.persist(session).await?;
        }
        Ok(transition)
    }

    /// Disarm the pending transition because the student left mid-feedback.
    /// The answer stays recorded and the move is applied on the next resume.
    ///
    /// # Errors
    ///
    /// Returns a storage error if saving fails.
    pub async fn cancel_feedback(&self, session: &mut QuizSession) -> Result<bool, QuizError> {
        let cancelled = session.engine.cancel_pending();
        if cancelled {
            self.persist(session).await?;
        }
        Ok(cancelled)
    }

    /// Flip the pause flag; returns the new value.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Rejected` once the session is over, or a storage error.
    pub async fn toggle_pause(&self, session: &mut QuizSession) -> Result<bool, QuizError> {
        if session.engine.is_terminal() {
            return Err(Rejection::Finished.into());
        }
        let paused = session.engine.toggle_pause();
        self.persist(session).await?;
        debug!(paused, "pause toggled");
        Ok(paused)
    }

    /// Switch the display language. Returns false if it was already set.
    ///
    /// # Errors
    ///
    /// Returns a storage error if saving fails.
    pub async fn set_language(
        &self,
        session: &mut QuizSession,
        language: Language,
    ) -> Result<bool, QuizError> {
        let changed = session.engine.set_language(language);
        if changed {
            session.display = None;
            self.persist(session).await?;
        }
        Ok(changed)
    }

    /// Stop now and score what has been answered.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Rejected` while feedback is pending or after the
    /// session ended, or a storage/engine error while finalizing.
    pub async fn finish_now(&self, session: &mut QuizSession) -> Result<TestResult, QuizError> {
        session.engine.finish_now()?;
        self.complete(session).await
    }

    /// Leave without finishing. Pending feedback is disarmed and the saved
    /// state kept so the student can resume later.
    ///
    /// # Errors
    ///
    /// Returns a storage error if saving fails.
    pub async fn leave(&self, session: &mut QuizSession) -> Result<(), QuizError> {
        if session.is_finished() {
            return Ok(());
        }
        session.engine.cancel_pending();
        self.persist(session).await?;
        info!(key = %session.key, "left quiz session; progress saved");
        Ok(())
    }

    /// Drop the session for good without producing a result.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the saved state cannot be erased.
    pub async fn abandon(&self, session: QuizSession) -> Result<(), QuizError> {
        self.states.erase_state(&session.key).await?;
        info!(key = %session.key, "quiz session abandoned");
        Ok(())
    }

    /// Translate the question currently on screen into the session language.
    ///
    /// Returns `None` when there is nothing to translate: no current question,
    /// the base language is selected, or the translation is already shown.
    pub async fn translate_current(&self, session: &QuizSession) -> Option<Translation> {
        let language = session.language().clone();
        if language.is_base() || session.has_current_translation() {
            return None;
        }
        let tag = session.engine.current_tag()?;
        let question = session.engine.current_question()?;
        let translated = self.translator.translate(question, &language).await;
        Some(Translation {
            tag,
            language,
            question: translated,
        })
    }

    /// Show `translation` if the student is still on the question it was
    /// made for. Late results are dropped and false is returned.
    pub fn apply_translation(&self, session: &mut QuizSession, translation: Translation) -> bool {
        let tag = translation.tag.clone();
        let applied = session.apply_translation(translation);
        if !applied {
            debug!(question = %tag.question_id, round = tag.round, "discarding stale translation");
        }
        applied
    }

    async fn persist(&self, session: &QuizSession) -> Result<(), QuizError> {
        self.states
            .save_state(&session.key, session.engine.state())
            .await?;
        Ok(())
    }

    /// Score the finished session, store the result, then erase the save.
    async fn complete(&self, session: &mut QuizSession) -> Result<TestResult, QuizError> {
        let result = session
            .engine
            .finalize(ResultId::new_v4(), self.clock.now())?;
        self.results.append_result(&result).await?;
        self.states.erase_state(&session.key).await?;
        info!(
            key = %session.key,
            accuracy = result.one_shot_accuracy(),
            rounds = result.rounds(),
            "quiz session finalized"
        );
        session.display = None;
        session.result = Some(result.clone());
        Ok(result)
    }
}
