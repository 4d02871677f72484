//! Reconciling a freshly supplied question set with a saved session.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::state::{EngineState, StateDefect};
use super::{EngineError, QuizEngine, Transition};
use crate::model::{Question, TestConfig};

/// Why a saved state was thrown away in favour of a fresh start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    SubjectMismatch { saved: String, requested: String },
    Invalid(StateDefect),
}

/// How the engine came to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartMode {
    /// Nothing was saved for this student.
    Fresh,
    /// A saved session was picked up. `settled` is the transition that had
    /// been left pending when the previous run stopped, applied on load.
    Resumed { settled: Option<Transition> },
    /// Something was saved but could not be used.
    Discarded(DiscardReason),
}

#[derive(Debug)]
pub struct Started {
    pub engine: QuizEngine,
    pub mode: StartMode,
}

impl QuizEngine {
    /// Start a session, reusing `saved` when it belongs to the same subject.
    ///
    /// A matching saved state is restored field for field (pool, miss queue,
    /// index, round, ledger, pause flag, start time, language) and the freshly
    /// supplied `questions` are ignored. A mismatched or structurally broken
    /// state is dropped without surfacing an error.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` only when a fresh start is needed and `questions`
    /// is empty or contains duplicate ids.
    pub fn resume_or_start(
        student_name: impl Into<String>,
        config: TestConfig,
        questions: Vec<Question>,
        saved: Option<EngineState>,
        now: DateTime<Utc>,
    ) -> Result<Started, EngineError> {
        let student_name = student_name.into();

        let Some(saved) = saved else {
            let engine = QuizEngine::start(student_name, config, questions, now)?;
            return Ok(Started {
                engine,
                mode: StartMode::Fresh,
            });
        };

        let reason = if saved.config.same_subject(&config) {
            match saved.check() {
                Ok(()) => {
                    debug!(
                        discarded = questions.len(),
                        "saved session matches subject; ignoring freshly supplied questions"
                    );
                    let (engine, settled) = QuizEngine::restore(saved);
                    info!(
                        round = engine.state().round(),
                        attempts = engine.state().attempts().len(),
                        "resumed quiz session"
                    );
                    return Ok(Started {
                        engine,
                        mode: StartMode::Resumed { settled },
                    });
                }
                Err(defect) => DiscardReason::Invalid(defect),
            }
        } else {
            DiscardReason::SubjectMismatch {
                saved: saved.config.subject.clone(),
                requested: config.subject.clone(),
            }
        };

        warn!(?reason, "discarding saved quiz state");
        let engine = QuizEngine::start(student_name, config, questions, now)?;
        Ok(Started {
            engine,
            mode: StartMode::Discarded(reason),
        })
    }
}
