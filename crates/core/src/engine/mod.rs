//! Round-based retry loop ("mastery loop").
//!
//! A session walks the active pool in order. Wrong answers go to the miss
//! queue; when the pool runs out the miss queue becomes the next round's
//! pool. The session completes when a round ends with nothing missed.
//!
//! Answer handling is split in two: [`QuizEngine::submit_answer`] records the
//! attempt right away, and [`QuizEngine::commit_pending`] applies the
//! index/round transition once the feedback delay has elapsed. The delay
//! itself lives with the caller.

mod progress;
mod resume;
mod state;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::model::{
    Attempt, Language, Question, QuestionId, ResultError, ResultId, TestConfig, TestResult,
    attempted_ids,
};

pub use progress::Progress;
pub use resume::{DiscardReason, StartMode, Started};
pub use state::{EngineState, FeedbackTicket, PendingFeedback, StateDefect};

//
// ─── ERRORS & REJECTIONS ───────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("no questions supplied")]
    NoQuestions,
    #[error("duplicate question id in supplied set: {0}")]
    DuplicateQuestion(QuestionId),
    #[error("session has not finished yet")]
    NotFinished,
    #[error(transparent)]
    Result(#[from] ResultError),
}

/// A request the engine ignored. State is unchanged whenever one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("session is paused")]
    Paused,
    #[error("feedback for the previous answer is still pending")]
    FeedbackPending,
    #[error("there is no current question")]
    NoCurrentQuestion,
    #[error("option {selected} does not exist")]
    InvalidOption { selected: usize },
    #[error("session already finished")]
    Finished,
    #[error("no feedback is pending")]
    NoPendingFeedback,
    #[error("ticket does not match the pending feedback")]
    StaleTicket,
    #[error("pending feedback was cancelled")]
    Disarmed,
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Active,
    /// A round ended with an empty miss queue.
    Completed,
    /// The student stopped before the loop completed.
    FinishedEarly,
}

/// What `submit_answer` recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ticket: FeedbackTicket,
    pub is_correct: bool,
    pub correct_answer: usize,
}

/// What `commit_pending` did to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advanced { index: usize },
    NewRound { round: u32, pool_size: usize },
    Completed,
}

/// Identifies the question an asynchronous enrichment (translation) was
/// started for, so a late result can be recognised as stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnrichmentTag {
    pub question_id: QuestionId,
    pub round: u32,
    pub index: usize,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

#[derive(Debug)]
pub struct QuizEngine {
    state: EngineState,
    status: EngineStatus,
}

impl QuizEngine {
    /// Fresh session over `questions` in the given order.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoQuestions` for an empty set and
    /// `EngineError::DuplicateQuestion` if two questions share an id.
    pub fn start(
        student_name: impl Into<String>,
        config: TestConfig,
        questions: Vec<Question>,
        now: DateTime<Utc>,
    ) -> Result<Self, EngineError> {
        if questions.is_empty() {
            return Err(EngineError::NoQuestions);
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for q in &questions {
            if !seen.insert(q.id()) {
                return Err(EngineError::DuplicateQuestion(q.id().clone()));
            }
        }

        debug!(questions = questions.len(), "starting fresh quiz session");
        Ok(Self {
            state: EngineState::fresh(student_name.into(), config, questions, now),
            status: EngineStatus::Active,
        })
    }

    /// Rebuild an engine from a checked state, settling any transition that
    /// was still pending when it was saved.
    fn restore(state: EngineState) -> (Self, Option<Transition>) {
        let mut engine = Self {
            status: EngineStatus::Active,
            state,
        };
        let settled = if engine.state.pending.is_some() {
            engine.settle_pending()
        } else if engine.state.current_index >= engine.state.active_pool.len() {
            Some(engine.end_round())
        } else {
            None
        };
        (engine, settled)
    }

    #[must_use]
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    #[must_use]
    pub fn status(&self) -> EngineStatus {
        self.status
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status != EngineStatus::Active
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == EngineStatus::Completed
    }

    #[must_use]
    pub fn has_pending_feedback(&self) -> bool {
        self.state.pending.is_some()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.is_terminal() {
            return None;
        }
        self.state.active_pool.get(self.state.current_index)
    }

    #[must_use]
    pub fn current_tag(&self) -> Option<EnrichmentTag> {
        self.current_question().map(|q| EnrichmentTag {
            question_id: q.id().clone(),
            round: self.state.round,
            index: self.state.current_index,
        })
    }

    /// True while `tag` still names the question on screen.
    #[must_use]
    pub fn is_current(&self, tag: &EnrichmentTag) -> bool {
        self.current_tag().as_ref() == Some(tag)
    }

    #[must_use]
    pub fn progress(&self) -> Progress {
        let total_questions = self
            .state
            .questions
            .iter()
            .map(Question::id)
            .collect::<HashSet<_>>()
            .len();
        let position = if self.state.current_index < self.state.active_pool.len() {
            self.state.current_index + 1
        } else {
            0
        };
        Progress {
            total_questions,
            attempted: attempted_ids(&self.state.attempts).len(),
            round: self.state.round,
            position,
            pool_size: self.state.active_pool.len(),
            carried_to_next_round: self.state.miss_queue.len(),
            paused: self.state.paused,
            is_complete: self.is_complete(),
        }
    }

    /// Record an answer for the current question.
    ///
    /// The attempt is appended and, if wrong, the question is queued for the
    /// next round. The index does not move until `commit_pending` is called
    /// with the returned ticket.
    ///
    /// # Errors
    ///
    /// Returns a `Rejection` (and changes nothing) if the session is finished
    /// or paused, feedback is still pending, there is no current question, or
    /// `selected` is not an option index.
    pub fn submit_answer(
        &mut self,
        selected: usize,
        now: DateTime<Utc>,
    ) -> Result<Submission, Rejection> {
        if self.is_terminal() {
            return Err(Rejection::Finished);
        }
        if self.state.paused {
            return Err(Rejection::Paused);
        }
        if self.state.pending.is_some() {
            return Err(Rejection::FeedbackPending);
        }
        let question = self
            .state
            .active_pool
            .get(self.state.current_index)
            .ok_or(Rejection::NoCurrentQuestion)?;
        if selected >= question.options().len() {
            return Err(Rejection::InvalidOption { selected });
        }

        let is_correct = question.is_correct(selected);
        let correct_answer = question.correct_answer();
        let question_id = question.id().clone();
        if !is_correct {
            self.state.miss_queue.push(question.clone());
        }

        let ticket = FeedbackTicket {
            question_id: question_id.clone(),
            round: self.state.round,
            sequence: self.state.attempts.len(),
        };
        self.state.attempts.push(Attempt::new(
            question_id,
            self.state.round,
            is_correct,
            selected,
            now,
        ));
        self.state.pending = Some(PendingFeedback {
            ticket: ticket.clone(),
            is_correct,
            armed: true,
        });

        debug!(
            question = %ticket.question_id,
            round = ticket.round,
            is_correct,
            "answer recorded"
        );
        Ok(Submission {
            ticket,
            is_correct,
            correct_answer,
        })
    }

    /// Apply the transition scheduled by `submit_answer`.
    ///
    /// # Errors
    ///
    /// Returns a `Rejection` if nothing is pending, the ticket belongs to a
    /// different answer, or the pending transition was cancelled.
    pub fn commit_pending(&mut self, ticket: &FeedbackTicket) -> Result<Transition, Rejection> {
        let pending = self
            .state
            .pending
            .as_ref()
            .ok_or(Rejection::NoPendingFeedback)?;
        if &pending.ticket != ticket {
            return Err(Rejection::StaleTicket);
        }
        if !pending.armed {
            return Err(Rejection::Disarmed);
        }
        Ok(self.apply_transition())
    }

    /// Disarm the pending transition (the student navigated away).
    ///
    /// The recorded attempt stays; the transition is applied when the session
    /// is next resumed. Returns false if nothing was armed.
    pub fn cancel_pending(&mut self) -> bool {
        match self.state.pending.as_mut() {
            Some(pending) if pending.armed => {
                pending.armed = false;
                debug!(question = %pending.ticket.question_id, "pending feedback cancelled");
                true
            }
            _ => false,
        }
    }

    /// Apply whatever transition is pending, armed or not.
    ///
    /// Used when the answer must count before anything else happens, such as
    /// finishing early or reopening a saved session.
    pub fn settle_pending(&mut self) -> Option<Transition> {
        self.state.pending.as_ref()?;
        Some(self.apply_transition())
    }

    fn apply_transition(&mut self) -> Transition {
        self.state.pending = None;

        if self.state.current_index + 1 < self.state.active_pool.len() {
            self.state.current_index += 1;
            return Transition::Advanced {
                index: self.state.current_index,
            };
        }

        self.state.current_index = self.state.active_pool.len();
        self.end_round()
    }

    /// Called with the pool exhausted: either roll the miss queue into a new
    /// round or mark the loop complete.
    fn end_round(&mut self) -> Transition {
        if self.state.miss_queue.is_empty() {
            self.status = EngineStatus::Completed;
            debug!(round = self.state.round, "mastery loop complete");
            return Transition::Completed;
        }

        let s = &mut self.state;
        s.active_pool = std::mem::take(&mut s.miss_queue);
        s.current_index = 0;
        s.round += 1;
        debug!(round = s.round, pool = s.active_pool.len(), "starting retry round");
        Transition::NewRound {
            round: s.round,
            pool_size: s.active_pool.len(),
        }
    }

    /// Returns true if the flag changed.
    pub fn pause(&mut self) -> bool {
        self.set_paused(true)
    }

    /// Returns true if the flag changed.
    pub fn resume(&mut self) -> bool {
        self.set_paused(false)
    }

    /// Flip the pause flag and return the new value.
    pub fn toggle_pause(&mut self) -> bool {
        let next = !self.state.paused;
        self.set_paused(next);
        self.state.paused
    }

    fn set_paused(&mut self, paused: bool) -> bool {
        if self.is_terminal() || self.state.paused == paused {
            return false;
        }
        self.state.paused = paused;
        true
    }

    /// Returns true if the language changed.
    pub fn set_language(&mut self, language: Language) -> bool {
        if self.is_terminal() || self.state.language == language {
            return false;
        }
        self.state.language = language;
        true
    }

    /// Stop now and score whatever has been answered.
    ///
    /// # Errors
    ///
    /// Returns `Rejection::FeedbackPending` while a transition is scheduled and
    /// `Rejection::Finished` if the session already ended.
    pub fn finish_now(&mut self) -> Result<(), Rejection> {
        if self.is_terminal() {
            return Err(Rejection::Finished);
        }
        if self.state.pending.is_some() {
            return Err(Rejection::FeedbackPending);
        }
        self.status = EngineStatus::FinishedEarly;
        debug!(attempts = self.state.attempts.len(), "session finished early");
        Ok(())
    }

    /// Hand the ledger to the result aggregator.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotFinished` if the session is still active, or a
    /// `ResultError` if `end_time` precedes the session start.
    pub fn finalize(&self, id: ResultId, end_time: DateTime<Utc>) -> Result<TestResult, EngineError> {
        if !self.is_terminal() {
            return Err(EngineError::NotFinished);
        }
        Ok(TestResult::finalize(
            id,
            self.state.student_name.clone(),
            self.state.config.clone(),
            self.state.attempts.clone(),
            self.state.start_time,
            end_time,
        )?)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
