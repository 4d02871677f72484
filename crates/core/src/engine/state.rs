use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::{Attempt, Language, Question, QuestionId, TestConfig};

//
// ─── FEEDBACK TICKET ───────────────────────────────────────────────────────────
//

/// Handle for the transition scheduled after an answer is recorded.
///
/// The scheduler that owns the feedback delay hands this back to
/// [`QuizEngine::commit_pending`](super::QuizEngine::commit_pending); a ticket
/// from an earlier answer never matches a later one because `sequence` is the
/// ledger position of the attempt that created it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackTicket {
    pub question_id: QuestionId,
    pub round: u32,
    pub sequence: usize,
}

/// A recorded answer whose index/round transition has not been applied yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingFeedback {
    pub ticket: FeedbackTicket,
    pub is_correct: bool,
    /// Cleared when the student navigates away; a disarmed transition is only
    /// settled by the next resume.
    pub armed: bool,
}

//
// ─── ENGINE STATE ──────────────────────────────────────────────────────────────
//

/// Everything needed to pick a session back up after a reload.
///
/// This is the value the persistence collaborator stores under the
/// session key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub(crate) student_name: String,
    pub(crate) config: TestConfig,
    /// Full supplied set, in supply order.
    pub(crate) questions: Vec<Question>,
    pub(crate) active_pool: Vec<Question>,
    pub(crate) miss_queue: Vec<Question>,
    pub(crate) current_index: usize,
    pub(crate) round: u32,
    pub(crate) attempts: Vec<Attempt>,
    pub(crate) paused: bool,
    pub(crate) start_time: DateTime<Utc>,
    #[serde(default)]
    pub(crate) language: Language,
    #[serde(default)]
    pub(crate) pending: Option<PendingFeedback>,
}

/// Why a stored state cannot be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateDefect {
    NoQuestions,
    ZeroRound,
    IndexOutOfRange,
    UnknownQuestion,
    EmptyPool,
    DanglingPending,
}

impl EngineState {
    pub(crate) fn fresh(
        student_name: String,
        config: TestConfig,
        questions: Vec<Question>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            student_name,
            config,
            active_pool: questions.clone(),
            questions,
            miss_queue: Vec::new(),
            current_index: 0,
            round: 1,
            attempts: Vec::new(),
            paused: false,
            start_time,
            language: Language::base(),
            pending: None,
        }
    }

    #[must_use]
    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    #[must_use]
    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.config.subject
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn active_pool(&self) -> &[Question] {
        &self.active_pool
    }

    #[must_use]
    pub fn miss_queue(&self) -> &[Question] {
        &self.miss_queue
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    #[must_use]
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    #[must_use]
    pub fn language(&self) -> &Language {
        &self.language
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingFeedback> {
        self.pending.as_ref()
    }

    /// Structural checks run before a stored state is resumed.
    ///
    /// # Errors
    ///
    /// Returns the first `StateDefect` found.
    pub fn check(&self) -> Result<(), StateDefect> {
        if self.questions.is_empty() {
            return Err(StateDefect::NoQuestions);
        }
        if self.round == 0 {
            return Err(StateDefect::ZeroRound);
        }
        if self.active_pool.is_empty() {
            return Err(StateDefect::EmptyPool);
        }
        if self.current_index > self.active_pool.len() {
            return Err(StateDefect::IndexOutOfRange);
        }
        if self.pending.is_some() && self.current_index >= self.active_pool.len() {
            return Err(StateDefect::DanglingPending);
        }
        let known: HashSet<&QuestionId> = self.questions.iter().map(Question::id).collect();
        let all_known = self
            .active_pool
            .iter()
            .chain(self.miss_queue.iter())
            .map(Question::id)
            .chain(self.attempts.iter().map(|a| &a.question_id))
            .all(|id| known.contains(id));
        if !all_known {
            return Err(StateDefect::UnknownQuestion);
        }
        Ok(())
    }
}
