use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::ids::QuestionId;

/// One answer event. Attempts are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub question_id: QuestionId,
    /// Pass number (starting at 1) during which the answer was given.
    pub round: u32,
    pub is_correct: bool,
    pub user_selection: usize,
    pub timestamp: DateTime<Utc>,
}

impl Attempt {
    #[must_use]
    pub fn new(
        question_id: QuestionId,
        round: u32,
        is_correct: bool,
        user_selection: usize,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            question_id,
            round,
            is_correct,
            user_selection,
            timestamp,
        }
    }

    #[must_use]
    pub fn is_first_pass_correct(&self) -> bool {
        self.round == 1 && self.is_correct
    }
}

/// Distinct question ids that appear anywhere in `attempts`.
#[must_use]
pub fn attempted_ids(attempts: &[Attempt]) -> HashSet<&QuestionId> {
    attempts.iter().map(|a| &a.question_id).collect()
}

/// Highest round present in the ledger, or 0 for an empty ledger.
#[must_use]
pub fn max_round(attempts: &[Attempt]) -> u32 {
    attempts.iter().map(|a| a.round).max().unwrap_or(0)
}

/// The round-1 attempt for `id`, if the question was reached in the first pass.
#[must_use]
pub fn first_pass_attempt<'a>(attempts: &'a [Attempt], id: &QuestionId) -> Option<&'a Attempt> {
    attempts
        .iter()
        .find(|a| a.round == 1 && &a.question_id == id)
}
