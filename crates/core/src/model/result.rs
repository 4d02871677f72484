use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::attempt::{Attempt, attempted_ids, max_round};
use crate::model::config::TestConfig;
use crate::model::ids::ResultId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("end_time is before start_time")]
    InvalidTimeRange,

    #[error("accuracy {0} is above 100")]
    AccuracyOutOfRange(u32),
}

/// Percentage of attempted questions answered correctly in round 1.
///
/// The denominator is the number of distinct questions that appear in the
/// ledger (at least 1), not the size of the supplied set, and correct answers
/// from retry rounds earn nothing. Rounds half up like the score shown to
/// students always has.
#[must_use]
pub fn one_shot_accuracy(attempts: &[Attempt]) -> u32 {
    let first_pass_correct = attempts.iter().filter(|a| a.is_first_pass_correct()).count();
    let attempted = attempted_ids(attempts).len().max(1);

    let numerator = first_pass_correct.saturating_mul(200).saturating_add(attempted);
    let pct = numerator / attempted.saturating_mul(2);
    u32::try_from(pct).unwrap_or(u32::MAX)
}

/// Finalized outcome of one quiz session. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    id: ResultId,
    student_name: String,
    config: TestConfig,
    attempts: Vec<Attempt>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    one_shot_accuracy: u32,
}

impl TestResult {
    /// Build the terminal result from a session's attempt ledger.
    ///
    /// # Errors
    ///
    /// Returns `ResultError::InvalidTimeRange` if `end_time` is before `start_time`.
    pub fn finalize(
        id: ResultId,
        student_name: impl Into<String>,
        config: TestConfig,
        attempts: Vec<Attempt>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Self, ResultError> {
        if end_time < start_time {
            return Err(ResultError::InvalidTimeRange);
        }
        let one_shot_accuracy = one_shot_accuracy(&attempts);
        Ok(Self {
            id,
            student_name: student_name.into(),
            config,
            attempts,
            start_time,
            end_time,
            one_shot_accuracy,
        })
    }

    /// Rehydrate a stored result. The stored accuracy is kept as-is.
    ///
    /// # Errors
    ///
    /// Returns `ResultError` if the time range is inverted or the accuracy is above 100.
    pub fn from_persisted(
        id: ResultId,
        student_name: String,
        config: TestConfig,
        attempts: Vec<Attempt>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        one_shot_accuracy: u32,
    ) -> Result<Self, ResultError> {
        if end_time < start_time {
            return Err(ResultError::InvalidTimeRange);
        }
        if one_shot_accuracy > 100 {
            return Err(ResultError::AccuracyOutOfRange(one_shot_accuracy));
        }
        Ok(Self {
            id,
            student_name,
            config,
            attempts,
            start_time,
            end_time,
            one_shot_accuracy,
        })
    }

    #[must_use]
    pub fn id(&self) -> ResultId {
        self.id
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
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    #[must_use]
    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    #[must_use]
    pub fn one_shot_accuracy(&self) -> u32 {
        self.one_shot_accuracy
    }

    /// Number of passes the session needed (0 if nothing was answered).
    #[must_use]
    pub fn rounds(&self) -> u32 {
        max_round(&self.attempts)
    }

    #[must_use]
    pub fn attempted_count(&self) -> usize {
        attempted_ids(&self.attempts).len()
    }
}
