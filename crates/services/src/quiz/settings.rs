use std::time::Duration;

use storage::repository::RESULT_RETENTION;

/// Default pause between showing feedback and moving on.
pub const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_millis(1200);

/// Tunables for the quiz workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSettings {
    feedback_delay: Duration,
    result_retention: usize,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            feedback_delay: DEFAULT_FEEDBACK_DELAY,
            result_retention: RESULT_RETENTION,
        }
    }
}

impl QuizSettings {
    #[must_use]
    pub fn with_feedback_delay(mut self, delay: Duration) -> Self {
        self.feedback_delay = delay;
        self
    }

    /// A zero retention would drop every result as soon as it is stored, so
    /// it is raised to 1.
    #[must_use]
    pub fn with_result_retention(mut self, retention: usize) -> Self {
        self.result_retention = retention.max(1);
        self
    }

    /// How long the caller should show feedback before calling
    /// `QuizLoopService::commit_feedback`.
    #[must_use]
    pub fn feedback_delay(&self) -> Duration {
        self.feedback_delay
    }

    #[must_use]
    pub fn result_retention(&self) -> usize {
        self.result_retention
    }
}
