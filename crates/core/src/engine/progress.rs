/// Read-only snapshot of where a session stands, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Distinct questions supplied at session start.
    pub total_questions: usize,
    /// Distinct questions with at least one attempt.
    pub attempted: usize,
    pub round: u32,
    /// 1-based position in the current round's pool (0 once the pool is exhausted).
    pub position: usize,
    pub pool_size: usize,
    pub carried_to_next_round: usize,
    pub paused: bool,
    pub is_complete: bool,
}

impl Progress {
    /// `attempted / total_questions` as a whole percentage, never above 100.
    #[must_use]
    pub fn percent(&self) -> u32 {
        if self.total_questions == 0 {
            return 0;
        }
        let pct = self.attempted.saturating_mul(100) / self.total_questions;
        u32::try_from(pct.min(100)).unwrap_or(100)
    }
}
