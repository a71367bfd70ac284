use forge_core::scoring::progress_percent;

/// Aggregated view of attempt progress, useful for UI.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptProgress {
    pub index: usize,
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub percent: f64,
    pub score_so_far: f64,
}

impl AttemptProgress {
    pub(crate) fn new(
        index: usize,
        total: usize,
        answered: usize,
        correct: usize,
        score_so_far: f64,
    ) -> Self {
        Self {
            index,
            total,
            answered,
            correct,
            percent: progress_percent(index, total),
            score_so_far,
        }
    }

    /// 1-based position, as shown to the user.
    #[must_use]
    pub fn position(&self) -> usize {
        (self.index + 1).min(self.total)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.answered)
    }
}
