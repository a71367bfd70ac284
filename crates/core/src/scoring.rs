//! Display-side score helpers.
//!
//! These only drive coloring and messaging. The backend owns the
//! authoritative score of an attempt.

/// Coarse band a percentage falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreTier {
    Low,
    Mid,
    High,
}

impl ScoreTier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }
}

pub const MID_THRESHOLD: f64 = 60.0;
pub const HIGH_THRESHOLD: f64 = 80.0;

/// `<60` low, `60..80` mid, `>=80` high.
#[must_use]
pub fn score_tier(score: f64) -> ScoreTier {
    if score >= HIGH_THRESHOLD {
        ScoreTier::High
    } else if score >= MID_THRESHOLD {
        ScoreTier::Mid
    } else {
        ScoreTier::Low
    }
}

/// Closing message shown with a final score.
#[must_use]
pub fn score_message(score: f64) -> &'static str {
    if score >= 90.0 {
        "Excellent work! You have mastered this topic."
    } else if score >= 80.0 {
        "Very good! You have a solid grasp of the topic."
    } else if score >= 70.0 {
        "Good job, but there is room to improve."
    } else if score >= 60.0 {
        "Passed, but you should review a few concepts."
    } else {
        "You need to review the material. Don't give up!"
    }
}

/// Percentage of correct answers among those answered so far.
#[must_use]
pub fn running_score(correct: usize, answered: usize) -> f64 {
    if answered == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let pct = correct as f64 / answered as f64 * 100.0;
    pct
}

/// Progress through a quiz, counting the current question as reached.
#[must_use]
pub fn progress_percent(current_index: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let pct = (current_index.saturating_add(1)).min(total) as f64 / total as f64 * 100.0;
    pct
}
