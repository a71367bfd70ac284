use std::fmt::Write as _;

use colored::{ColoredString, Colorize};
use forge_core::model::{
    AnswerFeedback, DifficultyBand, DifficultyLevel, Page, Question, QuizListItem,
    ResultBreakdown,
};
use forge_core::scoring::{ScoreTier, score_message, score_tier};
use services::{AttemptProgress, StatsOverview};

/// Score with its tier color.
#[must_use]
pub fn score(value: f64) -> ColoredString {
    let text = format!("{value:.0}%");
    match score_tier(value) {
        ScoreTier::High => text.green().bold(),
        ScoreTier::Mid => text.yellow().bold(),
        ScoreTier::Low => text.red().bold(),
    }
}

#[must_use]
pub fn difficulty(level: DifficultyLevel) -> ColoredString {
    let text = level.label();
    match level.band() {
        DifficultyBand::Gentle => text.green(),
        DifficultyBand::Moderate => text.yellow(),
        DifficultyBand::Demanding => text.red(),
    }
}

#[must_use]
pub fn quiz_list(page: &Page<QuizListItem>) -> String {
    if page.items.is_empty() {
        return "No quizzes yet.\n".to_string();
    }
    let mut out = String::new();
    for item in &page.items {
        let _ = writeln!(
            out,
            "{}  {}  [{}] {} · {} questions",
            item.id.to_string().dimmed(),
            item.title.bold(),
            item.topic,
            difficulty(item.difficulty),
            item.question_count,
        );
    }
    if page.has_more() {
        let _ = writeln!(
            out,
            "… {} more (use --skip {})",
            page.total.saturating_sub(page.skip + page.items.len() as u64),
            page.skip + page.items.len() as u64
        );
    }
    out
}

#[must_use]
pub fn question(progress: &AttemptProgress, question: &Question) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\n{} {}/{} ({:.0}%)",
        "Question".bold(),
        progress.position(),
        progress.total,
        progress.percent
    );
    let _ = writeln!(out, "{}", question.text());
    for (label, text) in question.options().iter() {
        let _ = writeln!(out, "  {}) {text}", label.as_str().bold());
    }
    out
}

#[must_use]
pub fn feedback(feedback: &AnswerFeedback, score_so_far: f64) -> String {
    let mut out = String::new();
    if feedback.is_correct {
        let _ = writeln!(out, "{}", "Correct!".green().bold());
    } else {
        let _ = writeln!(
            out,
            "{} The correct answer was {}.",
            "Incorrect.".red().bold(),
            feedback.correct_option.as_str().bold()
        );
    }
    if !feedback.explanation.trim().is_empty() {
        let _ = writeln!(out, "{}", feedback.explanation.italic());
    }
    let _ = writeln!(out, "Score so far: {}", score(score_so_far));
    out
}

#[must_use]
pub fn results(results: &ResultBreakdown) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\n{} {}  ({} correct, {} incorrect of {})",
        "Final score:".bold(),
        score(results.score()),
        results.correct_answers(),
        results.incorrect_answers(),
        results.total_questions()
    );
    let _ = writeln!(out, "{}", score_message(results.score()));

    for (index, row) in results.questions().iter().enumerate() {
        let mark = if row.is_correct { "✓".green() } else { "✗".red() };
        let _ = writeln!(out, "\n{mark} {}. {}", index + 1, row.question_text);
        for (label, text) in row.options.iter() {
            let line = format!("{}) {text}", label.as_str());
            let line = if label == row.correct_option {
                line.green()
            } else if label == row.selected_option {
                line.red()
            } else {
                line.normal()
            };
            let _ = writeln!(out, "   {line}");
        }
        if !row.is_correct {
            let _ = writeln!(
                out,
                "   You chose {}, correct was {}.",
                row.selected_option, row.correct_option
            );
        }
        if !row.explanation.trim().is_empty() {
            let _ = writeln!(out, "   {}", row.explanation.italic());
        }
    }
    out
}

#[must_use]
pub fn stats(overview: &StatsOverview) -> String {
    let mut out = String::new();
    let summary = &overview.summary;
    let _ = writeln!(out, "{}", "Overview".bold());
    let _ = writeln!(out, "  Quizzes:            {}", summary.total_quizzes);
    let _ = writeln!(out, "  Summaries:          {}", summary.total_summaries);
    let _ = writeln!(out, "  Completed attempts: {}", summary.total_completed_attempts);
    let _ = writeln!(out, "  Average score:      {}", score(summary.avg_score));
    let _ = writeln!(out, "  Best score:         {}", score(summary.best_score));
    let _ = writeln!(out, "  Topics studied:     {}", summary.unique_topics_studied);

    if !overview.progress.progress_by_topic.is_empty() {
        let _ = writeln!(out, "\n{}", "By topic".bold());
        for topic in &overview.progress.progress_by_topic {
            let _ = writeln!(
                out,
                "  {:<20} {:>3} attempts  avg {}  best {}  worst {}",
                topic.topic,
                topic.total_attempts,
                score(topic.avg_score),
                score(topic.max_score),
                score(topic.min_score)
            );
        }
    }

    if !overview.performance.recent_attempts.is_empty() {
        let _ = writeln!(out, "\n{}", "Recent attempts".bold());
        for attempt in &overview.performance.recent_attempts {
            let _ = writeln!(
                out,
                "  {}  {}  {}  {}",
                attempt.completed_at.format("%Y-%m-%d %H:%M"),
                score(attempt.score),
                attempt.quiz_title,
                attempt.attempt_id.to_string().dimmed()
            );
        }
    }
    out
}
