//! Aggregate statistics over recorded attempts.
//!
//! Both aggregations scan the full attempt history they are given; nothing
//! is materialized between calls.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::{Question, QuestionId, QuizAttempt, QuizSetId};

/// Categories averaging at least this score count as strong.
pub const STRONG_CATEGORY_SCORE: f64 = 70.0;
const CATEGORY_PICKS: usize = 3;

//
// ─── QUIZ SET ANALYTICS ────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStats {
    pub question_id: QuestionId,
    /// Fraction in `0.0..=1.0`.
    pub correct_rate: f64,
    /// Per-question timing is not recorded, so this is always `None`.
    pub avg_time_spent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAnalytics {
    pub total_attempts: u64,
    pub average_score: f64,
    /// Fraction in `0.0..=1.0`.
    pub completion_rate: f64,
    pub question_stats: Vec<QuestionStats>,
}

impl QuizAnalytics {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            total_attempts: 0,
            average_score: 0.0,
            completion_rate: 0.0,
            question_stats: Vec::new(),
        }
    }
}

/// Statistics for one quiz set from its current questions and all attempts
/// recorded against it.
///
/// Per-question stats follow the order of `questions`. Results for questions
/// that have since been deleted are ignored.
#[must_use]
pub fn quiz_set_analytics(questions: &[Question], attempts: &[QuizAttempt]) -> QuizAnalytics {
    if attempts.is_empty() {
        return QuizAnalytics::empty();
    }

    let total = attempts.len() as f64;
    let average_score = attempts.iter().map(|a| a.score).sum::<f64>() / total;
    let completed = attempts.iter().filter(|a| a.completed_at.is_some()).count();
    let completion_rate = completed as f64 / total;

    // question id -> (correct, answered)
    let mut tallies: HashMap<QuestionId, (u32, u32)> = HashMap::new();
    for result in attempts.iter().flat_map(|a| &a.detailed_results) {
        let entry = tallies.entry(result.question_id).or_default();
        entry.1 += 1;
        if result.correct {
            entry.0 += 1;
        }
    }

    let question_stats = questions
        .iter()
        .map(|q| {
            let (correct, answered) = tallies.get(&q.id).copied().unwrap_or_default();
            QuestionStats {
                question_id: q.id,
                correct_rate: if answered == 0 {
                    0.0
                } else {
                    f64::from(correct) / f64::from(answered)
                },
                avg_time_spent: None,
            }
        })
        .collect();

    QuizAnalytics {
        total_attempts: attempts.len() as u64,
        average_score,
        completion_rate,
        question_stats,
    }
}

//
// ─── USER STATS ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    /// Distinct quiz sets attempted.
    pub total_quizzes: u64,
    /// Attempts recorded.
    pub completed_quizzes: u64,
    pub average_score: f64,
    pub total_time_spent: u64,
    pub strong_categories: Vec<String>,
    pub weak_categories: Vec<String>,
}

impl UserStats {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            total_quizzes: 0,
            completed_quizzes: 0,
            average_score: 0.0,
            total_time_spent: 0,
            strong_categories: Vec::new(),
            weak_categories: Vec::new(),
        }
    }
}

/// Statistics for one user's attempts.
///
/// `categories` maps quiz set ids to their category; attempts whose quiz set
/// is missing from it still count toward the totals but not toward any
/// category.
///
/// Categories are ranked by average score, highest first, ties keeping the
/// order in which categories first appear in `attempts`. Strong categories
/// are picked from the top three, weak ones from the bottom three; with few
/// categories those windows overlap, and the score threshold decides.
#[must_use]
pub fn user_stats(attempts: &[QuizAttempt], categories: &HashMap<QuizSetId, String>) -> UserStats {
    if attempts.is_empty() {
        return UserStats::empty();
    }

    let total_quizzes = attempts
        .iter()
        .map(|a| a.quiz_set_id)
        .collect::<HashSet<_>>()
        .len() as u64;
    let completed_quizzes = attempts.len() as u64;
    let average_score = attempts.iter().map(|a| a.score).sum::<f64>() / attempts.len() as f64;
    let total_time_spent = attempts.iter().map(|a| u64::from(a.time_spent)).sum();

    let ranked = rank_categories(attempts, categories);
    let strong_categories = ranked
        .iter()
        .take(CATEGORY_PICKS)
        .filter(|(_, avg)| *avg >= STRONG_CATEGORY_SCORE)
        .map(|(name, _)| name.clone())
        .collect();
    let weak_categories = ranked
        .iter()
        .skip(ranked.len().saturating_sub(CATEGORY_PICKS))
        .filter(|(_, avg)| *avg < STRONG_CATEGORY_SCORE)
        .map(|(name, _)| name.clone())
        .collect();

    UserStats {
        total_quizzes,
        completed_quizzes,
        average_score,
        total_time_spent,
        strong_categories,
        weak_categories,
    }
}

/// Category averages sorted descending; stable for ties.
fn rank_categories(
    attempts: &[QuizAttempt],
    categories: &HashMap<QuizSetId, String>,
) -> Vec<(String, f64)> {
    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<&str, (f64, u32)> = HashMap::new();

    for attempt in attempts {
        let Some(category) = categories.get(&attempt.quiz_set_id) else {
            continue;
        };
        let entry = sums.entry(category.as_str()).or_insert_with(|| {
            order.push(category.clone());
            (0.0, 0)
        });
        entry.0 += attempt.score;
        entry.1 += 1;
    }

    let mut ranked: Vec<(String, f64)> = order
        .into_iter()
        .map(|name| {
            let (sum, count) = sums[name.as_str()];
            (name, sum / f64::from(count))
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}
