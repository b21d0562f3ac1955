use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::answer::{Answer, AnswerSheet};
use crate::model::ids::{AttemptId, QuestionId, QuizSetId, UserId};

/// Per-question outcome recorded with an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedResult {
    pub question_id: QuestionId,
    pub correct: bool,
    pub user_answer: Answer,
    pub correct_answer: Answer,
}

/// Immutable record of one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizAttempt {
    pub id: AttemptId,
    pub user_id: UserId,
    pub quiz_set_id: QuizSetId,
    pub answers: AnswerSheet,
    pub score: f64,
    pub correct_answers: u32,
    pub total_questions: u32,
    /// Seconds. Not tracked yet, always 0.
    pub time_spent: u32,
    pub detailed_results: Vec<DetailedResult>,
    /// Stamped when the attempt is recorded; `None` only for rows imported
    /// without a completion marker.
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
