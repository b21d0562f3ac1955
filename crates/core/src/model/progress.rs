use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::answer::AnswerSheet;
use crate::model::ids::{ProgressId, QuizSetId, UserId};

/// In-progress (or last-completed) state for one user on one quiz set.
///
/// At most one row exists per `(user_id, quiz_set_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgress {
    pub id: ProgressId,
    pub user_id: UserId,
    pub quiz_set_id: QuizSetId,
    pub current_question: u32,
    pub answers: AnswerSheet,
    pub score: f64,
    /// Seconds.
    pub time_spent: u32,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Client-supplied progress snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressDraft {
    pub quiz_set_id: QuizSetId,
    #[serde(default)]
    pub current_question: u32,
    #[serde(default)]
    pub answers: AnswerSheet,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub time_spent: u32,
}

impl ProgressDraft {
    #[must_use]
    pub fn empty(quiz_set_id: QuizSetId) -> Self {
        Self {
            quiz_set_id,
            current_question: 0,
            answers: AnswerSheet::new(),
            score: 0.0,
            time_spent: 0,
        }
    }
}

impl UserProgress {
    #[must_use]
    pub fn start(
        id: ProgressId,
        user_id: UserId,
        draft: ProgressDraft,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            quiz_set_id: draft.quiz_set_id,
            current_question: draft.current_question,
            answers: draft.answers,
            score: draft.score,
            time_spent: draft.time_spent,
            completed_at: None,
            created_at: now,
            updated_at: None,
        }
    }

    /// Replace the mutable fields with `draft`.
    ///
    /// Identity, `created_at` and `completed_at` are kept.
    pub fn overwrite(&mut self, draft: ProgressDraft, now: DateTime<Utc>) {
        self.current_question = draft.current_question;
        self.answers = draft.answers;
        self.score = draft.score;
        self.time_spent = draft.time_spent;
        self.updated_at = Some(now);
    }

    pub fn mark_completed(&mut self, score: f64, now: DateTime<Utc>) {
        self.completed_at = Some(now);
        self.score = score;
        self.updated_at = Some(now);
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}
