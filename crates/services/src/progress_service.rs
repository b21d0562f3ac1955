use std::sync::Arc;

use tracing::debug;

use quiz_core::model::{ProgressDraft, ProgressId, QuizSetId, UserId, UserProgress};
use storage::repository::{ProgressRepository, QuizSetRepository};

use crate::Clock;
use crate::error::ProgressError;

/// Saves and loads a user's in-flight quiz state.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    quiz_sets: Arc<dyn QuizSetRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quiz_sets: Arc<dyn QuizSetRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            quiz_sets,
            progress,
        }
    }

    /// Create or overwrite the user's progress on `draft.quiz_set_id`.
    ///
    /// An existing row keeps its id, `created_at` and `completed_at`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::QuizSetNotFound` when the quiz set is unknown.
    pub async fn save_progress(
        &self,
        user_id: UserId,
        draft: ProgressDraft,
    ) -> Result<UserProgress, ProgressError> {
        if self.quiz_sets.get_quiz_set(draft.quiz_set_id).await?.is_none() {
            return Err(ProgressError::QuizSetNotFound);
        }

        let now = self.clock.now();
        let progress = match self.progress.find_progress(user_id, draft.quiz_set_id).await? {
            Some(mut existing) => {
                existing.overwrite(draft, now);
                existing
            }
            None => UserProgress::start(ProgressId::generate(), user_id, draft, now),
        };
        let stored = self.progress.save_progress(&progress).await?;
        debug!(
            user_id = %user_id,
            quiz_set_id = %stored.quiz_set_id,
            current_question = stored.current_question,
            "progress saved"
        );
        Ok(stored)
    }

    /// # Errors
    ///
    /// Returns `ProgressError::ProgressNotFound` when nothing was saved yet.
    pub async fn get_progress(
        &self,
        user_id: UserId,
        quiz_set_id: QuizSetId,
    ) -> Result<UserProgress, ProgressError> {
        self.progress
            .find_progress(user_id, quiz_set_id)
            .await?
            .ok_or(ProgressError::ProgressNotFound)
    }
}
