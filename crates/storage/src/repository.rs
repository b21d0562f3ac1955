use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use quiz_core::model::{
    Difficulty, Question, QuestionId, QuizAttempt, QuizSet, QuizSetId, User, UserId, UserProgress,
};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Which quiz sets a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuizSetFilter {
    pub active_only: bool,
}

impl QuizSetFilter {
    #[must_use]
    pub fn active() -> Self {
        Self { active_only: true }
    }
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait QuizSetRepository: Send + Sync {
    /// Persist a new quiz set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id is taken.
    async fn insert_quiz_set(&self, quiz_set: &QuizSet) -> Result<(), StorageError>;

    /// Fetch a quiz set by id; `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_quiz_set(&self, id: QuizSetId) -> Result<Option<QuizSet>, StorageError>;

    /// Page through quiz sets in creation order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_quiz_sets(
        &self,
        filter: QuizSetFilter,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<QuizSet>, StorageError>;

    /// Write the editable fields of an existing quiz set.
    ///
    /// `total_questions` is owned by the question writes and is not touched.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz set does not exist.
    async fn update_quiz_set(&self, quiz_set: &QuizSet) -> Result<(), StorageError>;

    /// Delete a quiz set together with every question it owns.
    ///
    /// Attempts and progress rows that reference the quiz set are kept.
    /// Returns the number of questions removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the quiz set does not exist.
    async fn delete_quiz_set_cascading_questions(&self, id: QuizSetId)
    -> Result<u64, StorageError>;

    /// Categories of the given quiz sets. Ids with no quiz set are absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn quiz_set_categories(
        &self,
        ids: &[QuizSetId],
    ) -> Result<HashMap<QuizSetId, String>, StorageError>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Insert a question and bump its quiz set's `total_questions` atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the owning quiz set does not exist.
    async fn insert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError>;

    /// Questions of a quiz set in creation order, optionally restricted to
    /// one difficulty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn questions_for_quiz_set(
        &self,
        quiz_set_id: QuizSetId,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<Question>, StorageError>;

    /// Write every field of an existing question except its owner.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn update_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Delete a question and decrement its owner's `total_questions`,
    /// never below zero.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_progress(
        &self,
        user_id: UserId,
        quiz_set_id: QuizSetId,
    ) -> Result<Option<UserProgress>, StorageError>;

    /// Insert, or overwrite the row for the same `(user_id, quiz_set_id)`.
    ///
    /// On overwrite the stored id, `created_at` and `completed_at` win over the
    /// ones in `progress`. Returns the row as stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn save_progress(&self, progress: &UserProgress) -> Result<UserProgress, StorageError>;
}

#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn attempts_for_quiz_set(
        &self,
        quiz_set_id: QuizSetId,
    ) -> Result<Vec<QuizAttempt>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn attempts_for_user(&self, user_id: UserId) -> Result<Vec<QuizAttempt>, StorageError>;
}

/// Atomic write path for a scored submission.
#[async_trait]
pub trait SubmissionPersistence: Send + Sync {
    /// Record `attempt` and, if the user already has progress on that quiz set,
    /// mark it completed with the attempt's score. Progress is never created
    /// here. Returns the updated progress row, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if either write fails; neither is kept then.
    async fn record_submission(
        &self,
        attempt: &QuizAttempt,
    ) -> Result<Option<UserProgress>, StorageError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the email is already registered.
    async fn insert_user(&self, user: &User) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist, or
    /// `StorageError::Conflict` if the new email belongs to someone else.
    async fn update_user(&self, user: &User) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY BACKEND ─────────────────────────────────────────────────────────
//

#[derive(Default)]
struct Tables {
    // Vecs keep insertion order, matching the SQLite ordering.
    quiz_sets: Vec<QuizSet>,
    questions: Vec<Question>,
    attempts: Vec<QuizAttempt>,
    progress: HashMap<(UserId, QuizSetId), UserProgress>,
    users: HashMap<UserId, User>,
}

/// In-memory repository for tests and prototyping.
///
/// Every operation takes one lock over all tables, so the multi-row writes are
/// as atomic as their SQLite counterparts.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl QuizSetRepository for InMemoryRepository {
    async fn insert_quiz_set(&self, quiz_set: &QuizSet) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        if t.quiz_sets.iter().any(|qs| qs.id == quiz_set.id) {
            return Err(StorageError::Conflict(format!("quiz set {}", quiz_set.id)));
        }
        t.quiz_sets.push(quiz_set.clone());
        Ok(())
    }

    async fn get_quiz_set(&self, id: QuizSetId) -> Result<Option<QuizSet>, StorageError> {
        let t = self.lock()?;
        Ok(t.quiz_sets.iter().find(|qs| qs.id == id).cloned())
    }

    async fn list_quiz_sets(
        &self,
        filter: QuizSetFilter,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<QuizSet>, StorageError> {
        let t = self.lock()?;
        Ok(t.quiz_sets
            .iter()
            .filter(|qs| !filter.active_only || qs.is_active)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update_quiz_set(&self, quiz_set: &QuizSet) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        let stored = t
            .quiz_sets
            .iter_mut()
            .find(|qs| qs.id == quiz_set.id)
            .ok_or(StorageError::NotFound)?;
        let total_questions = stored.total_questions;
        *stored = quiz_set.clone();
        stored.total_questions = total_questions;
        Ok(())
    }

    async fn delete_quiz_set_cascading_questions(
        &self,
        id: QuizSetId,
    ) -> Result<u64, StorageError> {
        let mut t = self.lock()?;
        let before = t.quiz_sets.len();
        t.quiz_sets.retain(|qs| qs.id != id);
        if t.quiz_sets.len() == before {
            return Err(StorageError::NotFound);
        }
        let questions_before = t.questions.len();
        t.questions.retain(|q| q.quiz_set_id != id);
        Ok((questions_before - t.questions.len()) as u64)
    }

    async fn quiz_set_categories(
        &self,
        ids: &[QuizSetId],
    ) -> Result<HashMap<QuizSetId, String>, StorageError> {
        let t = self.lock()?;
        Ok(t.quiz_sets
            .iter()
            .filter(|qs| ids.contains(&qs.id))
            .map(|qs| (qs.id, qs.category.clone()))
            .collect())
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn insert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        if t.questions.iter().any(|q| q.id == question.id) {
            return Err(StorageError::Conflict(format!("question {}", question.id)));
        }
        let owner = t
            .quiz_sets
            .iter_mut()
            .find(|qs| qs.id == question.quiz_set_id)
            .ok_or(StorageError::NotFound)?;
        owner.total_questions += 1;
        t.questions.push(question.clone());
        Ok(())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let t = self.lock()?;
        Ok(t.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn questions_for_quiz_set(
        &self,
        quiz_set_id: QuizSetId,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<Question>, StorageError> {
        let t = self.lock()?;
        Ok(t.questions
            .iter()
            .filter(|q| q.quiz_set_id == quiz_set_id)
            .filter(|q| difficulty.is_none_or(|d| q.difficulty == d))
            .cloned()
            .collect())
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        let stored = t
            .questions
            .iter_mut()
            .find(|q| q.id == question.id)
            .ok_or(StorageError::NotFound)?;
        let owner = stored.quiz_set_id;
        *stored = question.clone();
        stored.quiz_set_id = owner;
        Ok(())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        let index = t
            .questions
            .iter()
            .position(|q| q.id == id)
            .ok_or(StorageError::NotFound)?;
        let removed = t.questions.remove(index);
        if let Some(owner) = t
            .quiz_sets
            .iter_mut()
            .find(|qs| qs.id == removed.quiz_set_id)
        {
            owner.total_questions = owner.total_questions.saturating_sub(1);
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn find_progress(
        &self,
        user_id: UserId,
        quiz_set_id: QuizSetId,
    ) -> Result<Option<UserProgress>, StorageError> {
        let t = self.lock()?;
        Ok(t.progress.get(&(user_id, quiz_set_id)).cloned())
    }

    async fn save_progress(&self, progress: &UserProgress) -> Result<UserProgress, StorageError> {
        let mut t = self.lock()?;
        let key = (progress.user_id, progress.quiz_set_id);
        let stored = match t.progress.get_mut(&key) {
            Some(existing) => {
                existing.current_question = progress.current_question;
                existing.answers = progress.answers.clone();
                existing.score = progress.score;
                existing.time_spent = progress.time_spent;
                existing.updated_at = progress.updated_at.or(Some(progress.created_at));
                existing.clone()
            }
            None => {
                t.progress.insert(key, progress.clone());
                progress.clone()
            }
        };
        Ok(stored)
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn attempts_for_quiz_set(
        &self,
        quiz_set_id: QuizSetId,
    ) -> Result<Vec<QuizAttempt>, StorageError> {
        let t = self.lock()?;
        Ok(t.attempts
            .iter()
            .filter(|a| a.quiz_set_id == quiz_set_id)
            .cloned()
            .collect())
    }

    async fn attempts_for_user(&self, user_id: UserId) -> Result<Vec<QuizAttempt>, StorageError> {
        let t = self.lock()?;
        Ok(t.attempts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SubmissionPersistence for InMemoryRepository {
    async fn record_submission(
        &self,
        attempt: &QuizAttempt,
    ) -> Result<Option<UserProgress>, StorageError> {
        let mut t = self.lock()?;
        t.attempts.push(attempt.clone());
        let completed_at = attempt.completed_at.unwrap_or(attempt.created_at);
        Ok(t
            .progress
            .get_mut(&(attempt.user_id, attempt.quiz_set_id))
            .map(|progress| {
                progress.mark_completed(attempt.score, completed_at);
                progress.clone()
            }))
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_user(&self, user: &User) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        if t.users.values().any(|u| u.email == user.email) {
            return Err(StorageError::Conflict(format!("email {}", user.email)));
        }
        t.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let t = self.lock()?;
        Ok(t.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let t = self.lock()?;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user: &User) -> Result<(), StorageError> {
        let mut t = self.lock()?;
        if t
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StorageError::Conflict(format!("email {}", user.email)));
        }
        let stored = t.users.get_mut(&user.id).ok_or(StorageError::NotFound)?;
        *stored = user.clone();
        Ok(())
    }
}

//
// ─── AGGREGATE ─────────────────────────────────────────────────────────────────
//

/// All repositories behind trait objects so backends can be swapped.
#[derive(Clone)]
pub struct Storage {
    pub quiz_sets: Arc<dyn QuizSetRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
    pub submissions: Arc<dyn SubmissionPersistence>,
    pub users: Arc<dyn UserRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_backend(InMemoryRepository::new())
    }

    pub(crate) fn from_backend<R>(repo: R) -> Self
    where
        R: QuizSetRepository
            + QuestionRepository
            + ProgressRepository
            + AttemptRepository
            + SubmissionPersistence
            + UserRepository
            + Clone
            + 'static,
    {
        Self {
            quiz_sets: Arc::new(repo.clone()),
            questions: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            attempts: Arc::new(repo.clone()),
            submissions: Arc::new(repo.clone()),
            users: Arc::new(repo),
        }
    }
}
