use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use tracing::{debug, info};

use quiz_core::model::{
    Difficulty, NewQuestion, NewQuizSet, Question, QuestionId, QuestionPatch, QuizSet, QuizSetId,
    QuizSetPatch,
};
use storage::repository::{QuestionRepository, QuizSetFilter, QuizSetRepository, StorageError};

use crate::Clock;
use crate::error::CatalogError;

/// Options for listing a quiz set's questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QuestionQuery {
    pub shuffle: bool,
    /// Applied after filtering and shuffling. `None` or `0` means no cap.
    pub limit: Option<usize>,
    pub difficulty: Option<Difficulty>,
}

/// Shuffle (if asked) and cap an already-filtered question list.
pub fn arrange_questions<R: Rng + ?Sized>(
    mut questions: Vec<Question>,
    query: QuestionQuery,
    rng: &mut R,
) -> Vec<Question> {
    if query.shuffle {
        questions.shuffle(rng);
    }
    if let Some(limit) = query.limit.filter(|l| *l > 0) {
        questions.truncate(limit);
    }
    questions
}

/// Quiz set and question CRUD.
#[derive(Clone)]
pub struct CatalogService {
    clock: Clock,
    quiz_sets: Arc<dyn QuizSetRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quiz_sets: Arc<dyn QuizSetRepository>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            clock,
            quiz_sets,
            questions,
        }
    }

    /// Active quiz sets, paged.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Storage` if repository access fails.
    pub async fn list_quiz_sets(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<QuizSet>, CatalogError> {
        let sets = self
            .quiz_sets
            .list_quiz_sets(QuizSetFilter::active(), offset, limit)
            .await?;
        debug!(offset, limit, count = sets.len(), "listed quiz sets");
        Ok(sets)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::QuizSetNotFound` when the id is unknown.
    pub async fn get_quiz_set(&self, id: QuizSetId) -> Result<QuizSet, CatalogError> {
        self.quiz_sets
            .get_quiz_set(id)
            .await?
            .ok_or(CatalogError::QuizSetNotFound)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::QuizSet` for validation failures.
    /// Returns `CatalogError::Storage` if persistence fails.
    pub async fn create_quiz_set(&self, draft: NewQuizSet) -> Result<QuizSet, CatalogError> {
        let quiz_set = QuizSet::new(QuizSetId::generate(), draft, self.clock.now())?;
        self.quiz_sets.insert_quiz_set(&quiz_set).await?;
        info!(quiz_set_id = %quiz_set.id, title = %quiz_set.title, "quiz set created");
        Ok(quiz_set)
    }

    /// Apply a partial update and return the stored result.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::QuizSetNotFound` when the id is unknown and
    /// `CatalogError::QuizSet` when the merged fields are invalid.
    pub async fn update_quiz_set(
        &self,
        id: QuizSetId,
        patch: QuizSetPatch,
    ) -> Result<QuizSet, CatalogError> {
        let mut quiz_set = self.get_quiz_set(id).await?;
        patch.apply(&mut quiz_set, self.clock.now())?;
        self.quiz_sets
            .update_quiz_set(&quiz_set)
            .await
            .map_err(quiz_set_missing)?;
        info!(quiz_set_id = %id, "quiz set updated");
        Ok(quiz_set)
    }

    /// Delete a quiz set and its questions.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::QuizSetNotFound` when the id is unknown.
    pub async fn delete_quiz_set(&self, id: QuizSetId) -> Result<(), CatalogError> {
        let removed = self
            .quiz_sets
            .delete_quiz_set_cascading_questions(id)
            .await
            .map_err(quiz_set_missing)?;
        info!(quiz_set_id = %id, questions_removed = removed, "quiz set deleted");
        Ok(())
    }

    /// Questions of an existing quiz set, filtered, optionally shuffled and
    /// capped.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::QuizSetNotFound` when the quiz set is unknown.
    pub async fn list_questions(
        &self,
        quiz_set_id: QuizSetId,
        query: QuestionQuery,
    ) -> Result<Vec<Question>, CatalogError> {
        self.get_quiz_set(quiz_set_id).await?;
        let questions = self
            .questions
            .questions_for_quiz_set(quiz_set_id, query.difficulty)
            .await?;
        let questions = arrange_questions(questions, query, &mut rand::rng());
        debug!(quiz_set_id = %quiz_set_id, count = questions.len(), "listed questions");
        Ok(questions)
    }

    /// A question, only if it belongs to `quiz_set_id`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::QuestionNotFound` when the question is missing
    /// or owned by another quiz set.
    pub async fn get_question(
        &self,
        quiz_set_id: QuizSetId,
        question_id: QuestionId,
    ) -> Result<Question, CatalogError> {
        self.questions
            .get_question(question_id)
            .await?
            .filter(|q| q.quiz_set_id == quiz_set_id)
            .ok_or(CatalogError::QuestionNotFound)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::QuizSetNotFound` if the quiz set is unknown and
    /// `CatalogError::Question` if the question is malformed.
    pub async fn create_question(
        &self,
        quiz_set_id: QuizSetId,
        draft: NewQuestion,
    ) -> Result<Question, CatalogError> {
        let question = Question::new(QuestionId::generate(), quiz_set_id, draft, self.clock.now())?;
        self.questions
            .insert_question(&question)
            .await
            .map_err(quiz_set_missing)?;
        info!(quiz_set_id = %quiz_set_id, question_id = %question.id, "question created");
        Ok(question)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::QuestionNotFound` when the question is not part
    /// of `quiz_set_id`, and `CatalogError::Question` if the merged question
    /// is malformed.
    pub async fn update_question(
        &self,
        quiz_set_id: QuizSetId,
        question_id: QuestionId,
        patch: QuestionPatch,
    ) -> Result<Question, CatalogError> {
        let mut question = self.get_question(quiz_set_id, question_id).await?;
        patch.apply(&mut question, self.clock.now())?;
        self.questions
            .update_question(&question)
            .await
            .map_err(question_missing)?;
        info!(question_id = %question_id, "question updated");
        Ok(question)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::QuestionNotFound` when the question is not part
    /// of `quiz_set_id`.
    pub async fn delete_question(
        &self,
        quiz_set_id: QuizSetId,
        question_id: QuestionId,
    ) -> Result<(), CatalogError> {
        self.get_question(quiz_set_id, question_id).await?;
        self.questions
            .delete_question(question_id)
            .await
            .map_err(question_missing)?;
        info!(quiz_set_id = %quiz_set_id, question_id = %question_id, "question deleted");
        Ok(())
    }
}

fn quiz_set_missing(err: StorageError) -> CatalogError {
    match err {
        StorageError::NotFound => CatalogError::QuizSetNotFound,
        other => CatalogError::Storage(other),
    }
}

fn question_missing(err: StorageError) -> CatalogError {
    match err {
        StorageError::NotFound => CatalogError::QuestionNotFound,
        other => CatalogError::Storage(other),
    }
}
