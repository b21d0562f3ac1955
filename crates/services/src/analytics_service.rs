use std::sync::Arc;

use tracing::debug;

use quiz_core::analytics::{QuizAnalytics, UserStats, quiz_set_analytics, user_stats};
use quiz_core::model::{QuizSetId, UserId};
use storage::repository::{AttemptRepository, QuestionRepository, QuizSetRepository};

use crate::error::AnalyticsError;

/// Read-only aggregations over recorded attempts.
#[derive(Clone)]
pub struct AnalyticsService {
    quiz_sets: Arc<dyn QuizSetRepository>,
    questions: Arc<dyn QuestionRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl AnalyticsService {
    #[must_use]
    pub fn new(
        quiz_sets: Arc<dyn QuizSetRepository>,
        questions: Arc<dyn QuestionRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            quiz_sets,
            questions,
            attempts,
        }
    }

    /// # Errors
    ///
    /// Returns `AnalyticsError::QuizSetNotFound` when the quiz set is unknown.
    pub async fn quiz_set_analytics(
        &self,
        quiz_set_id: QuizSetId,
    ) -> Result<QuizAnalytics, AnalyticsError> {
        if self.quiz_sets.get_quiz_set(quiz_set_id).await?.is_none() {
            return Err(AnalyticsError::QuizSetNotFound);
        }
        let questions = self.questions.questions_for_quiz_set(quiz_set_id, None).await?;
        let attempts = self.attempts.attempts_for_quiz_set(quiz_set_id).await?;
        debug!(quiz_set_id = %quiz_set_id, attempts = attempts.len(), "quiz set analytics");
        Ok(quiz_set_analytics(&questions, &attempts))
    }

    /// # Errors
    ///
    /// Returns `AnalyticsError::Storage` if repository access fails.
    pub async fn user_stats(&self, user_id: UserId) -> Result<UserStats, AnalyticsError> {
        let attempts = self.attempts.attempts_for_user(user_id).await?;
        let mut ids: Vec<QuizSetId> = attempts.iter().map(|a| a.quiz_set_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let categories = self.quiz_sets.quiz_set_categories(&ids).await?;
        Ok(user_stats(&attempts, &categories))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use quiz_core::model::{AnswerSheet, AttemptId, Difficulty, NewQuizSet, QuizAttempt, QuizSet};
    use quiz_core::time::fixed_now;
    use storage::repository::{InMemoryRepository, SubmissionPersistence};

    async fn quiz_set(repo: &InMemoryRepository, category: &str) -> QuizSetId {
        let qs = QuizSet::new(
            QuizSetId::generate(),
            NewQuizSet {
                title: format!("{category} basics"),
                description: String::new(),
                category: category.into(),
                difficulty: Difficulty::Medium,
                estimated_time: 5,
                is_active: true,
            },
            fixed_now(),
        )
        .unwrap();
        repo.insert_quiz_set(&qs).await.unwrap();
        qs.id
    }

    async fn record(repo: &InMemoryRepository, user: UserId, quiz_set: QuizSetId, score: f64) {
        let attempt = QuizAttempt {
            id: AttemptId::generate(),
            user_id: user,
            quiz_set_id: quiz_set,
            answers: AnswerSheet::new(),
            score,
            correct_answers: 0,
            total_questions: 0,
            time_spent: 30,
            detailed_results: Vec::new(),
            completed_at: Some(fixed_now()),
            created_at: fixed_now(),
        };
        repo.record_submission(&attempt).await.unwrap();
    }

    fn service(repo: &InMemoryRepository) -> AnalyticsService {
        AnalyticsService::new(
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
    }

    #[tokio::test]
    async fn user_stats_split_categories_by_score() {
        let repo = InMemoryRepository::new();
        let rust = quiz_set(&repo, "Rust").await;
        let sql = quiz_set(&repo, "SQL").await;
        let user = UserId::generate();
        record(&repo, user, rust, 90.0).await;
        record(&repo, user, rust, 80.0).await;
        record(&repo, user, sql, 40.0).await;

        let stats = service(&repo).user_stats(user).await.unwrap();
        assert_eq!(stats.total_quizzes, 2);
        assert_eq!(stats.completed_quizzes, 3);
        assert_eq!(stats.total_time_spent, 90);
        assert_eq!(stats.strong_categories, vec!["Rust".to_owned()]);
        assert_eq!(stats.weak_categories, vec!["SQL".to_owned()]);
    }

    #[tokio::test]
    async fn user_without_attempts_gets_zeroes() {
        let repo = InMemoryRepository::new();
        let stats = service(&repo).user_stats(UserId::generate()).await.unwrap();
        assert_eq!(stats, UserStats::empty());
    }

    #[tokio::test]
    async fn quiz_set_analytics_requires_quiz_set() {
        let repo = InMemoryRepository::new();
        let err = service(&repo)
            .quiz_set_analytics(QuizSetId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::QuizSetNotFound));

        let qs = quiz_set(&repo, "Rust").await;
        let empty = service(&repo).quiz_set_analytics(qs).await.unwrap();
        assert_eq!(empty, QuizAnalytics::empty());

        record(&repo, UserId::generate(), qs, 50.0).await;
        let one = service(&repo).quiz_set_analytics(qs).await.unwrap();
        assert_eq!(one.total_attempts, 1);
        assert!((one.completion_rate - 1.0).abs() < f64::EPSILON);
    }
}
