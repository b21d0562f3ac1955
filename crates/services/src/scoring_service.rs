use std::sync::Arc;

use tracing::info;

use quiz_core::model::{AnswerSheet, AttemptId, QuizSetId, UserId};
use quiz_core::scoring::{Scorecard, score_submission};
use storage::repository::{QuestionRepository, QuizSetRepository, SubmissionPersistence};

use crate::Clock;
use crate::error::ScoringError;

/// Scores submissions and records them as attempts.
#[derive(Clone)]
pub struct ScoringService {
    clock: Clock,
    quiz_sets: Arc<dyn QuizSetRepository>,
    questions: Arc<dyn QuestionRepository>,
    submissions: Arc<dyn SubmissionPersistence>,
}

impl ScoringService {
    #[must_use]
    pub fn new(
        clock: Clock,
        quiz_sets: Arc<dyn QuizSetRepository>,
        questions: Arc<dyn QuestionRepository>,
        submissions: Arc<dyn SubmissionPersistence>,
    ) -> Self {
        Self {
            clock,
            quiz_sets,
            questions,
            submissions,
        }
    }

    /// Score `answers` against every question of the quiz set and record the
    /// attempt. Existing progress on the quiz set is marked completed in the
    /// same write.
    ///
    /// # Errors
    ///
    /// Returns `ScoringError::QuizSetNotFound` when the quiz set is unknown.
    /// Returns `ScoringError::Storage` if recording fails; nothing is kept then.
    pub async fn submit(
        &self,
        user_id: UserId,
        quiz_set_id: QuizSetId,
        answers: AnswerSheet,
    ) -> Result<Scorecard, ScoringError> {
        if self.quiz_sets.get_quiz_set(quiz_set_id).await?.is_none() {
            return Err(ScoringError::QuizSetNotFound);
        }

        let questions = self.questions.questions_for_quiz_set(quiz_set_id, None).await?;
        let scorecard = score_submission(&questions, &answers);
        let attempt = scorecard.to_attempt(
            AttemptId::generate(),
            user_id,
            quiz_set_id,
            answers,
            self.clock.now(),
        );
        let progress = self.submissions.record_submission(&attempt).await?;

        info!(
            user_id = %user_id,
            quiz_set_id = %quiz_set_id,
            attempt_id = %attempt.id,
            score = scorecard.score,
            correct = scorecard.correct_answers,
            total = scorecard.total_questions,
            progress_completed = progress.is_some(),
            "submission scored"
        );
        Ok(scorecard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use quiz_core::model::{
        Answer, Difficulty, NewQuestion, NewQuizSet, ProgressDraft, ProgressId, Question,
        QuestionId, QuestionKind, QuizSet, UserProgress,
    };
    use quiz_core::time::fixed_now;
    use storage::repository::{AttemptRepository, InMemoryRepository, ProgressRepository};

    struct Fixture {
        svc: ScoringService,
        repo: InMemoryRepository,
        quiz_set: QuizSetId,
        single: QuestionId,
        multi: QuestionId,
    }

    async fn fixture() -> Fixture {
        let repo = InMemoryRepository::new();
        let qs = QuizSet::new(
            QuizSetId::generate(),
            NewQuizSet {
                title: "T".into(),
                description: String::new(),
                category: "Rust".into(),
                difficulty: Difficulty::Medium,
                estimated_time: 5,
                is_active: true,
            },
            fixed_now(),
        )
        .unwrap();
        repo.insert_quiz_set(&qs).await.unwrap();

        let single = Question::new(
            QuestionId::generate(),
            qs.id,
            NewQuestion::basic(
                "2 + 2",
                vec!["3".into(), "4".into()],
                Answer::Single(1),
                QuestionKind::Single,
            ),
            fixed_now(),
        )
        .unwrap();
        let multi = Question::new(
            QuestionId::generate(),
            qs.id,
            NewQuestion::basic(
                "evens",
                vec!["1".into(), "2".into(), "3".into(), "4".into()],
                Answer::Multiple(vec![1, 3]),
                QuestionKind::Multiple,
            ),
            fixed_now(),
        )
        .unwrap();
        repo.insert_question(&single).await.unwrap();
        repo.insert_question(&multi).await.unwrap();

        let svc = ScoringService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        Fixture {
            svc,
            repo,
            quiz_set: qs.id,
            single: single.id,
            multi: multi.id,
        }
    }

    #[tokio::test]
    async fn submission_is_scored_and_recorded() {
        let f = fixture().await;
        let user = UserId::generate();
        let mut answers = AnswerSheet::new();
        answers.insert(f.single, Answer::Single(1));
        answers.insert(f.multi, Answer::Multiple(vec![3, 1]));

        let card = f.svc.submit(user, f.quiz_set, answers).await.unwrap();
        assert_eq!(card.correct_answers, 2);
        assert_eq!(card.total_questions, 2);
        assert!((card.score - 100.0).abs() < f64::EPSILON);

        let attempts = f.repo.attempts_for_user(user).await.unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].completed_at, Some(fixed_now()));
    }

    #[tokio::test]
    async fn submission_completes_existing_progress() {
        let f = fixture().await;
        let user = UserId::generate();
        let progress = UserProgress::start(
            ProgressId::generate(),
            user,
            ProgressDraft::empty(f.quiz_set),
            fixed_now(),
        );
        f.repo.save_progress(&progress).await.unwrap();

        let mut answers = AnswerSheet::new();
        answers.insert(f.single, Answer::Single(0));
        let card = f.svc.submit(user, f.quiz_set, answers).await.unwrap();
        assert_eq!(card.correct_answers, 0);

        let stored = f.repo.find_progress(user, f.quiz_set).await.unwrap().unwrap();
        assert!(stored.is_completed());
        assert!(stored.score.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn submission_without_progress_creates_none() {
        let f = fixture().await;
        let user = UserId::generate();
        f.svc.submit(user, f.quiz_set, AnswerSheet::new()).await.unwrap();
        assert!(f.repo.find_progress(user, f.quiz_set).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_quiz_set_records_nothing() {
        let f = fixture().await;
        let user = UserId::generate();
        let err = f
            .svc
            .submit(user, QuizSetId::generate(), AnswerSheet::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ScoringError::QuizSetNotFound));
        assert!(f.repo.attempts_for_user(user).await.unwrap().is_empty());
    }
}
