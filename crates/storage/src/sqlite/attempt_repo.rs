use quiz_core::model::{QuizAttempt, QuizSetId, UserId, UserProgress};

use super::SqliteRepository;
use super::mapping::{db_err, map_attempt_row, map_progress_row, to_json};
use super::progress_repo::PROGRESS_COLUMNS;
use crate::repository::{AttemptRepository, StorageError, SubmissionPersistence};

const ATTEMPT_COLUMNS: &str = "id, user_id, quiz_set_id, answers, score, correct_answers, \
     total_questions, time_spent, detailed_results, completed_at, created_at";

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn attempts_for_quiz_set(
        &self,
        quiz_set_id: QuizSetId,
    ) -> Result<Vec<QuizAttempt>, StorageError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {ATTEMPT_COLUMNS}
            FROM quiz_attempts
            WHERE quiz_set_id = ?1
            ORDER BY created_at ASC, rowid ASC
            "
        ))
        .bind(quiz_set_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_attempt_row).collect()
    }

    async fn attempts_for_user(&self, user_id: UserId) -> Result<Vec<QuizAttempt>, StorageError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {ATTEMPT_COLUMNS}
            FROM quiz_attempts
            WHERE user_id = ?1
            ORDER BY created_at ASC, rowid ASC
            "
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_attempt_row).collect()
    }
}

#[async_trait::async_trait]
impl SubmissionPersistence for SqliteRepository {
    async fn record_submission(
        &self,
        attempt: &QuizAttempt,
    ) -> Result<Option<UserProgress>, StorageError> {
        let user_id = attempt.user_id.to_string();
        let quiz_set_id = attempt.quiz_set_id.to_string();
        let completed_at = attempt.completed_at.unwrap_or(attempt.created_at);

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(&format!(
            r"
            INSERT INTO quiz_attempts ({ATTEMPT_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "
        ))
        .bind(attempt.id.to_string())
        .bind(&user_id)
        .bind(&quiz_set_id)
        .bind(to_json(&attempt.answers)?)
        .bind(attempt.score)
        .bind(i64::from(attempt.correct_answers))
        .bind(i64::from(attempt.total_questions))
        .bind(i64::from(attempt.time_spent))
        .bind(to_json(&attempt.detailed_results)?)
        .bind(attempt.completed_at)
        .bind(attempt.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let touched = sqlx::query(
            r"
            UPDATE user_progress
            SET completed_at = ?3, score = ?4, updated_at = ?3
            WHERE user_id = ?1 AND quiz_set_id = ?2
            ",
        )
        .bind(&user_id)
        .bind(&quiz_set_id)
        .bind(completed_at)
        .bind(attempt.score)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?
        .rows_affected();

        let progress = if touched == 0 {
            None
        } else {
            let row = sqlx::query(&format!(
                "SELECT {PROGRESS_COLUMNS} FROM user_progress \
                 WHERE user_id = ?1 AND quiz_set_id = ?2"
            ))
            .bind(&user_id)
            .bind(&quiz_set_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;
            Some(map_progress_row(&row)?)
        };

        tx.commit().await.map_err(db_err)?;
        Ok(progress)
    }
}
