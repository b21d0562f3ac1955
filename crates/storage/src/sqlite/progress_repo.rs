use quiz_core::model::{QuizSetId, UserId, UserProgress};

use super::SqliteRepository;
use super::mapping::{db_err, map_progress_row, to_json};
use crate::repository::{ProgressRepository, StorageError};

pub(super) const PROGRESS_COLUMNS: &str = "id, user_id, quiz_set_id, current_question, answers, \
     score, time_spent, completed_at, created_at, updated_at";

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn find_progress(
        &self,
        user_id: UserId,
        quiz_set_id: QuizSetId,
    ) -> Result<Option<UserProgress>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM user_progress WHERE user_id = ?1 AND quiz_set_id = ?2"
        ))
        .bind(user_id.to_string())
        .bind(quiz_set_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn save_progress(&self, progress: &UserProgress) -> Result<UserProgress, StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r"
            INSERT INTO user_progress (
                id, user_id, quiz_set_id, current_question, answers,
                score, time_spent, completed_at, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(user_id, quiz_set_id) DO UPDATE SET
                -- id, created_at and completed_at stay as first written
                current_question = excluded.current_question,
                answers = excluded.answers,
                score = excluded.score,
                time_spent = excluded.time_spent,
                updated_at = COALESCE(excluded.updated_at, excluded.created_at)
            ",
        )
        .bind(progress.id.to_string())
        .bind(progress.user_id.to_string())
        .bind(progress.quiz_set_id.to_string())
        .bind(i64::from(progress.current_question))
        .bind(to_json(&progress.answers)?)
        .bind(progress.score)
        .bind(i64::from(progress.time_spent))
        .bind(progress.completed_at)
        .bind(progress.created_at)
        .bind(progress.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let row = sqlx::query(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM user_progress WHERE user_id = ?1 AND quiz_set_id = ?2"
        ))
        .bind(progress.user_id.to_string())
        .bind(progress.quiz_set_id.to_string())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        map_progress_row(&row)
    }
}
