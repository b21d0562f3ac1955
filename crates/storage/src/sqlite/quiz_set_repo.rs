use std::collections::HashMap;

use quiz_core::model::{QuizSet, QuizSetId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{db_err, map_quiz_set_row, ser};
use crate::repository::{QuizSetFilter, QuizSetRepository, StorageError};

const QUIZ_SET_COLUMNS: &str = "id, title, description, category, difficulty, estimated_time, \
     total_questions, is_active, created_at, updated_at";

#[async_trait::async_trait]
impl QuizSetRepository for SqliteRepository {
    async fn insert_quiz_set(&self, quiz_set: &QuizSet) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO quiz_sets (
                id, title, description, category, difficulty, estimated_time,
                total_questions, is_active, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(quiz_set.id.to_string())
        .bind(&quiz_set.title)
        .bind(&quiz_set.description)
        .bind(&quiz_set.category)
        .bind(quiz_set.difficulty.as_str())
        .bind(i64::from(quiz_set.estimated_time))
        .bind(i64::from(quiz_set.total_questions))
        .bind(quiz_set.is_active)
        .bind(quiz_set.created_at)
        .bind(quiz_set.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_quiz_set(&self, id: QuizSetId) -> Result<Option<QuizSet>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {QUIZ_SET_COLUMNS} FROM quiz_sets WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_quiz_set_row).transpose()
    }

    async fn list_quiz_sets(
        &self,
        filter: QuizSetFilter,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<QuizSet>, StorageError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {QUIZ_SET_COLUMNS}
            FROM quiz_sets
            WHERE (?1 = 0 OR is_active = 1)
            ORDER BY created_at ASC, rowid ASC
            LIMIT ?2 OFFSET ?3
            "
        ))
        .bind(filter.active_only)
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_quiz_set_row).collect()
    }

    async fn update_quiz_set(&self, quiz_set: &QuizSet) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE quiz_sets SET
                title = ?2,
                description = ?3,
                category = ?4,
                difficulty = ?5,
                estimated_time = ?6,
                is_active = ?7,
                updated_at = ?8
            WHERE id = ?1
            ",
        )
        .bind(quiz_set.id.to_string())
        .bind(&quiz_set.title)
        .bind(&quiz_set.description)
        .bind(&quiz_set.category)
        .bind(quiz_set.difficulty.as_str())
        .bind(i64::from(quiz_set.estimated_time))
        .bind(quiz_set.is_active)
        .bind(quiz_set.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_quiz_set_cascading_questions(
        &self,
        id: QuizSetId,
    ) -> Result<u64, StorageError> {
        let id = id.to_string();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let questions = sqlx::query("DELETE FROM questions WHERE quiz_set_id = ?1")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();

        let deleted = sqlx::query("DELETE FROM quiz_sets WHERE id = ?1")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();

        if deleted == 0 {
            // dropping the transaction rolls back
            return Err(StorageError::NotFound);
        }

        tx.commit().await.map_err(db_err)?;
        Ok(questions)
    }

    async fn quiz_set_categories(
        &self,
        ids: &[QuizSetId],
    ) -> Result<HashMap<QuizSetId, String>, StorageError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = (1..=ids.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT id, category FROM quiz_sets WHERE id IN ({placeholders})");

        let mut q = sqlx::query(&sql);
        for id in ids {
            q = q.bind(id.to_string());
        }
        let rows = q.fetch_all(&self.pool).await.map_err(db_err)?;

        let mut out = HashMap::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("id").map_err(ser)?;
            let category: String = row.try_get("category").map_err(ser)?;
            let id: QuizSetId = id.parse().map_err(ser)?;
            out.insert(id, category);
        }
        Ok(out)
    }
}
