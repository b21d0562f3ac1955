use quiz_core::model::{Difficulty, Question, QuestionId, QuizSetId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{db_err, map_question_row, ser, to_json};
use crate::repository::{QuestionRepository, StorageError};

const QUESTION_COLUMNS: &str = "id, quiz_set_id, question, options, correct_answer, type, \
     justification, difficulty, category, tags, time_limit, points, explanation, hints, \
     screenshots, reference_links, videos, review_status, difficulty_rating, success_rate, \
     created_at, updated_at, last_updated";

/// JSON-encoded list and answer columns of a question.
struct JsonColumns {
    options: String,
    correct_answer: String,
    tags: String,
    hints: String,
    screenshots: String,
    reference_links: String,
    videos: String,
}

impl JsonColumns {
    fn encode(question: &Question) -> Result<Self, StorageError> {
        Ok(Self {
            options: to_json(&question.options)?,
            correct_answer: to_json(&question.correct_answer)?,
            tags: to_json(&question.tags)?,
            hints: to_json(&question.hints)?,
            screenshots: to_json(&question.screenshots)?,
            reference_links: to_json(&question.reference_links)?,
            videos: to_json(&question.videos)?,
        })
    }
}

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn insert_question(&self, question: &Question) -> Result<(), StorageError> {
        let json = JsonColumns::encode(question)?;
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let bumped = sqlx::query(
            "UPDATE quiz_sets SET total_questions = total_questions + 1 WHERE id = ?1",
        )
        .bind(question.quiz_set_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?
        .rows_affected();
        if bumped == 0 {
            return Err(StorageError::NotFound);
        }

        sqlx::query(&format!(
            r"
            INSERT INTO questions ({QUESTION_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                    ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)
            "
        ))
        .bind(question.id.to_string())
        .bind(question.quiz_set_id.to_string())
        .bind(&question.prompt)
        .bind(json.options)
        .bind(json.correct_answer)
        .bind(question.kind.as_str())
        .bind(&question.justification)
        .bind(question.difficulty.as_str())
        .bind(&question.category)
        .bind(json.tags)
        .bind(i64::from(question.time_limit))
        .bind(i64::from(question.points))
        .bind(&question.explanation)
        .bind(json.hints)
        .bind(json.screenshots)
        .bind(json.reference_links)
        .bind(json.videos)
        .bind(&question.review_status)
        .bind(question.difficulty_rating)
        .bind(question.success_rate)
        .bind(question.created_at)
        .bind(question.updated_at)
        .bind(question.last_updated)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(map_question_row).transpose()
    }

    async fn questions_for_quiz_set(
        &self,
        quiz_set_id: QuizSetId,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<Question>, StorageError> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {QUESTION_COLUMNS}
            FROM questions
            WHERE quiz_set_id = ?1 AND (?2 IS NULL OR difficulty = ?2)
            ORDER BY created_at ASC, rowid ASC
            "
        ))
        .bind(quiz_set_id.to_string())
        .bind(difficulty.map(Difficulty::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter().map(map_question_row).collect()
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        let json = JsonColumns::encode(question)?;
        let res = sqlx::query(
            r"
            UPDATE questions SET
                question = ?2,
                options = ?3,
                correct_answer = ?4,
                type = ?5,
                justification = ?6,
                difficulty = ?7,
                category = ?8,
                tags = ?9,
                time_limit = ?10,
                points = ?11,
                explanation = ?12,
                hints = ?13,
                screenshots = ?14,
                reference_links = ?15,
                videos = ?16,
                review_status = ?17,
                difficulty_rating = ?18,
                success_rate = ?19,
                updated_at = ?20,
                last_updated = ?21
            WHERE id = ?1
            ",
        )
        .bind(question.id.to_string())
        .bind(&question.prompt)
        .bind(json.options)
        .bind(json.correct_answer)
        .bind(question.kind.as_str())
        .bind(&question.justification)
        .bind(question.difficulty.as_str())
        .bind(&question.category)
        .bind(json.tags)
        .bind(i64::from(question.time_limit))
        .bind(i64::from(question.points))
        .bind(&question.explanation)
        .bind(json.hints)
        .bind(json.screenshots)
        .bind(json.reference_links)
        .bind(json.videos)
        .bind(&question.review_status)
        .bind(question.difficulty_rating)
        .bind(question.success_rate)
        .bind(question.updated_at)
        .bind(question.last_updated)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let owner = sqlx::query("SELECT quiz_set_id FROM questions WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?
            .ok_or(StorageError::NotFound)?;
        let quiz_set_id: String = owner.try_get("quiz_set_id").map_err(ser)?;

        sqlx::query("DELETE FROM questions WHERE id = ?1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        sqlx::query(
            r"
            UPDATE quiz_sets
            SET total_questions = MAX(total_questions - 1, 0)
            WHERE id = ?1
            ",
        )
        .bind(quiz_set_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }
}
