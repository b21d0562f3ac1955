use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

const SCHEMA_V1: &[&str] = &[
    r"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('user', 'admin')),
            created_at TEXT NOT NULL,
            updated_at TEXT
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS quiz_sets (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            difficulty TEXT NOT NULL CHECK (difficulty IN ('easy', 'medium', 'hard')),
            estimated_time INTEGER NOT NULL CHECK (estimated_time >= 0),
            total_questions INTEGER NOT NULL DEFAULT 0 CHECK (total_questions >= 0),
            is_active INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS questions (
            id TEXT PRIMARY KEY,
            quiz_set_id TEXT NOT NULL REFERENCES quiz_sets(id),
            question TEXT NOT NULL,
            options TEXT NOT NULL,
            correct_answer TEXT NOT NULL,
            type TEXT NOT NULL CHECK (type IN ('radio', 'checkbox')),
            justification TEXT NOT NULL,
            difficulty TEXT NOT NULL CHECK (difficulty IN ('easy', 'medium', 'hard')),
            category TEXT,
            tags TEXT NOT NULL,
            time_limit INTEGER NOT NULL CHECK (time_limit >= 0),
            points INTEGER NOT NULL CHECK (points >= 0),
            explanation TEXT,
            hints TEXT NOT NULL,
            screenshots TEXT NOT NULL,
            reference_links TEXT NOT NULL,
            videos TEXT NOT NULL,
            review_status TEXT NOT NULL,
            difficulty_rating REAL,
            success_rate REAL,
            created_at TEXT NOT NULL,
            updated_at TEXT,
            last_updated TEXT
        );
    ",
    // No foreign key on quiz_set_id: progress and attempts outlive their quiz set.
    r"
        CREATE TABLE IF NOT EXISTS user_progress (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            quiz_set_id TEXT NOT NULL,
            current_question INTEGER NOT NULL CHECK (current_question >= 0),
            answers TEXT NOT NULL,
            score REAL NOT NULL,
            time_spent INTEGER NOT NULL CHECK (time_spent >= 0),
            completed_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT,
            UNIQUE (user_id, quiz_set_id)
        );
    ",
    r"
        CREATE TABLE IF NOT EXISTS quiz_attempts (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            quiz_set_id TEXT NOT NULL,
            answers TEXT NOT NULL,
            score REAL NOT NULL,
            correct_answers INTEGER NOT NULL CHECK (correct_answers >= 0),
            total_questions INTEGER NOT NULL CHECK (total_questions >= 0),
            time_spent INTEGER NOT NULL CHECK (time_spent >= 0),
            detailed_results TEXT NOT NULL,
            completed_at TEXT,
            created_at TEXT NOT NULL
        );
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_quiz_sets_active_created
            ON quiz_sets (is_active, created_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_questions_quiz_set_created
            ON questions (quiz_set_id, created_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_quiz_attempts_quiz_set
            ON quiz_attempts (quiz_set_id, created_at);
    ",
    r"
        CREATE INDEX IF NOT EXISTS idx_quiz_attempts_user
            ON quiz_attempts (user_id, created_at);
    ",
];

/// Applies versioned schema migrations; each version runs in one transaction.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    for (version, statements) in [(1_i64, SCHEMA_V1)] {
        if is_applied(pool, version).await? {
            continue;
        }

        let mut tx = pool.begin().await?;
        for statement in statements {
            sqlx::query(*statement).execute(&mut *tx).await?;
        }
        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(version)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
    }

    Ok(())
}
