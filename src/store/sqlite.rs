// src/store/sqlite.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::QuizStore;
use crate::{
    error::AppError,
    models::{
        attempt::{AttemptRecord, GradedResponse, NewAttempt, Score},
        question::{CreateQuestionRequest, Difficulty, QuestionRow},
        report::ResultRow,
        user::User,
    },
};

/// `QuizStore` backed by an SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Helper struct for per-question scoring rows.
#[derive(sqlx::FromRow)]
struct ScoredRow {
    is_correct: bool,
    marks: i64,
}

#[async_trait]
impl QuizStore for SqliteStore {
    async fn question_rows(&self) -> Result<Vec<QuestionRow>, AppError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, qtype, prompt, options_json, answer, topic, difficulty, marks
            FROM questions
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch question rows: {:?}", e);
            AppError::from(e)
        })?;

        Ok(rows)
    }

    async fn insert_question(&self, req: &CreateQuestionRequest) -> Result<i64, AppError> {
        let options_json = serde_json::to_string(&req.options)?;
        let difficulty = req.difficulty.unwrap_or(Difficulty::Medium);

        let result = sqlx::query(
            r#"
            INSERT INTO questions (qtype, prompt, options_json, answer, topic, difficulty, marks)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(req.qtype.trim().to_lowercase())
        .bind(&req.prompt)
        .bind(options_json)
        .bind(&req.answer)
        .bind(&req.topic)
        .bind(difficulty.as_str())
        .bind(req.marks.unwrap_or(1))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create question: {:?}", e);
            AppError::from(e)
        })?;

        Ok(result.last_insert_rowid())
    }

    async fn create_attempt(&self, attempt: &NewAttempt) -> Result<i64, AppError> {
        let questions_json = serde_json::to_string(&attempt.question_ids)?;

        let result = sqlx::query(
            r#"
            INSERT INTO attempts (user_id, time_limit_seconds, questions_json, started_at, deadline)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(attempt.user_id)
        .bind(attempt.time_limit_seconds)
        .bind(questions_json)
        .bind(attempt.started_at)
        .bind(attempt.deadline)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert attempt: {:?}", e);
            AppError::from(e)
        })?;

        Ok(result.last_insert_rowid())
    }

    async fn complete_attempt(
        &self,
        attempt_id: i64,
        completed_at: DateTime<Utc>,
        responses: &[GradedResponse],
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        // Claim the attempt first; a second finalize finds nothing to update.
        let stamped = sqlx::query(
            "UPDATE attempts SET completed_at = ? WHERE id = ? AND completed_at IS NULL",
        )
        .bind(completed_at)
        .bind(attempt_id)
        .execute(&mut *tx)
        .await?;

        if stamped.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for r in responses {
            sqlx::query(
                r#"
                INSERT INTO responses (attempt_id, question_id, response, is_correct, marks)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(attempt_id)
            .bind(r.question_id)
            .bind(&r.response)
            .bind(r.is_correct)
            .bind(r.marks)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await.map_err(|e| {
            tracing::error!("Failed to commit finalize for attempt {}: {:?}", attempt_id, e);
            AppError::from(e)
        })?;

        Ok(true)
    }

    async fn attempt(&self, attempt_id: i64) -> Result<Option<AttemptRecord>, AppError> {
        let attempt = sqlx::query_as::<_, AttemptRecord>(
            r#"
            SELECT id, user_id, time_limit_seconds, questions_json, started_at, deadline, completed_at
            FROM attempts
            WHERE id = ?
            "#,
        )
        .bind(attempt_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    async fn attempt_score(&self, attempt_id: i64) -> Result<Option<Score>, AppError> {
        match self.attempt(attempt_id).await? {
            Some(a) if a.is_complete() => {}
            _ => return Ok(None),
        }

        let rows = sqlx::query_as::<_, ScoredRow>(
            r#"
            SELECT is_correct, marks
            FROM responses
            WHERE attempt_id = ?
            "#,
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Score {
            obtained: rows.iter().filter(|r| r.is_correct).map(|r| r.marks).sum(),
            maximum: rows.iter().map(|r| r.marks).sum(),
            correct_count: rows.iter().filter(|r| r.is_correct).count(),
            total_questions: rows.len(),
        }))
    }

    async fn correctness_history(&self, user_id: i64) -> Result<Vec<bool>, AppError> {
        let flags = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT r.is_correct
            FROM responses r
            JOIN attempts a ON a.id = r.attempt_id
            WHERE a.user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(flags)
    }

    async fn result_rows(&self, user_id: Option<i64>) -> Result<Vec<ResultRow>, AppError> {
        let rows = sqlx::query_as::<_, ResultRow>(
            r#"
            SELECT
                a.id AS attempt_id,
                a.user_id,
                u.username,
                u.full_name,
                r.question_id,
                COALESCE(q.topic, '') AS topic,
                r.marks,
                r.response,
                r.is_correct,
                a.completed_at
            FROM responses r
            JOIN attempts a ON a.id = r.attempt_id
            JOIN users u ON u.id = a.user_id
            JOIN questions q ON q.id = r.question_id
            WHERE (?1 IS NULL OR a.user_id = ?1)
            ORDER BY a.id, r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch result rows: {:?}", e);
            AppError::from(e)
        })?;

        Ok(rows)
    }

    async fn users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, full_name, role FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn user(&self, user_id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, full_name, role FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn ensure_user(&self, username: &str, full_name: &str, role: &str) -> Result<User, AppError> {
        sqlx::query("INSERT OR IGNORE INTO users (username, full_name, role) VALUES (?, ?, ?)")
            .bind(username)
            .bind(full_name)
            .bind(role)
            .execute(&self.pool)
            .await?;

        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, full_name, role FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn provision_user(
        &self,
        user_id: i64,
        username: &str,
        full_name: &str,
        role: &str,
    ) -> Result<User, AppError> {
        sqlx::query("INSERT OR IGNORE INTO users (id, username, full_name, role) VALUES (?, ?, ?, ?)")
            .bind(user_id)
            .bind(username)
            .bind(full_name)
            .bind(role)
            .execute(&self.pool)
            .await?;

        self.user(user_id).await?.ok_or_else(|| {
            tracing::warn!("Cannot provision user {}: username '{}' is taken", user_id, username);
            AppError::Conflict(format!("Username '{}' is already taken", username))
        })
    }
}
