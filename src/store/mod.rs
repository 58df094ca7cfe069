// src/store/mod.rs

//! Persistence boundary consumed by the quiz core.

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        attempt::{AttemptRecord, GradedResponse, NewAttempt, Score},
        question::{CreateQuestionRequest, QuestionRow},
        report::ResultRow,
        user::User,
    },
};

#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Every candidate row of the question bank, unfiltered.
    async fn question_rows(&self) -> Result<Vec<QuestionRow>, AppError>;

    async fn insert_question(&self, req: &CreateQuestionRequest) -> Result<i64, AppError>;

    /// Persists a new attempt and returns its generated id.
    async fn create_attempt(&self, attempt: &NewAttempt) -> Result<i64, AppError>;

    /// Stamps the completion time and writes the responses atomically.
    /// Returns `false` (and writes nothing) if the attempt was already complete.
    async fn complete_attempt(
        &self,
        attempt_id: i64,
        completed_at: DateTime<Utc>,
        responses: &[GradedResponse],
    ) -> Result<bool, AppError>;

    async fn attempt(&self, attempt_id: i64) -> Result<Option<AttemptRecord>, AppError>;

    /// Persisted score of a completed attempt.
    async fn attempt_score(&self, attempt_id: i64) -> Result<Option<Score>, AppError>;

    /// Correctness flags of all responses ever recorded for the user.
    async fn correctness_history(&self, user_id: i64) -> Result<Vec<bool>, AppError>;

    /// Responses joined with attempts, questions and users; optionally for one user.
    async fn result_rows(&self, user_id: Option<i64>) -> Result<Vec<ResultRow>, AppError>;

    async fn users(&self) -> Result<Vec<User>, AppError>;

    async fn user(&self, user_id: i64) -> Result<Option<User>, AppError>;

    /// Returns the existing user with that username, creating it if missing.
    async fn ensure_user(&self, username: &str, full_name: &str, role: &str) -> Result<User, AppError>;

    /// Creates the account for an externally authenticated `user_id` if it has no row yet.
    /// Fails with `Conflict` when `username` already belongs to a different id.
    async fn provision_user(
        &self,
        user_id: i64,
        username: &str,
        full_name: &str,
        role: &str,
    ) -> Result<User, AppError>;
}
