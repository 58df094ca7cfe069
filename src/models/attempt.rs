// src/models/attempt.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    config::{
        DEFAULT_QUESTION_COUNT, DEFAULT_TIME_LIMIT_MINUTES, MAX_QUESTION_COUNT,
        MAX_TIME_LIMIT_MINUTES, MIN_QUESTION_COUNT, MIN_TIME_LIMIT_MINUTES,
    },
    error::AppError,
    models::question::PublicQuestion,
};

/// Represents the 'attempts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttemptRecord {
    pub id: i64,
    pub user_id: i64,
    pub time_limit_seconds: i64,
    /// JSON array of question ids, in paper order.
    #[serde(skip)]
    pub questions_json: String,
    pub started_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    /// `None` while the attempt is open or after it was abandoned.
    pub completed_at: Option<DateTime<Utc>>,
}

impl AttemptRecord {
    pub fn question_ids(&self) -> Result<Vec<i64>, AppError> {
        Ok(serde_json::from_str(&self.questions_json)?)
    }

    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Insert payload for a freshly started attempt.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub user_id: i64,
    pub question_ids: Vec<i64>,
    pub time_limit_seconds: i64,
    pub started_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
}

/// One graded row of the 'responses' table, written at finalize.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradedResponse {
    pub question_id: i64,
    pub response: Option<String>,
    pub is_correct: bool,
    pub marks: i64,
}

/// Marks-weighted result of a finalized attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub obtained: i64,
    pub maximum: i64,
    pub correct_count: usize,
    pub total_questions: usize,
}

impl Score {
    pub fn from_graded(graded: &[GradedResponse]) -> Self {
        Self {
            obtained: graded.iter().filter(|g| g.is_correct).map(|g| g.marks).sum(),
            maximum: graded.iter().map(|g| g.marks).sum(),
            correct_count: graded.iter().filter(|g| g.is_correct).count(),
            total_questions: graded.len(),
        }
    }
}

fn default_question_count() -> usize {
    DEFAULT_QUESTION_COUNT
}

fn default_time_limit() -> u64 {
    DEFAULT_TIME_LIMIT_MINUTES
}

/// DTO for starting a new attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct StartAttemptRequest {
    #[serde(default = "default_question_count")]
    #[validate(range(
        min = MIN_QUESTION_COUNT,
        max = MAX_QUESTION_COUNT,
        message = "Number of questions must be between 3 and 50."
    ))]
    pub num_questions: usize,
    #[serde(default = "default_time_limit")]
    #[validate(range(
        min = MIN_TIME_LIMIT_MINUTES,
        max = MAX_TIME_LIMIT_MINUTES,
        message = "Time limit must be between 5 and 120 minutes."
    ))]
    pub time_limit_minutes: u64,
}

/// DTO for recording one answer.
#[derive(Debug, Deserialize)]
pub struct RecordAnswerRequest {
    pub question_id: i64,
    /// Stored verbatim and compared verbatim at finalize.
    pub option: String,
}

/// Read-only view of an open attempt for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptView {
    pub attempt_id: i64,
    pub questions: Vec<PublicQuestion>,
    pub selections: HashMap<i64, String>,
    pub started_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub remaining_seconds: i64,
    pub max_score: i64,
}

/// Result of a submit request. `finalized` is false when nothing was open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub finalized: bool,
    pub score: Option<Score>,
}
