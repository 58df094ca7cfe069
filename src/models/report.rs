// src/models/report.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One response joined to its attempt, question and user.
/// This is the raw table handed to exporters.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ResultRow {
    pub attempt_id: i64,
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub question_id: i64,
    pub topic: String,
    pub marks: i64,
    pub response: Option<String>,
    pub is_correct: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicAccuracy {
    pub topic: String,
    /// Fraction in [0, 1].
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicComparison {
    pub topic: String,
    pub user: f64,
    pub class: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptScore {
    pub attempt_id: i64,
    pub user_id: i64,
    pub obtained: i64,
    pub maximum: i64,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Row of the admin results overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentOverview {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub attempts: usize,
    pub last_obtained: i64,
    pub last_max: i64,
    pub last_completed: Option<DateTime<Utc>>,
    /// Percentage, rounded to one decimal.
    pub accuracy: f64,
}

/// Student-facing analysis of their own history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MyAnalysis {
    pub last_score: Option<AttemptScore>,
    pub overall_accuracy: Option<f64>,
    pub topics: Vec<TopicAccuracy>,
}

/// Per-student data consumed by the PDF report renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentReport {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    /// Percentage.
    pub overall_accuracy: f64,
    pub topics: Vec<TopicAccuracy>,
    pub comparison: Vec<TopicComparison>,
    pub latest_attempt: Option<AttemptScore>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OverviewParams {
    pub search: Option<String>,
    pub min_attempts: Option<usize>,
}
