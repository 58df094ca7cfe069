// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Coarse difficulty label used to balance a paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Fixed tier order. Rounding ties and concatenation follow it.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Parses a stored label, falling back to `Medium` for anything unrecognised.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("easy") => Difficulty::Easy,
            Some("hard") => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// Represents a raw row of the 'questions' table.
/// Nothing here is trusted until it passes `quiz::repository::eligible_questions`.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub qtype: String,
    pub prompt: String,
    /// JSON array of option strings.
    pub options_json: Option<String>,
    pub answer: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub marks: Option<i64>,
}

/// A validated multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub id: i64,
    pub prompt: String,
    /// Exactly four distinct options, in display order.
    pub options: Vec<String>,
    /// Always equal to one of `options`.
    pub answer: String,
    pub topic: String,
    pub difficulty: Difficulty,
    /// Positive point value.
    pub marks: i64,
}

impl Question {
    /// Exact, case-sensitive comparison against the answer key.
    pub fn is_correct(&self, selected: Option<&str>) -> bool {
        selected == Some(self.answer.as_str())
    }
}

/// DTO for sending question to client (excludes answer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub prompt: String,
    pub options: Vec<String>,
    pub topic: String,
    pub difficulty: Difficulty,
    pub marks: i64,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            prompt: q.prompt.clone(),
            options: q.options.clone(),
            topic: q.topic.clone(),
            difficulty: q.difficulty,
            marks: q.marks,
        }
    }
}

fn default_qtype() -> String {
    "mcq".to_string()
}

/// DTO for authoring a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[serde(default = "default_qtype")]
    #[validate(length(min = 1, max = 20))]
    pub qtype: String,
    #[validate(length(min = 1, max = 1000))]
    pub prompt: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
    #[validate(length(max = 100))]
    pub topic: Option<String>,
    pub difficulty: Option<Difficulty>,
    #[validate(range(min = 1, max = 100))]
    pub marks: Option<i64>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.is_empty() {
        return Err(validator::ValidationError::new("options_cannot_be_empty"));
    }
    for opt in options {
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}
