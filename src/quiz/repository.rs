// src/quiz/repository.rs

use std::collections::HashSet;

use crate::{
    error::AppError,
    models::question::{Difficulty, Question, QuestionRow},
    store::QuizStore,
};

const OPTION_COUNT: usize = 4;

/// Loads the question bank and keeps only well-formed MCQs.
pub async fn eligible_questions_from(store: &dyn QuizStore) -> Result<Vec<Question>, AppError> {
    Ok(eligible_questions(store.question_rows().await?))
}

/// Filters raw rows down to valid multiple-choice questions.
///
/// Malformed rows are content noise, not faults: they are dropped without an error.
pub fn eligible_questions(rows: Vec<QuestionRow>) -> Vec<Question> {
    let total = rows.len();
    let eligible: Vec<Question> = rows.into_iter().filter_map(validate_row).collect();

    if eligible.len() < total {
        tracing::debug!(
            "Skipped {} malformed question rows ({} eligible)",
            total - eligible.len(),
            eligible.len()
        );
    }

    eligible
}

fn validate_row(row: QuestionRow) -> Option<Question> {
    if !row.qtype.trim().eq_ignore_ascii_case("mcq") {
        return None;
    }

    let options = parse_options(row.options_json.as_deref())?;
    let answer = row.answer?;
    if !options.contains(&answer) {
        return None;
    }

    Some(Question {
        id: row.id,
        prompt: row.prompt,
        options,
        answer,
        topic: row.topic.unwrap_or_default(),
        difficulty: Difficulty::parse_or_default(row.difficulty.as_deref()),
        marks: row.marks.filter(|m| *m > 0).unwrap_or(1),
    })
}

/// Exactly four distinct strings, or nothing.
fn parse_options(raw: Option<&str>) -> Option<Vec<String>> {
    let options: Vec<String> = serde_json::from_str(raw?).ok()?;
    if options.len() != OPTION_COUNT {
        return None;
    }
    let distinct: HashSet<&String> = options.iter().collect();
    if distinct.len() != OPTION_COUNT {
        return None;
    }
    Some(options)
}
