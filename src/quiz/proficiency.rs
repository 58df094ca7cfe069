// src/quiz/proficiency.rs

use crate::{error::AppError, store::QuizStore};

/// Accuracy assumed for a user with no recorded responses.
pub const COLD_START_ACCURACY: f64 = 0.5;

/// Mean correctness over every response the user has ever recorded.
pub async fn estimate_accuracy(store: &dyn QuizStore, user_id: i64) -> Result<f64, AppError> {
    let history = store.correctness_history(user_id).await?;
    Ok(accuracy_from_history(&history))
}

pub fn accuracy_from_history(flags: &[bool]) -> f64 {
    if flags.is_empty() {
        return COLD_START_ACCURACY;
    }
    let correct = flags.iter().filter(|c| **c).count();
    correct as f64 / flags.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_start_prior() {
        assert_eq!(accuracy_from_history(&[]), 0.5);
    }

    #[test]
    fn test_mean_of_flags() {
        assert_eq!(accuracy_from_history(&[true, false, true, true]), 0.75);
        assert_eq!(accuracy_from_history(&[false, false]), 0.0);
        assert_eq!(accuracy_from_history(&[true]), 1.0);
    }
}
