// src/quiz/weighting.rs

use serde::Serialize;

use crate::models::question::Difficulty;

/// Target share of each difficulty tier in a paper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DifficultyWeights {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
}

impl DifficultyWeights {
    pub const fn new(easy: f64, medium: f64, hard: f64) -> Self {
        Self { easy, medium, hard }
    }

    /// Piecewise policy: weaker students see more easy questions.
    /// Each boundary belongs to the upper band.
    pub fn for_accuracy(accuracy: f64) -> Self {
        if accuracy < 0.5 {
            Self::new(0.6, 0.3, 0.1)
        } else if accuracy < 0.8 {
            Self::new(0.3, 0.5, 0.2)
        } else {
            Self::new(0.2, 0.4, 0.4)
        }
    }

    pub fn weight(&self, tier: Difficulty) -> f64 {
        match tier {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    /// Tier with the largest weight; the earliest tier wins a tie.
    pub fn heaviest(&self) -> Difficulty {
        let mut best = Difficulty::Easy;
        for tier in Difficulty::ALL {
            if self.weight(tier) > self.weight(best) {
                best = tier;
            }
        }
        best
    }
}
