// src/quiz/mod.rs

//! Adaptive selection and the timed attempt lifecycle.

pub mod lifecycle;
pub mod proficiency;
pub mod repository;
pub mod sampler;
pub mod timer;
pub mod weighting;

pub use lifecycle::{Attempt, AttemptManager};
pub use weighting::DifficultyWeights;
