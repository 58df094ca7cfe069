// src/quiz/sampler.rs

use std::collections::HashSet;

use rand::{Rng, seq::SliceRandom};

use super::{proficiency, repository, weighting::DifficultyWeights};
use crate::{
    error::AppError,
    models::question::{Difficulty, Question},
    store::QuizStore,
};

/// Number of questions to draw from each tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierCounts {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

impl TierCounts {
    pub fn get(&self, tier: Difficulty) -> usize {
        match tier {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    fn get_mut(&mut self, tier: Difficulty) -> &mut usize {
        match tier {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
        }
    }

    pub fn total(&self) -> usize {
        self.easy.saturating_add(self.medium).saturating_add(self.hard)
    }
}

/// Floors `n * weight` per tier and hands any shortfall to the heaviest tier.
pub fn target_counts(n: usize, weights: &DifficultyWeights) -> TierCounts {
    let mut counts = TierCounts::default();
    for tier in Difficulty::ALL {
        *counts.get_mut(tier) = (n as f64 * weights.weight(tier).max(0.0)).floor() as usize;
    }

    let total = counts.total();
    if total < n {
        *counts.get_mut(weights.heaviest()) += n - total;
    }
    counts
}

/// Draws up to `n` distinct questions following `weights`, using the thread-local RNG.
pub fn sample(questions: &[Question], n: usize, weights: &DifficultyWeights) -> Vec<Question> {
    sample_with_rng(questions, n, weights, &mut rand::thread_rng())
}

/// Weighted draw with backfill.
///
/// Each tier is shuffled and cut to its target; if the tiers cannot cover `n`,
/// the remainder is drawn at random from whatever is left of the pool.
/// Returns `min(n, pool size)` questions.
pub fn sample_with_rng<R: Rng + ?Sized>(
    questions: &[Question],
    n: usize,
    weights: &DifficultyWeights,
    rng: &mut R,
) -> Vec<Question> {
    let n = n.min(questions.len());
    if n == 0 {
        return Vec::new();
    }

    let counts = target_counts(n, weights);
    let mut seen: HashSet<i64> = HashSet::with_capacity(n);
    let mut chosen: Vec<&Question> = Vec::with_capacity(n);

    for tier in Difficulty::ALL {
        let mut pool: Vec<&Question> = questions.iter().filter(|q| q.difficulty == tier).collect();
        pool.shuffle(rng);
        for q in pool.into_iter().take(counts.get(tier)) {
            if seen.insert(q.id) {
                chosen.push(q);
            }
        }
    }

    if chosen.len() < n {
        let mut rest: Vec<&Question> = questions.iter().filter(|q| !seen.contains(&q.id)).collect();
        rest.shuffle(rng);
        for q in rest {
            if chosen.len() >= n {
                break;
            }
            if seen.insert(q.id) {
                chosen.push(q);
            }
        }
    }

    chosen.truncate(n);
    chosen.into_iter().cloned().collect()
}

/// Builds a paper for `user_id` from the user's history and the current bank.
pub async fn pick_questions(
    store: &dyn QuizStore,
    user_id: i64,
    n: usize,
) -> Result<Vec<Question>, AppError> {
    let eligible = repository::eligible_questions_from(store).await?;
    if eligible.is_empty() {
        tracing::warn!("No eligible questions in the bank");
        return Ok(Vec::new());
    }

    let accuracy = proficiency::estimate_accuracy(store, user_id).await?;
    let weights = DifficultyWeights::for_accuracy(accuracy);
    let paper = sample(&eligible, n, &weights);

    tracing::debug!(
        "Picked {}/{} questions for user {} (accuracy {:.2}, weights {:?})",
        paper.len(),
        n,
        user_id,
        accuracy,
        weights
    );

    Ok(paper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::QuestionRow;
    use rand::{SeedableRng, rngs::StdRng};

    fn question(id: i64, difficulty: Difficulty) -> Question {
        Question {
            id,
            prompt: format!("Question {}", id),
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            answer: "A".to_string(),
            topic: "SQL".to_string(),
            difficulty,
            marks: 1,
        }
    }

    /// `easy` + `medium` + `hard` questions with sequential ids.
    fn pool(easy: usize, medium: usize, hard: usize) -> Vec<Question> {
        let mut qs = Vec::new();
        let mut id = 1;
        for (tier, count) in [(Difficulty::Easy, easy), (Difficulty::Medium, medium), (Difficulty::Hard, hard)] {
            for _ in 0..count {
                qs.push(question(id, tier));
                id += 1;
            }
        }
        qs
    }

    fn tally(qs: &[Question]) -> TierCounts {
        let mut counts = TierCounts::default();
        for q in qs {
            *counts.get_mut(q.difficulty) += 1;
        }
        counts
    }

    #[test]
    fn test_targets_need_no_rounding_for_cold_start() {
        let weights = DifficultyWeights::for_accuracy(0.5);
        assert_eq!(target_counts(10, &weights), TierCounts { easy: 3, medium: 5, hard: 2 });
    }

    #[test]
    fn test_targets_round_up_the_heaviest_tier() {
        let weights = DifficultyWeights::for_accuracy(0.42);
        assert_eq!(target_counts(7, &weights), TierCounts { easy: 5, medium: 2, hard: 0 });
    }

    #[test]
    fn test_targets_for_strong_students_favor_medium_on_tie() {
        let weights = DifficultyWeights::for_accuracy(0.9);
        // floor: 0.6 -> 0, 1.2 -> 1, 1.2 -> 1; shortfall of one goes to medium.
        assert_eq!(target_counts(3, &weights), TierCounts { easy: 0, medium: 2, hard: 1 });
    }

    #[test]
    fn test_sample_follows_targets_when_tiers_are_deep() {
        let qs = pool(20, 20, 20);
        let weights = DifficultyWeights::for_accuracy(0.5);
        let paper = sample(&qs, 10, &weights);
        assert_eq!(tally(&paper), TierCounts { easy: 3, medium: 5, hard: 2 });
    }

    #[test]
    fn test_sample_size_is_min_of_n_and_pool() {
        let qs = pool(10, 10, 10);
        let weights = DifficultyWeights::for_accuracy(0.3);
        for n in 0..=40 {
            let paper = sample(&qs, n, &weights);
            assert_eq!(paper.len(), n.min(qs.len()), "n = {}", n);
            let ids: HashSet<i64> = paper.iter().map(|q| q.id).collect();
            assert_eq!(ids.len(), paper.len(), "duplicate question for n = {}", n);
        }
    }

    #[test]
    fn test_short_tier_is_backfilled() {
        // Low accuracy wants 6 easy out of 10, but only 2 exist.
        let qs = pool(2, 3, 20);
        let weights = DifficultyWeights::for_accuracy(0.1);
        let paper = sample(&qs, 10, &weights);

        assert_eq!(paper.len(), 10);
        let counts = tally(&paper);
        assert_eq!(counts.easy, 2);
        assert_eq!(counts.medium, 3);
        assert_eq!(counts.hard, 5);
    }

    #[test]
    fn test_tier_picks_come_before_backfill() {
        let qs = pool(1, 0, 10);
        let weights = DifficultyWeights::for_accuracy(0.1);
        let paper = sample(&qs, 4, &weights);

        assert_eq!(paper.len(), 4);
        assert_eq!(paper[0].difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_empty_pool_or_zero_n() {
        let weights = DifficultyWeights::for_accuracy(0.5);
        assert!(sample(&[], 10, &weights).is_empty());
        assert!(sample(&pool(3, 3, 3), 0, &weights).is_empty());
    }

    #[test]
    fn test_huge_n_returns_the_whole_pool() {
        let qs = pool(2, 2, 1);
        for accuracy in [0.1, 0.5, 0.9] {
            let weights = DifficultyWeights::for_accuracy(accuracy);
            let paper = sample(&qs, usize::MAX, &weights);
            assert_eq!(paper.len(), 5);
            let ids: HashSet<i64> = paper.iter().map(|q| q.id).collect();
            assert_eq!(ids.len(), 5);
        }
    }

    #[test]
    fn test_targets_for_huge_n_do_not_overflow() {
        let counts = target_counts(usize::MAX, &DifficultyWeights::for_accuracy(0.5));
        assert_eq!(counts.total(), usize::MAX);
    }

    #[test]
    fn test_sampling_differs_between_calls() {
        let qs = pool(70, 70, 70);
        let weights = DifficultyWeights::for_accuracy(0.5);
        let first: Vec<i64> = sample(&qs, 20, &weights).iter().map(|q| q.id).collect();
        let differs = (0..5).any(|_| {
            let next: Vec<i64> = sample(&qs, 20, &weights).iter().map(|q| q.id).collect();
            next != first
        });
        assert!(differs);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let qs = pool(10, 10, 10);
        let weights = DifficultyWeights::for_accuracy(0.6);
        let a = sample_with_rng(&qs, 8, &weights, &mut StdRng::seed_from_u64(7));
        let b = sample_with_rng(&qs, 8, &weights, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_ineligible_question_is_never_sampled() {
        let good = r#"["A","B","C","D"]"#;
        let mut rows: Vec<QuestionRow> = (1..=12)
            .map(|id| QuestionRow {
                id,
                qtype: "mcq".to_string(),
                prompt: format!("Question {}", id),
                options_json: Some(good.to_string()),
                answer: Some("A".to_string()),
                topic: Some("Web".to_string()),
                difficulty: Some("easy".to_string()),
                marks: Some(1),
            })
            .collect();
        rows[4].answer = Some("E".to_string());

        let eligible = repository::eligible_questions(rows);
        let weights = DifficultyWeights::for_accuracy(0.2);
        for _ in 0..50 {
            let paper = sample(&eligible, 12, &weights);
            assert_eq!(paper.len(), 11);
            assert!(paper.iter().all(|q| q.id != 5));
        }
    }
}
