// src/quiz/lifecycle.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, watch};

use super::{sampler, timer};
use crate::{
    error::AppError,
    models::{
        attempt::{AttemptView, GradedResponse, NewAttempt, Score},
        question::{PublicQuestion, Question},
    },
    store::QuizStore,
};

/// An open attempt: a fixed paper plus the answers recorded so far.
#[derive(Debug, Clone)]
pub struct Attempt {
    id: i64,
    user_id: i64,
    questions: Vec<Question>,
    selections: HashMap<i64, String>,
    started_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
}

impl Attempt {
    pub fn new(
        id: i64,
        user_id: i64,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            questions,
            selections: HashMap::new(),
            started_at,
            deadline,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    pub fn selection(&self, question_id: i64) -> Option<&str> {
        self.selections.get(&question_id).map(String::as_str)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }

    /// Records (or replaces) the selected option for one question.
    /// The option text is not checked against the question's options.
    pub fn record_answer(
        &mut self,
        question_id: i64,
        option: String,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if self.is_expired(now) {
            return Err(AppError::BadRequest("Time is up for this attempt".to_string()));
        }
        if !self.questions.iter().any(|q| q.id == question_id) {
            return Err(AppError::BadRequest(format!(
                "Question {} is not part of attempt {}",
                question_id, self.id
            )));
        }
        self.selections.insert(question_id, option);
        Ok(())
    }

    pub fn max_score(&self) -> i64 {
        self.questions.iter().map(|q| q.marks).sum()
    }

    /// One graded response per question, in paper order. Unanswered counts as wrong.
    pub fn grade(&self) -> Vec<GradedResponse> {
        self.questions
            .iter()
            .map(|q| {
                let selected = self.selection(q.id);
                GradedResponse {
                    question_id: q.id,
                    response: selected.map(str::to_string),
                    is_correct: q.is_correct(selected),
                    marks: q.marks,
                }
            })
            .collect()
    }

    pub fn view(&self, now: DateTime<Utc>) -> AttemptView {
        AttemptView {
            attempt_id: self.id,
            questions: self.questions.iter().map(PublicQuestion::from).collect(),
            selections: self.selections.clone(),
            started_at: self.started_at,
            deadline: self.deadline,
            remaining_seconds: timer::remaining_seconds(self.deadline, now),
            max_score: self.max_score(),
        }
    }
}

/// What caused a finalize. Both go through the same scoring path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    Deadline,
}

struct OpenAttempt {
    attempt: Attempt,
    remaining: watch::Receiver<i64>,
}

/// Owns every open attempt, at most one per user.
///
/// `sessions` is only locked for map updates, never across store I/O. Starts of the
/// same user are serialized by a per-user guard in `starting`.
#[derive(Clone)]
pub struct AttemptManager {
    store: Arc<dyn QuizStore>,
    sessions: Arc<Mutex<HashMap<i64, OpenAttempt>>>,
    starting: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
    tick: Duration,
}

impl AttemptManager {
    pub fn new(store: Arc<dyn QuizStore>, tick: Duration) -> Self {
        let tick = if tick.is_zero() { Duration::from_secs(1) } else { tick };
        Self {
            store,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            starting: Arc::new(Mutex::new(HashMap::new())),
            tick,
        }
    }

    pub fn store(&self) -> &Arc<dyn QuizStore> {
        &self.store
    }

    /// Starts a new attempt for `user_id`.
    ///
    /// Fails with `Conflict` while another attempt of the same user is open. An open
    /// attempt whose deadline already passed is submitted first.
    pub async fn start(
        &self,
        user_id: i64,
        num_questions: usize,
        time_limit: Duration,
    ) -> Result<AttemptView, AppError> {
        let limit = chrono::Duration::from_std(time_limit)
            .map_err(|_| AppError::BadRequest("Time limit is out of range".to_string()))?;

        let _guard = self.start_guard(user_id).await;

        let expired = {
            let mut sessions = self.sessions.lock().await;
            let open = sessions
                .get(&user_id)
                .map(|open| (open.attempt.id(), open.attempt.is_expired(Utc::now())));
            match open {
                Some((id, false)) => {
                    return Err(AppError::Conflict(format!(
                        "Attempt {} is still open; submit or abandon it first",
                        id
                    )));
                }
                Some((_, true)) => sessions.remove(&user_id),
                None => None,
            }
        };
        if let Some(expired) = expired {
            self.persist_final(expired.attempt, SubmitTrigger::Deadline).await?;
        }

        let questions = sampler::pick_questions(self.store.as_ref(), user_id, num_questions).await?;

        let started_at = Utc::now();
        let deadline = started_at + limit;
        let attempt_id = self
            .store
            .create_attempt(&NewAttempt {
                user_id,
                question_ids: questions.iter().map(|q| q.id).collect(),
                time_limit_seconds: limit.num_seconds(),
                started_at,
                deadline,
            })
            .await?;

        let attempt = Attempt::new(attempt_id, user_id, questions, started_at, deadline);
        let view = attempt.view(started_at);
        {
            // The ticker's first check waits for this lock, so it sees the new session.
            let mut sessions = self.sessions.lock().await;
            let remaining =
                timer::spawn_deadline_ticker(self.clone(), user_id, attempt_id, deadline, self.tick);
            sessions.insert(user_id, OpenAttempt { attempt, remaining });
        }

        tracing::info!(
            "User {} started attempt {} with {} questions (deadline {})",
            user_id,
            attempt_id,
            view.questions.len(),
            deadline
        );

        Ok(view)
    }

    async fn start_guard(&self, user_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut starting = self.starting.lock().await;
            starting.entry(user_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Stores an answer in memory; nothing is persisted until finalize.
    pub async fn record_answer(
        &self,
        user_id: i64,
        question_id: i64,
        option: String,
    ) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().await;
        let open = sessions
            .get_mut(&user_id)
            .ok_or(AppError::NotFound("No open attempt".to_string()))?;
        open.attempt.record_answer(question_id, option, Utc::now())
    }

    pub async fn current(&self, user_id: i64) -> Option<AttemptView> {
        let sessions = self.sessions.lock().await;
        sessions.get(&user_id).map(|open| open.attempt.view(Utc::now()))
    }

    /// Live "seconds remaining" feed of the user's open attempt.
    /// The channel closes once the attempt is submitted or abandoned.
    pub async fn subscribe(&self, user_id: i64) -> Option<watch::Receiver<i64>> {
        let sessions = self.sessions.lock().await;
        sessions.get(&user_id).map(|open| open.remaining.clone())
    }

    pub async fn is_open(&self, user_id: i64) -> bool {
        self.sessions.lock().await.contains_key(&user_id)
    }

    pub(crate) async fn is_current(&self, user_id: i64, attempt_id: i64) -> bool {
        let sessions = self.sessions.lock().await;
        sessions
            .get(&user_id)
            .is_some_and(|open| open.attempt.id() == attempt_id)
    }

    /// Scores and closes the user's open attempt.
    ///
    /// Returns `Ok(None)` when nothing is open, so a duplicate submit is harmless.
    pub async fn finalize(&self, user_id: i64) -> Result<Option<Score>, AppError> {
        let taken = self.sessions.lock().await.remove(&user_id);
        match taken {
            Some(open) => self.persist_final(open.attempt, SubmitTrigger::Manual).await,
            None => {
                tracing::debug!("Finalize for user {} ignored: no open attempt", user_id);
                Ok(None)
            }
        }
    }

    /// Deadline path: only closes `attempt_id`, and only once it has expired.
    pub(crate) async fn finalize_expired(
        &self,
        user_id: i64,
        attempt_id: i64,
    ) -> Result<Option<Score>, AppError> {
        let taken = {
            let mut sessions = self.sessions.lock().await;
            let due = sessions.get(&user_id).is_some_and(|open| {
                open.attempt.id() == attempt_id && open.attempt.is_expired(Utc::now())
            });
            if due { sessions.remove(&user_id) } else { None }
        };

        match taken {
            Some(open) => self.persist_final(open.attempt, SubmitTrigger::Deadline).await,
            None => Ok(None),
        }
    }

    /// Drops the open attempt without scoring it. Its row stays incomplete.
    pub async fn abandon(&self, user_id: i64) -> bool {
        let taken = self.sessions.lock().await.remove(&user_id);
        if let Some(open) = &taken {
            tracing::info!("User {} abandoned attempt {}", user_id, open.attempt.id());
        }
        taken.is_some()
    }

    async fn persist_final(
        &self,
        attempt: Attempt,
        trigger: SubmitTrigger,
    ) -> Result<Option<Score>, AppError> {
        let graded = attempt.grade();
        let written = self
            .store
            .complete_attempt(attempt.id(), Utc::now(), &graded)
            .await
            .map_err(|e| {
                tracing::error!("Failed to finalize attempt {}: {}", attempt.id(), e);
                e
            })?;

        if !written {
            tracing::warn!("Attempt {} was already finalized", attempt.id());
            return Ok(None);
        }

        let score = Score::from_graded(&graded);
        tracing::info!(
            "Attempt {} of user {} finalized ({:?}): {}/{}",
            attempt.id(),
            attempt.user_id(),
            trigger,
            score.obtained,
            score.maximum
        );
        Ok(Some(score))
    }
}
