// src/handlers/attempt.rs

use std::{sync::Arc, time::Duration};

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::{RecordAnswerRequest, StartAttemptRequest, SubmitResponse},
        user::User,
    },
    quiz::AttemptManager,
    store::QuizStore,
    utils::jwt::Claims,
};

/// Local account for the token's subject, created from the profile claims on first use.
async fn account_for(store: &dyn QuizStore, claims: &Claims) -> Result<User, AppError> {
    let user_id = claims.user_id()?;
    if let Some(user) = store.user(user_id).await? {
        return Ok(user);
    }

    let username = claims
        .username
        .clone()
        .unwrap_or_else(|| format!("user-{}", user_id));
    let full_name = claims.name.clone().unwrap_or_else(|| username.clone());

    let user = store
        .provision_user(user_id, &username, &full_name, &claims.role)
        .await?;
    tracing::info!("Provisioned account {} ('{}')", user.id, user.username);
    Ok(user)
}

/// Starts a timed attempt with an adaptively selected paper.
///
/// * The account is provisioned on the first start.
/// * The number of questions may be lower than requested when the bank is small.
/// * Returns 409 if the user already has an open attempt.
pub async fn start_attempt(
    State(manager): State<AttemptManager>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StartAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let user = account_for(manager.store().as_ref(), &claims).await?;

    let view = manager
        .start(
            user.id,
            req.num_questions,
            Duration::from_secs(req.time_limit_minutes * 60),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Returns the open attempt with recorded selections and time remaining.
pub async fn get_current(
    State(manager): State<AttemptManager>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let view = manager
        .current(user_id)
        .await
        .ok_or(AppError::NotFound("No open attempt".to_string()))?;

    Ok(Json(view))
}

pub async fn record_answer(
    State(manager): State<AttemptManager>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RecordAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    manager.record_answer(user_id, req.question_id, req.option).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Submits the open attempt. Submitting with nothing open is not an error.
pub async fn submit_attempt(
    State(manager): State<AttemptManager>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let score = manager.finalize(user_id).await?;

    Ok(Json(SubmitResponse {
        finalized: score.is_some(),
        score,
    }))
}

/// Abandons the open attempt without scoring it.
pub async fn abandon_attempt(
    State(manager): State<AttemptManager>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    manager.abandon(user_id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Persisted score of a completed attempt. Visible to its owner and to admins.
pub async fn get_attempt_score(
    State(store): State<Arc<dyn QuizStore>>,
    Extension(claims): Extension<Claims>,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let attempt = store
        .attempt(attempt_id)
        .await?
        .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    if attempt.user_id != user_id && !claims.is_admin() {
        return Err(AppError::Forbidden("Not your attempt".to_string()));
    }

    let score = store
        .attempt_score(attempt_id)
        .await?
        .ok_or(AppError::NotFound("Attempt is not complete".to_string()))?;

    Ok(Json(score))
}
