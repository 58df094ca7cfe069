// src/handlers/admin.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    analysis,
    error::AppError,
    models::{question::CreateQuestionRequest, report::OverviewParams},
    store::QuizStore,
};

/// Results overview of every student.
/// Admin only.
pub async fn list_students(
    State(store): State<Arc<dyn QuizStore>>,
    Query(params): Query<OverviewParams>,
) -> Result<impl IntoResponse, AppError> {
    let users = store.users().await?;
    let rows = store.result_rows(None).await?;

    let overview = analysis::student_overview(&users, &rows);
    Ok(Json(analysis::filter_overview(overview, &params)))
}

/// Topic accuracy of one student compared with the whole class.
/// Admin only.
pub async fn student_report(
    State(store): State<Arc<dyn QuizStore>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user = store
        .user(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;
    let rows = store.result_rows(None).await?;

    Ok(Json(analysis::student_report(&user, &rows)))
}

/// Raw response rows for the class export.
/// Admin only.
pub async fn export_results(
    State(store): State<Arc<dyn QuizStore>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.result_rows(None).await?))
}

/// Adds a question to the bank.
/// Admin only.
pub async fn create_question(
    State(store): State<Arc<dyn QuizStore>>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let id = store.insert_question(&payload).await?;
    tracing::info!("Question {} created", id);

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}
