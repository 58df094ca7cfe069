// src/handlers/analysis.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{analysis, error::AppError, store::QuizStore, utils::jwt::Claims};

/// Current user's last score, overall accuracy and accuracy by topic.
pub async fn my_analysis(
    State(store): State<Arc<dyn QuizStore>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let rows = store.result_rows(Some(user_id)).await?;

    Ok(Json(analysis::my_analysis(&rows)))
}
