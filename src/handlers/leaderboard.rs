// src/handlers/leaderboard.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{error::AppError, leaderboard, store::DynQuizStore};

/// Returns the ranked leaderboard for a quiz: score descending, ties broken
/// by who achieved the score first.
///
/// A quiz without attempts yields an empty list; only an unknown quiz is 404.
pub async fn get_leaderboard(
    State(store): State<DynQuizStore>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = store.list_attempts(quiz_id).await?;
    Ok(Json(leaderboard::rank(&attempts)))
}
