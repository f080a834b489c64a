// src/handlers/attempt.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    grading,
    models::attempt::{SubmitAttemptRequest, SubmittedAnswer},
    store::{DynQuizStore, NewAttempt},
    utils::jwt::Claims,
};

/// Submits answers for a quiz and returns the finalized, scored attempt.
///
/// The submission is all-or-nothing: there is no draft state. A second
/// submission by the same user for the same quiz fails with 409; the
/// duplicate check is atomic at the storage boundary, so concurrent
/// duplicates cannot both succeed.
pub async fn submit_attempt(
    State(store): State<DynQuizStore>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let answers = payload.into_answer_map()?;

    let quiz = store.get_quiz(quiz_id).await?;
    let questions = store.get_questions(quiz.id).await?;

    let result = grading::grade(&questions, &answers);

    // Persist only answers that reference the quiz's own questions, in quiz
    // question order. Foreign ids were already ignored by grading.
    let kept: Vec<SubmittedAnswer> = questions
        .iter()
        .filter_map(|q| {
            answers.get(&q.id).map(|key| SubmittedAnswer {
                question_id: q.id,
                selected_option: *key,
            })
        })
        .collect();

    let attempt = store
        .insert_attempt(NewAttempt {
            quiz_id: quiz.id,
            user_id,
            answers: kept,
            score: result.correct_count as i64,
            total: result.total_questions as i64,
        })
        .await?;

    tracing::info!(
        "User {} scored {}/{} on quiz {}",
        user_id,
        attempt.score,
        attempt.total,
        quiz.id
    );
    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Retrieves one attempt. Readable by its owner or an admin.
pub async fn get_attempt(
    State(store): State<DynQuizStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = store.get_attempt(id).await?;

    if !claims.is_admin() && claims.user_id()? != attempt.user_id {
        return Err(AppError::Forbidden(
            "Attempts are visible to their owner only".to_string(),
        ));
    }

    Ok(Json(attempt))
}

/// Lists all attempts for a quiz, in creation order.
/// Admin only.
pub async fn list_attempts(
    State(store): State<DynQuizStore>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = store.list_attempts(quiz_id).await?;
    Ok(Json(attempts))
}
