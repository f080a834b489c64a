// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::quiz::{CreateQuizRequest, PublicQuestion, QuizSummary},
    store::DynQuizStore,
};

/// Creates a quiz with its full question set.
/// Admin only.
pub async fn create_quiz(
    State(store): State<DynQuizStore>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = payload.into_new_quiz()?;
    let detail = store.create_quiz(quiz).await?;

    tracing::info!("Quiz {} created ({} questions)", detail.quiz.id, detail.questions.len());
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Fully replaces a quiz's title, description and questions.
/// Admin only. Rejected with 409 once the quiz has attempts, since editing
/// the answer key would silently invalidate historical scores.
pub async fn update_quiz(
    State(store): State<DynQuizStore>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = payload.into_new_quiz()?;
    let detail = store.update_quiz(id, quiz).await?;
    Ok(Json(detail))
}

/// Deletes a quiz together with its questions and attempts.
/// Admin only.
pub async fn delete_quiz(
    State(store): State<DynQuizStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    store.delete_quiz(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lists all quizzes (metadata only, no questions), in creation order.
pub async fn list_quizzes(
    State(store): State<DynQuizStore>,
) -> Result<impl IntoResponse, AppError> {
    let quizzes = store.list_quizzes().await?;
    let summaries: Vec<QuizSummary> = quizzes.into_iter().map(QuizSummary::from).collect();
    Ok(Json(summaries))
}

/// Retrieves one quiz's metadata.
pub async fn get_quiz(
    State(store): State<DynQuizStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = store.get_quiz(id).await?;
    Ok(Json(QuizSummary::from(quiz)))
}

/// Lists a quiz's questions for taking, in display order.
///
/// Questions go through the `PublicQuestion` projection, which has no
/// `correct_option` field: the answer key cannot reach a taking user.
pub async fn list_questions(
    State(store): State<DynQuizStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let questions = store.get_questions(id).await?;
    let public: Vec<PublicQuestion> = questions.into_iter().map(PublicQuestion::from).collect();
    Ok(Json(public))
}
