// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::AppError;
use crate::models::quiz::OptionKey;

/// One answered question inside a finalized attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub selected_option: OptionKey,
}

/// A finalized, scored submission of one user against one quiz.
/// Immutable once created; `score` is the count of correct answers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub quiz_id: i64,
    pub user_id: i64,
    pub answers: Vec<SubmittedAnswer>,
    pub score: i64,
    pub total: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Derived leaderboard row, never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub score: i64,
}

/// DTO for submitting answers to a quiz.
#[derive(Debug, Deserialize)]
pub struct SubmitAttemptRequest {
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerInput {
    pub question_id: i64,
    pub selected_option: String,
}

impl SubmitAttemptRequest {
    /// Parses the raw payload into the typed answer map consumed by grading.
    ///
    /// Each entry becomes `answered(option_key)`; anything that is not a
    /// lowercase slot key, and any duplicated question id, is rejected here so
    /// malformed payloads never reach the grading engine.
    pub fn into_answer_map(self) -> Result<HashMap<i64, OptionKey>, AppError> {
        let mut answers = HashMap::with_capacity(self.answers.len());
        for (idx, answer) in self.answers.into_iter().enumerate() {
            let key = OptionKey::parse(&answer.selected_option).ok_or_else(|| {
                AppError::Validation(format!(
                    "answers[{}].selected_option: must be one of 'a', 'b', 'c', 'd'",
                    idx
                ))
            })?;
            if answers.insert(answer.question_id, key).is_some() {
                return Err(AppError::Validation(format!(
                    "answers[{}].question_id: question {} answered more than once",
                    idx, answer.question_id
                )));
            }
        }
        Ok(answers)
    }
}
