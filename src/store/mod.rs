// src/store/mod.rs

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::attempt::{Attempt, SubmittedAnswer};
use crate::models::quiz::{NewQuiz, Question, Quiz, QuizDetail};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// A scored submission ready for persistence. The store assigns the id and
/// the creation timestamp.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub quiz_id: i64,
    pub user_id: i64,
    pub answers: Vec<SubmittedAnswer>,
    pub score: i64,
    pub total: i64,
}

/// Persistence boundary for the quiz catalog and the attempt collection.
///
/// Implementations must make `insert_attempt` atomic with respect to the
/// duplicate check: two concurrent submissions for the same (user, quiz) pair
/// must never both succeed.
#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<QuizDetail, AppError>;

    /// Full replace of title, description and question set.
    /// Fails with `Conflict` once the quiz has attempts: editing the answer
    /// key would silently invalidate historical scores.
    async fn update_quiz(&self, id: i64, quiz: NewQuiz) -> Result<QuizDetail, AppError>;

    /// Deletes the quiz along with its questions and attempts.
    async fn delete_quiz(&self, id: i64) -> Result<(), AppError>;

    async fn get_quiz(&self, id: i64) -> Result<Quiz, AppError>;

    /// All quizzes in creation order.
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError>;

    /// The quiz's questions in display order.
    async fn get_questions(&self, quiz_id: i64) -> Result<Vec<Question>, AppError>;

    /// Persists a finalized attempt, rejecting a duplicate (user, quiz) pair
    /// with `Conflict`.
    async fn insert_attempt(&self, attempt: NewAttempt) -> Result<Attempt, AppError>;

    async fn get_attempt(&self, id: i64) -> Result<Attempt, AppError>;

    /// All attempts of one quiz in creation order.
    async fn list_attempts(&self, quiz_id: i64) -> Result<Vec<Attempt>, AppError>;
}

pub type DynQuizStore = Arc<dyn QuizStore>;
