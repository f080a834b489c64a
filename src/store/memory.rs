// src/store/memory.rs

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::models::attempt::Attempt;
use crate::models::quiz::{NewQuiz, Question, Quiz, QuizDetail};
use crate::store::{NewAttempt, QuizStore};

/// In-memory store backing tests and DATABASE_URL-less dev runs.
///
/// All mutation happens under the single write lock, so the duplicate-attempt
/// check and the insert are one atomic step, same as the unique index in the
/// Postgres backend.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    quizzes: BTreeMap<i64, Quiz>,
    // Quiz id -> owned questions in display order.
    questions: HashMap<i64, Vec<Question>>,
    attempts: BTreeMap<i64, Attempt>,
    // (quiz_id, user_id) pairs that already submitted.
    attempt_keys: HashSet<(i64, i64)>,
    quiz_seq: i64,
    question_seq: i64,
    attempt_seq: i64,
}

impl Inner {
    fn materialize_questions(&mut self, quiz_id: i64, quiz: &NewQuiz) -> Vec<Question> {
        quiz.questions
            .iter()
            .map(|q| {
                self.question_seq += 1;
                Question {
                    id: self.question_seq,
                    quiz_id,
                    text: q.text.clone(),
                    option_a: q.option_a.clone(),
                    option_b: q.option_b.clone(),
                    option_c: q.option_c.clone(),
                    option_d: q.option_d.clone(),
                    correct_option: q.correct_option,
                }
            })
            .collect()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<QuizDetail, AppError> {
        let mut inner = self.inner.write().await;
        inner.quiz_seq += 1;
        let id = inner.quiz_seq;

        let record = Quiz {
            id,
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            created_at: Some(Utc::now()),
        };
        let questions = inner.materialize_questions(id, &quiz);

        inner.quizzes.insert(id, record.clone());
        inner.questions.insert(id, questions.clone());

        Ok(QuizDetail {
            quiz: record,
            questions,
        })
    }

    async fn update_quiz(&self, id: i64, quiz: NewQuiz) -> Result<QuizDetail, AppError> {
        let mut inner = self.inner.write().await;

        if !inner.quizzes.contains_key(&id) {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }
        if inner.attempts.values().any(|a| a.quiz_id == id) {
            return Err(AppError::Conflict(
                "Quiz already has attempts and can no longer be edited".to_string(),
            ));
        }

        let questions = inner.materialize_questions(id, &quiz);
        let created_at = inner.quizzes.get(&id).and_then(|q| q.created_at);
        let record = Quiz {
            id,
            title: quiz.title,
            description: quiz.description,
            created_at,
        };
        inner.quizzes.insert(id, record.clone());
        inner.questions.insert(id, questions.clone());

        Ok(QuizDetail {
            quiz: record,
            questions,
        })
    }

    async fn delete_quiz(&self, id: i64) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;

        if inner.quizzes.remove(&id).is_none() {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }
        inner.questions.remove(&id);
        inner.attempts.retain(|_, a| a.quiz_id != id);
        inner.attempt_keys.retain(|(quiz_id, _)| *quiz_id != id);
        Ok(())
    }

    async fn get_quiz(&self, id: i64) -> Result<Quiz, AppError> {
        let inner = self.inner.read().await;
        inner
            .quizzes
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        let inner = self.inner.read().await;
        // BTreeMap iteration is ascending by id, i.e. creation order.
        Ok(inner.quizzes.values().cloned().collect())
    }

    async fn get_questions(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        let inner = self.inner.read().await;
        if !inner.quizzes.contains_key(&quiz_id) {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }
        Ok(inner.questions.get(&quiz_id).cloned().unwrap_or_default())
    }

    async fn insert_attempt(&self, attempt: NewAttempt) -> Result<Attempt, AppError> {
        let mut inner = self.inner.write().await;

        if !inner.quizzes.contains_key(&attempt.quiz_id) {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }
        if !inner.attempt_keys.insert((attempt.quiz_id, attempt.user_id)) {
            return Err(AppError::Conflict(
                "Quiz already attempted by this user".to_string(),
            ));
        }

        inner.attempt_seq += 1;
        let record = Attempt {
            id: inner.attempt_seq,
            quiz_id: attempt.quiz_id,
            user_id: attempt.user_id,
            answers: attempt.answers,
            score: attempt.score,
            total: attempt.total,
            created_at: Utc::now(),
        };
        inner.attempts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_attempt(&self, id: i64) -> Result<Attempt, AppError> {
        let inner = self.inner.read().await;
        inner
            .attempts
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))
    }

    async fn list_attempts(&self, quiz_id: i64) -> Result<Vec<Attempt>, AppError> {
        let inner = self.inner.read().await;
        if !inner.quizzes.contains_key(&quiz_id) {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }
        Ok(inner
            .attempts
            .values()
            .filter(|a| a.quiz_id == quiz_id)
            .cloned()
            .collect())
    }
}
