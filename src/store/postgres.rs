// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::future::Future;

use crate::error::AppError;
use crate::models::attempt::{Attempt, SubmittedAnswer};
use crate::models::quiz::{NewQuestion, NewQuiz, OptionKey, Question, Quiz, QuizDetail};
use crate::store::{NewAttempt, QuizStore};

/// Postgres-backed store. The resubmission policy is enforced by the
/// `UNIQUE (quiz_id, user_id)` index on `attempts`, so two concurrent
/// submissions can never both commit.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct QuizRow {
    id: i64,
    title: String,
    description: String,
    created_at: Option<DateTime<Utc>>,
}

impl From<QuizRow> for Quiz {
    fn from(row: QuizRow) -> Self {
        Quiz {
            id: row.id,
            title: row.title,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    quiz_id: i64,
    text: String,
    option_a: Option<String>,
    option_b: Option<String>,
    option_c: Option<String>,
    option_d: Option<String>,
    correct_option: String,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        // The CHECK constraint keeps the column in 'a'..'d'; anything else
        // means the row was tampered with outside the application.
        let correct_option = OptionKey::parse(&row.correct_option).ok_or_else(|| {
            AppError::Storage(format!(
                "question {} has corrupt correct_option '{}'",
                row.id, row.correct_option
            ))
        })?;
        Ok(Question {
            id: row.id,
            quiz_id: row.quiz_id,
            text: row.text,
            option_a: row.option_a,
            option_b: row.option_b,
            option_c: row.option_c,
            option_d: row.option_d,
            correct_option,
        })
    }
}

#[derive(FromRow)]
struct AttemptRow {
    id: i64,
    quiz_id: i64,
    user_id: i64,
    answers: Json<Vec<SubmittedAnswer>>,
    score: i64,
    total: i64,
    created_at: DateTime<Utc>,
}

impl From<AttemptRow> for Attempt {
    fn from(row: AttemptRow) -> Self {
        Attempt {
            id: row.id,
            quiz_id: row.quiz_id,
            user_id: row.user_id,
            answers: row.answers.0,
            score: row.score,
            total: row.total,
            created_at: row.created_at,
        }
    }
}

fn is_transient(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut)
}

/// Retries an idempotent read at most once on a transient connection
/// failure. Writes never go through here: retrying a submission could
/// double-score it.
async fn read_retry<T, F, Fut>(op: F) -> Result<T, sqlx::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    match op().await {
        Err(err) if is_transient(&err) => {
            tracing::warn!("Transient read failure, retrying once: {}", err);
            op().await
        }
        other => other,
    }
}

async fn insert_questions(
    tx: &mut Transaction<'_, Postgres>,
    quiz_id: i64,
    questions: &[NewQuestion],
) -> Result<Vec<Question>, AppError> {
    let mut rows = Vec::with_capacity(questions.len());
    for (idx, q) in questions.iter().enumerate() {
        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            INSERT INTO questions
            (quiz_id, idx, text, option_a, option_b, option_c, option_d, correct_option)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, quiz_id, text, option_a, option_b, option_c, option_d, correct_option
            "#,
        )
        .bind(quiz_id)
        .bind(idx as i32)
        .bind(&q.text)
        .bind(&q.option_a)
        .bind(&q.option_b)
        .bind(&q.option_c)
        .bind(&q.option_d)
        .bind(q.correct_option.as_str())
        .fetch_one(&mut **tx)
        .await?;
        rows.push(Question::try_from(row)?);
    }
    Ok(rows)
}

#[async_trait]
impl QuizStore for PostgresStore {
    async fn create_quiz(&self, quiz: NewQuiz) -> Result<QuizDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, QuizRow>(
            r#"
            INSERT INTO quizzes (title, description)
            VALUES ($1, $2)
            RETURNING id, title, description, created_at
            "#,
        )
        .bind(&quiz.title)
        .bind(&quiz.description)
        .fetch_one(&mut *tx)
        .await?;

        let questions = insert_questions(&mut tx, row.id, &quiz.questions).await?;
        tx.commit().await?;

        Ok(QuizDetail {
            quiz: row.into(),
            questions,
        })
    }

    async fn update_quiz(&self, id: i64, quiz: NewQuiz) -> Result<QuizDetail, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, QuizRow>(
            r#"
            UPDATE quizzes SET title = $2, description = $3
            WHERE id = $1
            RETURNING id, title, description, created_at
            "#,
        )
        .bind(id)
        .bind(&quiz.title)
        .bind(&quiz.description)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

        let attempted: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM attempts WHERE quiz_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if attempted {
            // Dropping the transaction rolls the title update back.
            return Err(AppError::Conflict(
                "Quiz already has attempts and can no longer be edited".to_string(),
            ));
        }

        sqlx::query("DELETE FROM questions WHERE quiz_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let questions = insert_questions(&mut tx, id, &quiz.questions).await?;
        tx.commit().await?;

        Ok(QuizDetail {
            quiz: row.into(),
            questions,
        })
    }

    async fn delete_quiz(&self, id: i64) -> Result<(), AppError> {
        // Questions and attempts go with the quiz (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }
        Ok(())
    }

    async fn get_quiz(&self, id: i64) -> Result<Quiz, AppError> {
        let pool = self.pool.clone();
        let row = read_retry(|| {
            let pool = pool.clone();
            async move {
                sqlx::query_as::<_, QuizRow>(
                    "SELECT id, title, description, created_at FROM quizzes WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&pool)
                .await
            }
        })
        .await?;

        row.map(Quiz::from)
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, AppError> {
        let pool = self.pool.clone();
        let rows = read_retry(|| {
            let pool = pool.clone();
            async move {
                sqlx::query_as::<_, QuizRow>(
                    "SELECT id, title, description, created_at FROM quizzes ORDER BY id",
                )
                .fetch_all(&pool)
                .await
            }
        })
        .await?;

        Ok(rows.into_iter().map(Quiz::from).collect())
    }

    async fn get_questions(&self, quiz_id: i64) -> Result<Vec<Question>, AppError> {
        self.get_quiz(quiz_id).await?;

        let pool = self.pool.clone();
        let rows = read_retry(|| {
            let pool = pool.clone();
            async move {
                sqlx::query_as::<_, QuestionRow>(
                    r#"
                    SELECT id, quiz_id, text, option_a, option_b, option_c, option_d, correct_option
                    FROM questions
                    WHERE quiz_id = $1
                    ORDER BY idx, id
                    "#,
                )
                .bind(quiz_id)
                .fetch_all(&pool)
                .await
            }
        })
        .await?;

        rows.into_iter().map(Question::try_from).collect()
    }

    async fn insert_attempt(&self, attempt: NewAttempt) -> Result<Attempt, AppError> {
        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            INSERT INTO attempts (quiz_id, user_id, answers, score, total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, quiz_id, user_id, answers, score, total, created_at
            "#,
        )
        .bind(attempt.quiz_id)
        .bind(attempt.user_id)
        .bind(Json(&attempt.answers))
        .bind(attempt.score)
        .bind(attempt.total)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Postgres error code for unique violation is 23505,
            // for foreign key violation 23503.
            let msg = e.to_string();
            if msg.contains("unique constraint") || msg.contains("23505") {
                AppError::Conflict("Quiz already attempted by this user".to_string())
            } else if msg.contains("foreign key") || msg.contains("23503") {
                AppError::NotFound("Quiz not found".to_string())
            } else {
                AppError::from(e)
            }
        })?;

        Ok(row.into())
    }

    async fn get_attempt(&self, id: i64) -> Result<Attempt, AppError> {
        let pool = self.pool.clone();
        let row = read_retry(|| {
            let pool = pool.clone();
            async move {
                sqlx::query_as::<_, AttemptRow>(
                    r#"
                    SELECT id, quiz_id, user_id, answers, score, total, created_at
                    FROM attempts
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .fetch_optional(&pool)
                .await
            }
        })
        .await?;

        row.map(Attempt::from)
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))
    }

    async fn list_attempts(&self, quiz_id: i64) -> Result<Vec<Attempt>, AppError> {
        self.get_quiz(quiz_id).await?;

        let pool = self.pool.clone();
        let rows = read_retry(|| {
            let pool = pool.clone();
            async move {
                sqlx::query_as::<_, AttemptRow>(
                    r#"
                    SELECT id, quiz_id, user_id, answers, score, total, created_at
                    FROM attempts
                    WHERE quiz_id = $1
                    ORDER BY id
                    "#,
                )
                .bind(quiz_id)
                .fetch_all(&pool)
                .await
            }
        })
        .await?;

        Ok(rows.into_iter().map(Attempt::from).collect())
    }
}
