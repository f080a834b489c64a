// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::error::AppError;
use crate::utils::html::clean_html;

/// Label of one of the four answer slots of a question.
///
/// This is the only representation answers exist in past the payload
/// boundary: anything that is not a lowercase `a`/`b`/`c`/`d` fails to parse
/// and is rejected before it reaches grading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl OptionKey {
    /// Strict, case-sensitive parse. `"B"` or `"e"` yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "a" => Some(OptionKey::A),
            "b" => Some(OptionKey::B),
            "c" => Some(OptionKey::C),
            "d" => Some(OptionKey::D),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKey::A => "a",
            OptionKey::B => "b",
            OptionKey::C => "c",
            OptionKey::D => "d",
        }
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quiz metadata. Questions are owned by the quiz but fetched separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A single-choice question. A `None` slot means that choice is not offered.
///
/// Invariant (enforced at payload validation): `correct_option` always names
/// a present slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub text: String,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,
    pub correct_option: OptionKey,
}

impl Question {
    pub fn option_text(&self, key: OptionKey) -> Option<&str> {
        match key {
            OptionKey::A => self.option_a.as_deref(),
            OptionKey::B => self.option_b.as_deref(),
            OptionKey::C => self.option_c.as_deref(),
            OptionKey::D => self.option_d.as_deref(),
        }
    }

    /// Whether the question offers the given choice.
    pub fn offers(&self, key: OptionKey) -> bool {
        self.option_text(key).is_some()
    }
}

/// DTO for sending a question to a taking user.
/// Deliberately has no `correct_option` field, so the answer key cannot leak.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        PublicQuestion {
            id: q.id,
            text: q.text,
            option_a: q.option_a,
            option_b: q.option_b,
            option_c: q.option_c,
            option_d: q.option_d,
        }
    }
}

/// List view of a quiz, as consumed by the dashboard.
#[derive(Debug, Serialize)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
}

impl From<Quiz> for QuizSummary {
    fn from(q: Quiz) -> Self {
        QuizSummary {
            id: q.id,
            title: q.title,
            description: q.description,
        }
    }
}

/// A quiz together with its full question set, returned from admin writes.
#[derive(Debug, Serialize)]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<Question>,
}

/// Validated quiz content, ready for storage.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub title: String,
    pub description: String,
    pub questions: Vec<NewQuestion>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub text: String,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,
    pub correct_option: OptionKey,
}

/// DTO for creating or fully replacing a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200, message = "Title must not be empty."))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(nested)]
    pub questions: Vec<QuestionInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuestionInput {
    #[validate(length(min = 1, max = 1000, message = "Question text must not be empty."))]
    pub text: String,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub option_d: Option<String>,
    pub correct_option: String,
}

/// Empty or whitespace-only option text means the slot is not offered.
fn normalize_slot(slot: Option<String>) -> Option<String> {
    slot.filter(|s| !s.trim().is_empty())
}

impl CreateQuizRequest {
    /// Runs the cross-field checks the derive cannot express and converts the
    /// payload into validated storage input.
    ///
    /// Admin-authored prose (title, description, question text) is sanitized;
    /// option texts are stored verbatim so they read back byte-identical.
    pub fn into_new_quiz(self) -> Result<NewQuiz, AppError> {
        self.validate()?;

        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation(
                "title: must not be empty".to_string(),
            ));
        }

        let mut questions = Vec::with_capacity(self.questions.len());
        for (idx, q) in self.questions.into_iter().enumerate() {
            let correct_option = OptionKey::parse(&q.correct_option).ok_or_else(|| {
                AppError::Validation(format!(
                    "questions[{}].correct_option: must be one of 'a', 'b', 'c', 'd'",
                    idx
                ))
            })?;

            let question = NewQuestion {
                text: clean_html(&q.text),
                option_a: normalize_slot(q.option_a),
                option_b: normalize_slot(q.option_b),
                option_c: normalize_slot(q.option_c),
                option_d: normalize_slot(q.option_d),
                correct_option,
            };

            let slot_present = match correct_option {
                OptionKey::A => question.option_a.is_some(),
                OptionKey::B => question.option_b.is_some(),
                OptionKey::C => question.option_c.is_some(),
                OptionKey::D => question.option_d.is_some(),
            };
            if !slot_present {
                return Err(AppError::Validation(format!(
                    "questions[{}].correct_option: references option '{}' which is not offered",
                    idx, correct_option
                )));
            }

            questions.push(question);
        }

        Ok(NewQuiz {
            title: clean_html(title),
            description: clean_html(self.description.trim()),
            questions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question_input(correct: &str) -> QuestionInput {
        QuestionInput {
            text: "2+2=?".to_string(),
            option_a: Some("3".to_string()),
            option_b: Some("4".to_string()),
            option_c: None,
            option_d: None,
            correct_option: correct.to_string(),
        }
    }

    fn request(questions: Vec<QuestionInput>) -> CreateQuizRequest {
        CreateQuizRequest {
            title: "Math".to_string(),
            description: "Basics".to_string(),
            questions,
        }
    }

    #[test]
    fn accepts_valid_payload() {
        let quiz = request(vec![question_input("b")]).into_new_quiz().unwrap();
        assert_eq!(quiz.title, "Math");
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].correct_option, OptionKey::B);
    }

    #[test]
    fn rejects_empty_title() {
        let mut req = request(vec![question_input("b")]);
        req.title = "".to_string();
        assert!(matches!(
            req.into_new_quiz(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_unknown_option_key() {
        let err = request(vec![question_input("e")]).into_new_quiz().unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("questions[0].correct_option")),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn option_keys_are_case_sensitive() {
        assert!(request(vec![question_input("B")]).into_new_quiz().is_err());
    }

    #[test]
    fn rejects_correct_option_on_absent_slot() {
        let err = request(vec![question_input("c")]).into_new_quiz().unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("not offered")),
            other => panic!("expected Validation, got {:?}", other),
        }
    }

    #[test]
    fn blank_slot_counts_as_absent() {
        let mut input = question_input("c");
        input.option_c = Some("   ".to_string());
        assert!(request(vec![input]).into_new_quiz().is_err());
    }

    #[test]
    fn preserves_option_text_verbatim() {
        let mut input = question_input("b");
        input.option_b = Some("  Four (4) ".to_string());
        let quiz = request(vec![input]).into_new_quiz().unwrap();
        assert_eq!(quiz.questions[0].option_b.as_deref(), Some("  Four (4) "));
    }
}
