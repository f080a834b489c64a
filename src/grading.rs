// src/grading.rs

use std::collections::HashMap;

use crate::models::quiz::{OptionKey, Question};

/// Outcome of grading one submission against one quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeResult {
    pub correct_count: u32,
    pub total_questions: u32,
    pub per_question: Vec<QuestionGrade>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionGrade {
    pub question_id: i64,
    pub is_correct: bool,
}

/// Grades submitted answers against a quiz's answer key.
///
/// * A question with no submitted answer counts as incorrect.
/// * An answer for a question that is not part of the quiz is ignored.
/// * A selected key the question does not offer counts as incorrect.
///
/// Pure: no I/O, no clock. Identical inputs always produce an identical
/// result, and `per_question` follows quiz question order.
pub fn grade(questions: &[Question], answers: &HashMap<i64, OptionKey>) -> GradeResult {
    let mut per_question = Vec::with_capacity(questions.len());
    let mut correct_count = 0;

    for question in questions {
        let is_correct = match answers.get(&question.id) {
            Some(selected) => question.offers(*selected) && *selected == question.correct_option,
            None => false,
        };
        if is_correct {
            correct_count += 1;
        }
        per_question.push(QuestionGrade {
            question_id: question.id,
            is_correct,
        });
    }

    GradeResult {
        correct_count,
        total_questions: questions.len() as u32,
        per_question,
    }
}
