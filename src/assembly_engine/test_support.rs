//! Fixtures shared by the unit tests.

use std::collections::BTreeSet;

use crate::assembly_engine::models::{Difficulty, Question};

/// A minimal authored question.
pub fn question(id: &str, subject: &str, grade: &str, difficulty: Difficulty) -> Question {
    Question {
        id: id.to_string(),
        content: format!("Authored question {id}"),
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        correct_answer: "A".into(),
        explanation: "Because A.".into(),
        subject: subject.to_string(),
        topic: "fixture".into(),
        grade: grade.to_string(),
        difficulty,
        tags: BTreeSet::new(),
        is_generated: false,
    }
}

/// `n` questions for one subject/grade/difficulty with ids `{prefix}{i}`.
pub fn questions(prefix: &str, n: usize, subject: &str, grade: &str, difficulty: Difficulty) -> Vec<Question> {
    (0..n)
        .map(|i| question(&format!("{prefix}{i}"), subject, grade, difficulty))
        .collect()
}
