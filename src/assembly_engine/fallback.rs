//! Last-resort arithmetic questions.
//!
//! Used by practice sessions when a subject has no generator or its generator
//! fails. It cannot fail itself: two small operands, one operation, and
//! distractors at fixed offsets that can never collide with the answer.

use std::collections::BTreeSet;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::assembly_engine::{
    models::{canonical_subject, grade_level, normalize_grade, Difficulty, Question},
    shuffle::shuffled,
};

pub fn arithmetic(subject: &str, grade: &str, difficulty: Difficulty, seed: u64) -> Question {
    let mut rng = StdRng::seed_from_u64(seed);
    let level = grade_level(grade) as i64;
    let base: i64 = match difficulty {
        Difficulty::Easy   => 10,
        Difficulty::Medium => 20,
        Difficulty::Hard   => 50,
    };
    let scale = base * level;

    let a = rng.gen_range(1..=scale);
    let b = rng.gen_range(1..=scale);
    let (content, answer) = if difficulty == Difficulty::Hard {
        let small = rng.gen_range(2..=9);
        (format!("What is {a} × {small}?"), a * small)
    } else {
        (format!("What is {a} + {b}?"), a + b)
    };

    let options = shuffled(
        [answer, answer + 1, answer + 2, answer + 10]
            .iter()
            .map(i64::to_string)
            .collect(),
        &mut rng,
    );

    Question {
        id: format!("FB-{}{}-{seed:016X}", level, difficulty.code()),
        content,
        options,
        correct_answer: answer.to_string(),
        explanation: format!("The answer is {answer}."),
        subject: canonical_subject(subject),
        topic: "Arithmetic".to_string(),
        grade: normalize_grade(grade),
        difficulty,
        tags: ["generated", "fallback"].into_iter().map(str::to_string).collect::<BTreeSet<_>>(),
        is_generated: true,
    }
}
