use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::assembly_engine::{
    error::GenerationError,
    helpers,
    models::{grade_level, normalize_grade, Difficulty, Question, Subject},
    topics,
};

/// One generation call. `rng_seed: None` draws a fresh seed from entropy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub subject: Subject,
    pub grade: String,
    pub difficulty: Difficulty,
    pub rng_seed: Option<u64>,
}

impl GenerationRequest {
    pub fn new(subject: Subject, grade: impl Into<String>, difficulty: Difficulty) -> Self {
        Self { subject, grade: grade.into(), difficulty, rng_seed: None }
    }

    pub fn seeded(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

/// Stable id for a (subject, grade, difficulty, seed) quadruple.
pub fn make_question_id(subject: Subject, level: u8, difficulty: Difficulty, seed: u64) -> String {
    format!("{}-{}{}-{:016X}", subject.id_prefix(), level, difficulty.code(), seed)
}

/// A seed from entropy, kept below `u64::MAX / 2` so callers can count up
/// from it without wrapping.
pub fn fresh_seed() -> u64 {
    StdRng::from_entropy().gen::<u64>() >> 1
}

/// Core dispatch: routes to the subject's topic module.
///
/// Deterministic for a fixed (subject, grade, difficulty, seed). The result
/// is checked against the option invariants before it is returned.
pub fn generate(
    subject: Subject,
    grade: &str,
    difficulty: Difficulty,
    seed: u64,
) -> Result<Question, GenerationError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let level = grade_level(grade);

    let draft = match subject {
        Subject::Math                  => topics::math::generate(&mut rng, level, difficulty),
        Subject::English               => topics::english::generate(&mut rng, level, difficulty),
        Subject::Reading               => topics::reading::generate(&mut rng, level, difficulty),
        Subject::ThinkingSkills        => topics::thinking_skills::generate(&mut rng, level, difficulty),
        Subject::MathematicalReasoning => topics::mathematical_reasoning::generate(&mut rng, level, difficulty),
    };

    let id = make_question_id(subject, level, difficulty, seed);
    let question = helpers::question(id, subject, &normalize_grade(grade), difficulty, draft);
    question
        .check()
        .map_err(|reason| GenerationError::Malformed { id: question.id.clone(), reason })?;
    Ok(question)
}

/// Generate from a request, drawing a seed from entropy when none is set.
pub fn generate_question(request: &GenerationRequest) -> Result<Question, GenerationError> {
    let seed = request.rng_seed.unwrap_or_else(fresh_seed);
    generate(request.subject, &request.grade, request.difficulty, seed)
}

/// `count` questions using seeds `seed, seed + 1, ...`.
pub fn generate_batch(
    subject: Subject,
    grade: &str,
    difficulty: Difficulty,
    seed: u64,
    count: usize,
) -> Result<Vec<Question>, GenerationError> {
    (0..count as u64)
        .map(|i| generate(subject, grade, difficulty, seed.wrapping_add(i)))
        .collect()
}

/// A question nobody has seen before, for callers that want novelty rather
/// than reproducibility.
pub fn generate_fresh(
    subject: Subject,
    grade: &str,
    difficulty: Difficulty,
) -> Result<Question, GenerationError> {
    generate(subject, grade, difficulty, fresh_seed())
}

/// Like [`generate`] but takes the subject as free text, e.g. a section's
/// subject field.
pub fn generate_for_subject(
    subject: &str,
    grade: &str,
    difficulty: Difficulty,
    seed: u64,
) -> Result<Question, GenerationError> {
    let parsed = Subject::parse(subject)
        .ok_or_else(|| GenerationError::UnsupportedSubject(subject.to_string()))?;
    generate(parsed, grade, difficulty, seed)
}
