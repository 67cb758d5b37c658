//! Shared builder functions for the subject generators.
//!
//! Every generator follows the same steps: pick an archetype, instantiate
//! its parameters, compute the answer from those parameters, perturb the
//! answer into distractors, then shuffle the options. These helpers cover
//! the last three steps and the final assembly of the [`Question`].

use std::collections::BTreeSet;

use rand::Rng;

use crate::assembly_engine::{
    models::{Difficulty, Question, Subject},
    shuffle::{shuffle, shuffled},
};

/// Grade bands used to size operands and pick catalogues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GradeBand {
    /// Grades 1-2
    Early,
    /// Grades 3-4
    Primary,
    /// Grades 5-6
    Upper,
    /// Grades 7-8
    Middle,
    /// Grades 9-12
    Senior,
}

impl GradeBand {
    pub fn from_level(level: u8) -> Self {
        match level {
            0..=2 => GradeBand::Early,
            3..=4 => GradeBand::Primary,
            5..=6 => GradeBand::Upper,
            7..=8 => GradeBand::Middle,
            _     => GradeBand::Senior,
        }
    }

    /// Upper bound for "small" operands in this band.
    pub fn operand_limit(self) -> i64 {
        match self {
            GradeBand::Early   => 20,
            GradeBand::Primary => 100,
            GradeBand::Upper   => 500,
            GradeBand::Middle  => 1000,
            GradeBand::Senior  => 5000,
        }
    }
}

/// Three distinct wrong integers near `correct`.
///
/// Offsets combine small slips (±1, ±2) with a band-sized `spread`; when the
/// correct value is non-negative the distractors are too.
pub fn numeric_distractors<R: Rng>(rng: &mut R, correct: i64, spread: i64) -> Vec<i64> {
    let spread = spread.max(3);
    let mut offsets = vec![-spread, -2, -1, 1, 2, spread, 10, -10];
    shuffle(&mut offsets, rng);

    let mut out: Vec<i64> = Vec::with_capacity(3);
    for off in offsets {
        let candidate = correct + off;
        if candidate == correct || (correct >= 0 && candidate < 0) || out.contains(&candidate) {
            continue;
        }
        out.push(candidate);
        if out.len() == 3 {
            return out;
        }
    }
    // Near zero the negative offsets drop out; walk upwards instead.
    let mut step = 3;
    while out.len() < 3 {
        let candidate = correct + step;
        if !out.contains(&candidate) {
            out.push(candidate);
        }
        step += 1;
    }
    out
}

/// The `likely` slips first, topped up from [`numeric_distractors`] so there
/// are always three distinct wrong values even when two slips coincide.
pub fn pad_distractors<R: Rng>(rng: &mut R, correct: i64, spread: i64, likely: Vec<i64>) -> Vec<i64> {
    let fill = numeric_distractors(rng, correct, spread);
    let mut out: Vec<i64> = Vec::with_capacity(3);
    for v in likely.into_iter().chain(fill) {
        if out.len() == 3 {
            break;
        }
        if v != correct && !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

/// Up to three distinct wrong answers drawn from a catalogue.
pub fn text_distractors<R: Rng>(rng: &mut R, correct: &str, pool: &[&str]) -> Vec<String> {
    let mut wrong: Vec<&str> = pool.iter().copied().filter(|w| *w != correct).collect();
    wrong.sort_unstable();
    wrong.dedup();
    shuffled(wrong, rng).into_iter().take(3).map(str::to_string).collect()
}

/// Correct answer plus distractors, deduplicated and shuffled.
pub fn finalize_options<R: Rng>(rng: &mut R, correct: &str, distractors: Vec<String>) -> Vec<String> {
    let mut options = vec![correct.to_string()];
    for d in distractors {
        if options.len() == 4 {
            break;
        }
        if !options.contains(&d) {
            options.push(d);
        }
    }
    shuffled(options, rng)
}

/// Numeric options rendered with `render`, e.g. units or currency.
pub fn numeric_options<R: Rng>(
    rng: &mut R,
    correct: i64,
    spread: i64,
    render: impl Fn(i64) -> String,
) -> (String, Vec<String>) {
    let answer = render(correct);
    let wrong = numeric_distractors(rng, correct, spread)
        .into_iter()
        .map(&render)
        .collect();
    let options = finalize_options(rng, &answer, wrong);
    (answer, options)
}

/// Lower-case, dash-separated form of a topic name for tags.
pub fn slug(s: &str) -> String {
    s.to_ascii_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// The pieces a topic generator hands back before metadata is attached.
#[derive(Debug, Clone)]
pub struct Draft {
    pub topic: &'static str,
    pub content: String,
    pub answer: String,
    pub options: Vec<String>,
    pub explanation: String,
}

/// Attach id, subject, grade and tags to a generator draft.
pub fn question(
    id: String,
    subject: Subject,
    grade: &str,
    difficulty: Difficulty,
    draft: Draft,
) -> Question {
    let tags: BTreeSet<String> = ["generated".to_string(), subject.to_string(), slug(draft.topic)]
        .into_iter()
        .collect();
    Question {
        id,
        content: draft.content,
        options: draft.options,
        correct_answer: draft.answer,
        explanation: draft.explanation,
        subject: subject.bank_key().to_string(),
        topic: draft.topic.to_string(),
        grade: grade.to_string(),
        difficulty,
        tags,
        is_generated: true,
    }
}
