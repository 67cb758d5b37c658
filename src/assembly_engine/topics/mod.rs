//! Procedural generators, one module per subject.
//!
//! Every module exposes the same entry point:
//!
//! ```ignore
//! pub fn generate<R: Rng>(rng: &mut R, level: u8, difficulty: Difficulty) -> Draft
//! ```
//!
//! `level` is the numeric grade (1..=12); each module maps it to a
//! [`GradeBand`](crate::assembly_engine::helpers::GradeBand) and picks an
//! archetype from that band's catalogue. The dispatcher in `generator.rs`
//! attaches ids and metadata to the returned draft.

/// MA-: arithmetic, word problems, fractions, percentages, equations
pub mod math;
/// EN-: plurals, agreement, tense, comparison, synonyms, antonyms
pub mod english;
/// RD-: templated passages with comprehension questions
pub mod reading;
/// TS-: patterns, analogies, syllogisms, directions, ordering
pub mod thinking_skills;
/// MR-: rates, ratios, averages, time, money
pub mod mathematical_reasoning;
