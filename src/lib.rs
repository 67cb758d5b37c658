//! # practice_assembly
//!
//! Stratified test assembly and adaptive question pools for practice tests.
//!
//! Given a question bank, a test format (sections, per-section counts and
//! difficulty quotas) and a learner's history, the engine selects a question
//! set that honours every constraint it can. When the bank runs short it
//! falls back to deterministic procedural generation instead of failing.
//! Open-ended practice sessions are served from per-session reserves that
//! never repeat a question.
//!
//! ## How it works
//!
//! 1. Build a [`QuestionBank`] over a [`BankSource`] (a JSON file or an
//!    in-memory list). It loads once, on first use.
//! 2. Wrap it in a [`PracticeEngine`] together with a [`FormatCatalogue`].
//! 3. Call [`PracticeEngine::assemble`] for a whole test,
//!    [`PracticeEngine::validate`] to check bank coverage up front, or
//!    [`PracticeEngine::next_batch`] to stream questions to a session.
//!
//! ## Key features
//!
//! - **Deterministic**: every shuffle and generator takes an injected RNG or
//!   seed. [`generate`] returns the same question for the same
//!   (subject, grade, difficulty, seed), with a stable id.
//! - **Shortfall as data**: the distributor returns
//!   `Result<QuestionSet, Shortfall>`; the assembler turns a shortfall into
//!   generated questions and marks the section `supplemented`.
//! - **No repeats**: sessions track every delivered id and top up
//!   atomically, in the background when a tokio runtime is available.
//!
//! ## Quick start
//!
//! ```rust
//! use std::collections::HashSet;
//! use practice_assembly::{Difficulty, PracticeEngine, QuestionBank};
//!
//! // An empty bank: every question will be generated.
//! let engine = PracticeEngine::new(QuestionBank::from_questions(Vec::new()));
//!
//! let test = engine.assemble("opportunity-class", "5", &HashSet::new()).unwrap();
//! assert_eq!(test.total_questions, 40);
//! for section in &test.sections {
//!     println!("{}: {} questions ({} generated)", section.name, section.questions.len(), section.generated_count);
//! }
//!
//! let batch = engine.next_batch("learner-1", "math", "5", Difficulty::Easy, 5).unwrap();
//! assert_eq!(batch.len(), 5);
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rand::Rng;

pub mod assembly_engine;
pub mod record_adapter;

// Convenience re-exports so callers can use `practice_assembly::QuestionBank`
// directly without reaching into `assembly_engine::`.
pub use assembly_engine::{
    exclude, excluded_set, generate, generate_batch, generate_for_subject, generate_fresh,
    generate_question, select, AssemblyConfig, AssemblyError, BankSource, ConfigError,
    DataSourceError, Difficulty, DifficultyQuota, EngineConfig, FormatCatalogue, GeneratedTest,
    GenerationError, GenerationRequest, InMemorySource, JsonFileSource, Question, QuestionBank,
    QuestionSet, Section, SectionResult, SessionConfig, SessionError, SessionFilter,
    SessionPoolMaintainer, Shortfall, StratifiedTestAssembler, Subject, TestFormat,
    ValidationAdvisor, ValidationReport,
};
pub use record_adapter::{to_client_question, to_client_test, BankRecord};

/// One shared bank wired into the assembler, the validator and the session
/// maintainer.
#[derive(Debug)]
pub struct PracticeEngine {
    bank: Arc<QuestionBank>,
    assembler: StratifiedTestAssembler,
    validator: ValidationAdvisor,
    sessions: SessionPoolMaintainer,
}

impl PracticeEngine {
    /// Built-in formats and default tuning.
    pub fn new(bank: QuestionBank) -> Self {
        Self::with_parts(Arc::new(bank), FormatCatalogue::builtin(), EngineConfig::default())
    }

    /// Bank, formats and tuning taken from a configuration. Without a
    /// `bank_path` the bank is empty and every question is generated.
    pub fn from_config(config: EngineConfig) -> Result<Self, ConfigError> {
        let catalogue = config.catalogue()?;
        let bank = match &config.bank_path {
            Some(path) => QuestionBank::new(JsonFileSource::new(path)),
            None => QuestionBank::from_questions(Vec::new()),
        };
        Ok(Self::with_parts(Arc::new(bank), catalogue, config))
    }

    pub fn with_parts(bank: Arc<QuestionBank>, formats: FormatCatalogue, config: EngineConfig) -> Self {
        let formats = Arc::new(formats);
        Self {
            assembler: StratifiedTestAssembler::new(Arc::clone(&bank), Arc::clone(&formats))
                .with_config(config.assembly),
            validator: ValidationAdvisor::new(Arc::clone(&bank), formats),
            sessions: SessionPoolMaintainer::with_config(Arc::clone(&bank), config.session),
            bank,
        }
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn formats(&self) -> &FormatCatalogue {
        self.assembler.formats()
    }

    pub fn sessions(&self) -> &SessionPoolMaintainer {
        &self.sessions
    }

    pub fn assemble(
        &self,
        format_name: &str,
        grade: &str,
        excluded: &HashSet<String>,
    ) -> Result<GeneratedTest, AssemblyError> {
        self.assembler.assemble(format_name, grade, excluded)
    }

    pub fn assemble_with_rng<R: Rng>(
        &self,
        format_name: &str,
        grade: &str,
        excluded: &HashSet<String>,
        rng: &mut R,
    ) -> Result<GeneratedTest, AssemblyError> {
        self.assembler.assemble_with_rng(format_name, grade, excluded, rng)
    }

    pub fn validate(&self, format_name: &str, grade: &str) -> Result<ValidationReport, DataSourceError> {
        self.validator.validate(format_name, grade)
    }

    pub fn available_counts(&self, grade: &str) -> Result<BTreeMap<String, usize>, DataSourceError> {
        self.validator.available_counts(grade)
    }

    pub fn next_batch(
        &self,
        session_id: &str,
        subject: &str,
        grade: &str,
        difficulty: Difficulty,
        count: usize,
    ) -> Result<Vec<Question>, SessionError> {
        self.sessions.next_batch(session_id, subject, grade, difficulty, count)
    }

    pub fn ensure_minimum_reserve(&self, session_id: &str, minimum: usize) -> Result<usize, SessionError> {
        self.sessions.ensure_minimum_reserve(session_id, minimum)
    }

    pub fn close_session(&self, session_id: &str) -> bool {
        self.sessions.close_session(session_id)
    }
}
