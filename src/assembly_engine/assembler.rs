//! Multi-section test assembly.
//!
//! For each section of a [`TestFormat`] the assembler looks up the bank,
//! removes excluded ids, and asks the distributor to fill the difficulty
//! quota. A shortfall is not an error: the missing questions are generated
//! procedurally, difficulty by difficulty, and the section is marked
//! `supplemented`. Only an unknown format, a bank failure, or a test that
//! ends up completely empty is reported as [`AssemblyError`].

use std::collections::HashSet;
use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{info, warn};

use crate::assembly_engine::{
    bank::QuestionBank,
    config::{AssemblyConfig, FormatCatalogue},
    distributor::{self, Shortfall},
    error::{AssemblyError, GenerationError},
    filter,
    generator,
    models::{normalize_grade, Difficulty, DifficultyQuota, GeneratedTest, Question, Section, SectionResult, Subject},
    shuffle::shuffle,
};

#[derive(Debug, Clone)]
pub struct StratifiedTestAssembler {
    bank: Arc<QuestionBank>,
    formats: Arc<FormatCatalogue>,
    config: AssemblyConfig,
}

/// Seeds and ids shared by every section of one assembly call.
struct AssemblyState<'a> {
    excluded: &'a HashSet<String>,
    used: HashSet<String>,
    next_seed: u64,
}

impl StratifiedTestAssembler {
    pub fn new(bank: Arc<QuestionBank>, formats: Arc<FormatCatalogue>) -> Self {
        Self { bank, formats, config: AssemblyConfig::default() }
    }

    pub fn with_config(mut self, config: AssemblyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn formats(&self) -> &FormatCatalogue {
        &self.formats
    }

    /// Assemble with an entropy-seeded RNG.
    pub fn assemble(
        &self,
        format_name: &str,
        grade: &str,
        excluded: &HashSet<String>,
    ) -> Result<GeneratedTest, AssemblyError> {
        let mut rng = StdRng::from_entropy();
        self.assemble_with_rng(format_name, grade, excluded, &mut rng)
    }

    /// Assemble with a caller-supplied RNG; a seeded RNG makes the whole test
    /// reproducible.
    pub fn assemble_with_rng<R: Rng>(
        &self,
        format_name: &str,
        grade: &str,
        excluded: &HashSet<String>,
        rng: &mut R,
    ) -> Result<GeneratedTest, AssemblyError> {
        let format = self
            .formats
            .get(format_name)
            .ok_or_else(|| AssemblyError::UnknownFormat(format_name.to_string()))?;
        let grade = normalize_grade(grade);

        let mut state = AssemblyState {
            excluded,
            used: HashSet::new(),
            next_seed: rng.gen::<u64>() >> 1,
        };
        let mut questions: Vec<Question> = Vec::with_capacity(format.total_questions);
        let mut sections = Vec::with_capacity(format.sections.len());

        for section in &format.sections {
            let (picked, generated_count) = self.fill_section(section, &grade, &mut state, rng)?;
            let start_index = questions.len();
            let end_index = SectionResult::inclusive_end(start_index, picked.len());
            questions.extend(picked.iter().cloned());
            sections.push(SectionResult {
                name: section.name.clone(),
                subject: section.subject.clone(),
                questions: picked,
                start_index,
                end_index,
                supplemented: generated_count > 0,
                generated_count,
            });
        }

        if questions.is_empty() {
            return Err(AssemblyError::NoQuestionsAvailable {
                format: format.name.clone(),
                grade,
            });
        }

        let generated: usize = sections.iter().map(|s| s.generated_count).sum();
        info!(
            format = %format.name,
            %grade,
            questions = questions.len(),
            generated,
            "assembled test"
        );

        Ok(GeneratedTest {
            id: uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string(),
            format_name: format.name.clone(),
            grade,
            time_limit_minutes: format.time_limit_minutes,
            total_questions: questions.len(),
            questions,
            sections,
        })
    }

    fn fill_section<R: Rng>(
        &self,
        section: &Section,
        grade: &str,
        state: &mut AssemblyState<'_>,
        rng: &mut R,
    ) -> Result<(Vec<Question>, usize), AssemblyError> {
        let candidates: Vec<Question> = filter::exclude(self.bank.lookup(grade, &section.subject, None)?, state.excluded)
            .into_iter()
            .filter(|q| !state.used.contains(&q.id))
            .collect();

        match distributor::select(candidates, &section.difficulty_distribution, rng) {
            Ok(picked) => {
                state.used.extend(picked.iter().map(|q| q.id.clone()));
                Ok((picked, 0))
            }
            Err(Shortfall { selected, missing }) => {
                warn!(
                    section = %section.name,
                    subject = %section.subject,
                    %grade,
                    from_bank = selected.len(),
                    missing = missing.total(),
                    "bank shortfall, supplementing with generated questions"
                );
                state.used.extend(selected.iter().map(|q| q.id.clone()));
                let generated = self.supplement(section, grade, &missing, state);
                let generated_count = generated.len();
                let mut picked = selected;
                picked.extend(generated);
                shuffle(&mut picked, rng);
                Ok((picked, generated_count))
            }
        }
    }

    /// Generate the missing questions of each difficulty. Ids already used in
    /// this test or excluded by the learner's history are skipped; each
    /// difficulty gets `missing × attempt_factor` attempts.
    fn supplement(
        &self,
        section: &Section,
        grade: &str,
        missing: &DifficultyQuota,
        state: &mut AssemblyState<'_>,
    ) -> Vec<Question> {
        let Some(subject) = Subject::parse(&section.subject) else {
            warn!(
                section = %section.name,
                error = %GenerationError::UnsupportedSubject(section.subject.clone()),
                "section left under-filled"
            );
            return Vec::new();
        };

        let mut out = Vec::with_capacity(missing.total());
        for difficulty in Difficulty::ALL {
            let want = missing.get(difficulty);
            let budget = want * self.config.attempt_factor;
            let mut produced = 0;
            let mut attempts = 0;
            while produced < want && attempts < budget {
                attempts += 1;
                let seed = state.next_seed;
                state.next_seed = state.next_seed.wrapping_add(1);
                match generator::generate(subject, grade, difficulty, seed) {
                    Ok(q) if state.excluded.contains(&q.id) || state.used.contains(&q.id) => continue,
                    Ok(q) => {
                        state.used.insert(q.id.clone());
                        out.push(q);
                        produced += 1;
                    }
                    Err(err) => warn!(%err, "discarding generated question"),
                }
            }
            if produced < want {
                let err = GenerationError::Exhausted {
                    subject: subject.to_string(),
                    requested: want,
                    produced,
                };
                warn!(section = %section.name, %difficulty, error = %err, "section left under-filled");
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly_engine::{error::DataSourceError, test_support::questions};

    fn assembler(bank: Vec<Question>) -> StratifiedTestAssembler {
        StratifiedTestAssembler::new(
            Arc::new(QuestionBank::from_questions(bank)),
            Arc::new(FormatCatalogue::builtin()),
        )
    }

    fn full_bank(grade: &str) -> Vec<Question> {
        let mut bank = Vec::new();
        for subject in Subject::SECTION_SUBJECTS {
            for d in Difficulty::ALL {
                bank.extend(questions(&format!("{subject}-{d}-"), 8, subject, grade, d));
            }
        }
        bank
    }

    #[test]
    fn unknown_format_is_an_error() {
        let err = assembler(full_bank("5"))
            .assemble("nope", "5", &HashSet::new())
            .unwrap_err();
        assert_eq!(err, AssemblyError::UnknownFormat("nope".into()));
    }

    #[test]
    fn ample_bank_needs_no_generation() {
        let mut rng = StdRng::seed_from_u64(1);
        let test = assembler(full_bank("5"))
            .assemble_with_rng("opportunity-class", "5", &HashSet::new(), &mut rng)
            .unwrap();
        assert_eq!(test.total_questions, 40);
        assert!(test.sections.iter().all(|s| !s.supplemented && s.generated_count == 0));
        assert!(test.questions.iter().all(|q| !q.is_generated));
    }

    #[test]
    fn section_without_generator_is_left_short() {
        let mut catalogue = FormatCatalogue::empty();
        catalogue
            .insert(crate::assembly_engine::models::TestFormat {
                name: "geo".into(),
                display_name: "Geography".into(),
                description: String::new(),
                total_questions: 5,
                time_limit_minutes: 10,
                sections: vec![
                    Section {
                        name: "Maps".into(),
                        subject: "geography".into(),
                        question_count: 2,
                        difficulty_distribution: DifficultyQuota::new(1, 1, 0),
                    },
                    Section {
                        name: "Sums".into(),
                        subject: "math".into(),
                        question_count: 3,
                        difficulty_distribution: DifficultyQuota::new(1, 1, 1),
                    },
                ],
            })
            .unwrap();
        let assembler = StratifiedTestAssembler::new(
            Arc::new(QuestionBank::from_questions(questions("g", 1, "geography", "5", Difficulty::Easy))),
            Arc::new(catalogue),
        );
        let mut rng = StdRng::seed_from_u64(2);
        let test = assembler.assemble_with_rng("geo", "5", &HashSet::new(), &mut rng).unwrap();
        assert_eq!(test.sections[0].questions.len(), 1);
        assert_eq!(test.sections[1].questions.len(), 3);
        assert_eq!(test.sections[1].generated_count, 3);
        assert_eq!(test.total_questions, 4);
        assert_eq!((test.sections[0].start_index, test.sections[0].end_index), (0, 0));
        assert_eq!((test.sections[1].start_index, test.sections[1].end_index), (1, 3));
    }

    #[test]
    fn empty_leading_section_ends_before_it_starts() {
        let mut catalogue = FormatCatalogue::empty();
        catalogue
            .insert(crate::assembly_engine::models::TestFormat {
                name: "geo".into(),
                display_name: "Geography".into(),
                description: String::new(),
                total_questions: 4,
                time_limit_minutes: 10,
                sections: vec![
                    Section {
                        name: "Maps".into(),
                        subject: "geography".into(),
                        question_count: 2,
                        difficulty_distribution: DifficultyQuota::new(1, 1, 0),
                    },
                    Section {
                        name: "Sums".into(),
                        subject: "math".into(),
                        question_count: 2,
                        difficulty_distribution: DifficultyQuota::new(1, 1, 0),
                    },
                ],
            })
            .unwrap();
        let assembler = StratifiedTestAssembler::new(
            Arc::new(QuestionBank::from_questions(Vec::new())),
            Arc::new(catalogue),
        );
        let mut rng = StdRng::seed_from_u64(3);
        let test = assembler.assemble_with_rng("geo", "5", &HashSet::new(), &mut rng).unwrap();
        assert!(test.sections[0].questions.is_empty());
        assert_eq!((test.sections[0].start_index, test.sections[0].end_index), (0, -1));
        assert_eq!((test.sections[1].start_index, test.sections[1].end_index), (0, 1));
        assert_eq!(test.sections[1].range(), 0..2);
    }

    #[test]
    fn bank_failure_propagates() {
        struct Broken;
        impl crate::assembly_engine::bank::BankSource for Broken {
            fn load(&self) -> Result<Vec<Question>, DataSourceError> {
                Err(DataSourceError::Parse("truncated".into()))
            }
            fn describe(&self) -> String {
                "broken".into()
            }
        }
        let assembler = StratifiedTestAssembler::new(
            Arc::new(QuestionBank::new(Broken)),
            Arc::new(FormatCatalogue::builtin()),
        );
        let err = assembler.assemble("opportunity-class", "5", &HashSet::new()).unwrap_err();
        assert_eq!(err.reason_code(), "data_source");
    }

    #[test]
    fn zero_attempt_budget_with_empty_bank_is_no_questions_available() {
        let assembler = assembler(Vec::new()).with_config(AssemblyConfig { attempt_factor: 0 });
        let err = assembler.assemble("selective-school", "7", &HashSet::new()).unwrap_err();
        assert_eq!(err.reason_code(), "no_questions_available");
    }
}
