use std::collections::BTreeMap;
use std::sync::Arc;

use crate::assembly_engine::{
    bank::QuestionBank,
    config::FormatCatalogue,
    error::DataSourceError,
    models::{canonical_subject, normalize_grade, Subject, ValidationReport},
};

/// Read-only shortage diagnostic: can the bank alone fill a format?
#[derive(Debug, Clone)]
pub struct ValidationAdvisor {
    bank: Arc<QuestionBank>,
    formats: Arc<FormatCatalogue>,
}

impl ValidationAdvisor {
    pub fn new(bank: Arc<QuestionBank>, formats: Arc<FormatCatalogue>) -> Self {
        Self { bank, formats }
    }

    /// A section short of its count is an issue; one with less than twice
    /// its count earns a recommendation instead. An unknown format is
    /// reported, not raised.
    pub fn validate(&self, format_name: &str, grade: &str) -> Result<ValidationReport, DataSourceError> {
        let Some(format) = self.formats.get(format_name) else {
            return Ok(ValidationReport {
                can_generate: false,
                issues: vec![format!("Unknown test format: {format_name}")],
                recommendations: Vec::new(),
            });
        };
        let grade = normalize_grade(grade);

        let mut issues = Vec::new();
        let mut recommendations = Vec::new();
        let mut total_available = 0;
        for section in &format.sections {
            let available = self.bank.count(&grade, &section.subject, None)?;
            total_available += available;
            if available < section.question_count {
                issues.push(format!(
                    "{}: Need {}, have {available}",
                    section.name, section.question_count
                ));
            } else if available < section.question_count * 2 {
                recommendations.push(format!(
                    "{}: Limited questions ({available}). Consider adding more.",
                    section.name
                ));
            }
        }

        let can_generate = issues.is_empty() && total_available >= format.total_questions;
        if !can_generate && issues.is_empty() {
            issues.push(format!(
                "Insufficient total questions. Need {}, have {total_available}",
                format.total_questions
            ));
        }
        Ok(ValidationReport { can_generate, issues, recommendations })
    }

    /// Bank size per canonical section subject for one grade.
    pub fn available_counts(&self, grade: &str) -> Result<BTreeMap<String, usize>, DataSourceError> {
        let grade = normalize_grade(grade);
        let mut counts = BTreeMap::new();
        for subject in Subject::SECTION_SUBJECTS {
            counts.insert(canonical_subject(subject), self.bank.count(&grade, subject, None)?);
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly_engine::{models::Difficulty, test_support::questions};

    fn advisor(bank: Vec<crate::assembly_engine::models::Question>) -> ValidationAdvisor {
        ValidationAdvisor::new(
            Arc::new(QuestionBank::from_questions(bank)),
            Arc::new(FormatCatalogue::builtin()),
        )
    }

    #[test]
    fn unknown_format_is_a_single_issue() {
        let report = advisor(Vec::new()).validate("mystery", "5").unwrap();
        assert!(!report.can_generate);
        assert_eq!(report.issues, vec!["Unknown test format: mystery".to_string()]);
    }

    #[test]
    fn thin_sections_earn_recommendations_not_issues() {
        let mut bank = Vec::new();
        for subject in Subject::SECTION_SUBJECTS {
            bank.extend(questions(subject, 15, subject, "4", Difficulty::Medium));
        }
        let report = advisor(bank).validate("opportunity-class", "4").unwrap();
        assert!(report.can_generate);
        assert!(report.issues.is_empty());
        assert_eq!(report.recommendations.len(), 4);
        assert!(report.recommendations[0].contains("Limited questions (15)"));
    }

    #[test]
    fn available_counts_use_canonical_subjects() {
        let mut bank = questions("m", 3, "Mathematics", "5", Difficulty::Easy);
        bank.extend(questions("t", 2, "thinking_skills", "5", Difficulty::Hard));
        let counts = advisor(bank).available_counts("5").unwrap();
        assert_eq!(counts["math"], 3);
        assert_eq!(counts["thinking-skills"], 2);
        assert_eq!(counts["english"], 0);
    }
}
