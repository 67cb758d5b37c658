use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Difficulty
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Case-insensitive parse of "easy" / "medium" / "hard".
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy"   => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard"   => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Single-letter code used inside generated question ids.
    pub fn code(self) -> char {
        match self {
            Difficulty::Easy   => 'E',
            Difficulty::Medium => 'M',
            Difficulty::Hard   => 'H',
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy   => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard   => write!(f, "hard"),
        }
    }
}

// ---------------------------------------------------------------------------
// Subjects and grades
// ---------------------------------------------------------------------------

/// Subjects with a procedural generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Subject {
    Math,
    English,
    Reading,
    ThinkingSkills,
    MathematicalReasoning,
}

impl Subject {
    pub const ALL: [Subject; 5] = [
        Subject::Math,
        Subject::English,
        Subject::Reading,
        Subject::ThinkingSkills,
        Subject::MathematicalReasoning,
    ];

    /// The four section subjects a test format is built from.
    pub const SECTION_SUBJECTS: [&'static str; 4] = ["thinking-skills", "reading", "math", "english"];

    /// Resolve a raw subject string to its generator.
    ///
    /// Mathematical reasoning is matched before canonicalization: the bank
    /// files it under thinking-skills, but it has its own generator.
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        if lowered == "mathematical-reasoning" {
            return Some(Subject::MathematicalReasoning);
        }
        match canonical_subject(&lowered).as_str() {
            "math"            => Some(Subject::Math),
            "english"         => Some(Subject::English),
            "reading"         => Some(Subject::Reading),
            "thinking-skills" => Some(Subject::ThinkingSkills),
            _ => None,
        }
    }

    /// Canonical bank key this subject is stored under.
    pub fn bank_key(self) -> &'static str {
        match self {
            Subject::Math                  => "math",
            Subject::English               => "english",
            Subject::Reading               => "reading",
            Subject::ThinkingSkills        => "thinking-skills",
            Subject::MathematicalReasoning => "thinking-skills",
        }
    }

    /// Two-letter prefix for generated question ids.
    pub fn id_prefix(self) -> &'static str {
        match self {
            Subject::Math                  => "MA",
            Subject::English               => "EN",
            Subject::Reading               => "RD",
            Subject::ThinkingSkills        => "TS",
            Subject::MathematicalReasoning => "MR",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Subject::Math                  => "math",
            Subject::English               => "english",
            Subject::Reading               => "reading",
            Subject::ThinkingSkills        => "thinking-skills",
            Subject::MathematicalReasoning => "mathematical-reasoning",
        };
        write!(f, "{}", s)
    }
}

/// Canonical subject key used for every bank comparison.
///
/// Applied to both record subjects at load time and query subjects at lookup
/// time, so the two sides can never disagree.
pub fn canonical_subject(raw: &str) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "math" | "maths" | "mathematics" => "math".to_string(),
        "thinking-skills" | "thinking_skills" | "thinking skills"
        | "mathematical-reasoning" | "mathematical_reasoning" | "mathematical reasoning" => {
            "thinking-skills".to_string()
        }
        "reading" => "reading".to_string(),
        "english" => "english".to_string(),
        _ => lowered,
    }
}

/// Normalized grade key: trimmed and lower-cased.
pub fn normalize_grade(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Numeric grade level for archetype selection, clamped to 1..=12.
/// Grades that are not numbers fall back to 5.
pub fn grade_level(grade: &str) -> u8 {
    let digits: String = grade.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<u8>().map(|g| g.clamp(1, 12)).unwrap_or(5)
}

// ---------------------------------------------------------------------------
// Question
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub content: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub subject: String,
    pub topic: String,
    pub grade: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub is_generated: bool,
}

impl Question {
    /// Checks the option invariants: at least two options, all distinct,
    /// and the correct answer is one of them.
    pub fn check(&self) -> Result<(), String> {
        if self.content.trim().is_empty() {
            return Err("empty content".to_string());
        }
        if self.options.len() < 2 {
            return Err(format!("{} option(s), need at least 2", self.options.len()));
        }
        let mut seen = HashSet::with_capacity(self.options.len());
        for opt in &self.options {
            if !seen.insert(opt.as_str()) {
                return Err(format!("duplicate option '{opt}'"));
            }
        }
        if !seen.contains(self.correct_answer.as_str()) {
            return Err(format!("correct answer '{}' is not an option", self.correct_answer));
        }
        Ok(())
    }

    pub fn is_well_formed(&self) -> bool {
        self.check().is_ok()
    }
}

// ---------------------------------------------------------------------------
// Test formats
// ---------------------------------------------------------------------------

/// Per-difficulty target counts for one section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyQuota {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

impl DifficultyQuota {
    pub fn new(easy: usize, medium: usize, hard: usize) -> Self {
        Self { easy, medium, hard }
    }

    pub fn get(&self, difficulty: Difficulty) -> usize {
        match difficulty {
            Difficulty::Easy   => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard   => self.hard,
        }
    }

    pub fn set(&mut self, difficulty: Difficulty, count: usize) {
        match difficulty {
            Difficulty::Easy   => self.easy = count,
            Difficulty::Medium => self.medium = count,
            Difficulty::Hard   => self.hard = count,
        }
    }

    pub fn total(&self) -> usize {
        self.easy + self.medium + self.hard
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub name: String,
    pub subject: String,
    pub question_count: usize,
    pub difficulty_distribution: DifficultyQuota,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestFormat {
    /// Catalogue key, e.g. "opportunity-class".
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub total_questions: usize,
    pub time_limit_minutes: u32,
    pub sections: Vec<Section>,
}

impl TestFormat {
    /// Definition-time invariant check: each section's quota sums to its
    /// count and the section counts sum to the format total.
    pub fn check(&self) -> Result<(), String> {
        if self.sections.is_empty() {
            return Err("format has no sections".to_string());
        }
        for section in &self.sections {
            let quota = section.difficulty_distribution.total();
            if quota != section.question_count {
                return Err(format!(
                    "section '{}' quota sums to {quota} but questionCount is {}",
                    section.name, section.question_count
                ));
            }
        }
        let sum: usize = self.sections.iter().map(|s| s.question_count).sum();
        if sum != self.total_questions {
            return Err(format!(
                "sections sum to {sum} but totalQuestions is {}",
                self.total_questions
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Assembly output
// ---------------------------------------------------------------------------

/// One section of an assembled test, occupying `start_index..=end_index` in
/// `GeneratedTest::questions`. Both bounds are inclusive, so an empty
/// section has `end_index == start_index - 1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionResult {
    pub name: String,
    pub subject: String,
    pub questions: Vec<Question>,
    pub start_index: usize,
    pub end_index: i64,
    /// True when procedural generation filled part of the section.
    pub supplemented: bool,
    pub generated_count: usize,
}

impl SectionResult {
    /// Inclusive end index for a section of `len` questions starting at `start`.
    pub fn inclusive_end(start: usize, len: usize) -> i64 {
        (start + len) as i64 - 1
    }

    /// The slice range of this section in the test's question list.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start_index..self.start_index + self.questions.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTest {
    pub id: String,
    pub format_name: String,
    pub grade: String,
    pub time_limit_minutes: u32,
    pub questions: Vec<Question>,
    pub sections: Vec<SectionResult>,
    pub total_questions: usize,
}

impl GeneratedTest {
    /// Questions the format asked for but neither the bank nor generation supplied.
    pub fn underfill(&self, format: &TestFormat) -> usize {
        format.total_questions.saturating_sub(self.total_questions)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub can_generate: bool,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_aliases_share_a_canonical_key() {
        assert_eq!(canonical_subject("Mathematics"), "math");
        assert_eq!(canonical_subject("maths"), "math");
        assert_eq!(canonical_subject("thinking_skills"), "thinking-skills");
        assert_eq!(canonical_subject("Mathematical-Reasoning"), "thinking-skills");
        assert_eq!(canonical_subject(" Science "), "science");
    }

    #[test]
    fn subject_parse_keeps_mathematical_reasoning_generator() {
        assert_eq!(Subject::parse("mathematical_reasoning"), Some(Subject::MathematicalReasoning));
        assert_eq!(Subject::parse("Thinking Skills"), Some(Subject::ThinkingSkills));
        assert_eq!(Subject::parse("mathematics"), Some(Subject::Math));
        assert_eq!(Subject::parse("geography"), None);
        assert_eq!(Subject::MathematicalReasoning.bank_key(), "thinking-skills");
    }

    #[test]
    fn grade_level_parses_and_clamps() {
        assert_eq!(grade_level("5"), 5);
        assert_eq!(grade_level("Year 7"), 7);
        assert_eq!(grade_level("40"), 12);
        assert_eq!(grade_level("kindy"), 5);
    }

    #[test]
    fn question_check_rejects_bad_options() {
        let mut q = Question {
            id: "q1".into(),
            content: "2 + 2?".into(),
            options: vec!["4".into(), "5".into()],
            correct_answer: "4".into(),
            explanation: String::new(),
            subject: "math".into(),
            topic: "addition".into(),
            grade: "3".into(),
            difficulty: Difficulty::Easy,
            tags: BTreeSet::new(),
            is_generated: false,
        };
        assert!(q.is_well_formed());

        q.correct_answer = "6".into();
        assert!(q.check().unwrap_err().contains("not an option"));

        q.correct_answer = "4".into();
        q.options.push("4".into());
        assert!(q.check().unwrap_err().contains("duplicate"));
    }

    #[test]
    fn format_check_catches_quota_mismatch() {
        let mut format = TestFormat {
            name: "mini".into(),
            display_name: "Mini".into(),
            description: String::new(),
            total_questions: 4,
            time_limit_minutes: 10,
            sections: vec![Section {
                name: "Maths".into(),
                subject: "math".into(),
                question_count: 4,
                difficulty_distribution: DifficultyQuota::new(1, 2, 1),
            }],
        };
        assert!(format.check().is_ok());

        format.sections[0].difficulty_distribution.hard = 2;
        assert!(format.check().is_err());

        format.sections[0].difficulty_distribution.hard = 1;
        format.total_questions = 5;
        assert!(format.check().unwrap_err().contains("totalQuestions"));
    }
}
