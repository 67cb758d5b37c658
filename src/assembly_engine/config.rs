//! Engine configuration and the test-format catalogue.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assembly_engine::{
    error::ConfigError,
    models::{DifficultyQuota, Section, TestFormat},
};

/// Environment variable that overrides `bank_path`.
pub const BANK_PATH_ENV: &str = "PRACTICE_BANK_PATH";

/// Practice-session tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Reserve size below which a background top-up is scheduled.
    #[serde(default = "default_low_water_mark")]
    pub low_water_mark: usize,
    /// Minimum number of questions added by one top-up.
    #[serde(default = "default_replenish_batch")]
    pub replenish_batch: usize,
    /// Generation attempts allowed per missing question before giving up.
    #[serde(default = "default_attempt_factor")]
    pub attempt_factor: usize,
    /// Run low-water top-ups on the tokio runtime when one is available.
    #[serde(default = "default_background")]
    pub background_replenish: bool,
}

/// Batch-assembly tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Generation attempts allowed per missing question before a section is
    /// left under-filled.
    #[serde(default = "default_attempt_factor")]
    pub attempt_factor: usize,
}

fn default_low_water_mark() -> usize {
    3
}
fn default_replenish_batch() -> usize {
    10
}
fn default_attempt_factor() -> usize {
    5
}
fn default_background() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            low_water_mark: default_low_water_mark(),
            replenish_batch: default_replenish_batch(),
            attempt_factor: default_attempt_factor(),
            background_replenish: default_background(),
        }
    }
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self { attempt_factor: default_attempt_factor() }
    }
}

/// Top-level engine configuration, usually read from `practice.toml`.
///
/// ```toml
/// bank_path = "data/questions.json"
///
/// [session]
/// low_water_mark = 5
///
/// [[formats]]
/// name = "mini-maths"
/// displayName = "Mini Maths"
/// totalQuestions = 4
/// timeLimitMinutes = 10
///
/// [[formats.sections]]
/// name = "Maths"
/// subject = "math"
/// questionCount = 4
/// difficultyDistribution = { easy = 1, medium = 2, hard = 1 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// JSON bank file. Absent means the caller supplies questions in memory.
    #[serde(default)]
    pub bank_path: Option<PathBuf>,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub assembly: AssemblyConfig,
    /// Formats added to (or replacing) the built-in catalogue.
    #[serde(default)]
    pub formats: Vec<TestFormat>,
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(raw)?;
        for format in &config.formats {
            format.check().map_err(|reason| ConfigError::InvalidFormat {
                name: format.name.clone(),
                reason,
            })?;
        }
        Ok(config)
    }

    /// Read a TOML file, then apply the `PRACTICE_BANK_PATH` override.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&raw)?;
        if let Ok(bank) = std::env::var(BANK_PATH_ENV) {
            config.bank_path = Some(PathBuf::from(bank));
        }
        Ok(config)
    }

    /// Built-in formats overlaid with the configured ones.
    pub fn catalogue(&self) -> Result<FormatCatalogue, ConfigError> {
        let mut catalogue = FormatCatalogue::builtin();
        for format in &self.formats {
            catalogue.insert(format.clone())?;
        }
        Ok(catalogue)
    }
}

// ---------------------------------------------------------------------------
// Format catalogue
// ---------------------------------------------------------------------------

/// Named test formats. Every format is checked on insertion, never against
/// the bank.
#[derive(Debug, Clone, Default)]
pub struct FormatCatalogue {
    formats: BTreeMap<String, TestFormat>,
}

impl FormatCatalogue {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The two standard formats: `opportunity-class` and `selective-school`.
    pub fn builtin() -> Self {
        let mut formats = BTreeMap::new();
        for format in [opportunity_class(), selective_school()] {
            formats.insert(format.name.clone(), format);
        }
        Self { formats }
    }

    pub fn insert(&mut self, format: TestFormat) -> Result<(), ConfigError> {
        format.check().map_err(|reason| ConfigError::InvalidFormat {
            name: format.name.clone(),
            reason,
        })?;
        self.formats.insert(format.name.clone(), format);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TestFormat> {
        self.formats.get(name.trim())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

fn section(name: &str, subject: &str, easy: usize, medium: usize, hard: usize) -> Section {
    Section {
        name: name.to_string(),
        subject: subject.to_string(),
        question_count: easy + medium + hard,
        difficulty_distribution: DifficultyQuota::new(easy, medium, hard),
    }
}

fn opportunity_class() -> TestFormat {
    TestFormat {
        name: "opportunity-class".to_string(),
        display_name: "Opportunity Class Placement Test".to_string(),
        description: "Four 10-question sections covering thinking skills, reading, \
                      mathematics and English for Year 4 entry."
            .to_string(),
        total_questions: 40,
        time_limit_minutes: 165,
        sections: vec![
            section("Thinking Skills", "thinking-skills", 3, 5, 2),
            section("Reading", "reading", 3, 5, 2),
            section("Mathematics", "math", 3, 5, 2),
            section("English", "english", 3, 5, 2),
        ],
    }
}

fn selective_school() -> TestFormat {
    TestFormat {
        name: "selective-school".to_string(),
        display_name: "Selective High School Placement Test".to_string(),
        description: "Fifty questions across thinking skills, reading, mathematics \
                      and English for Year 7 entry."
            .to_string(),
        total_questions: 50,
        time_limit_minutes: 180,
        sections: vec![
            section("Thinking Skills", "thinking-skills", 3, 6, 4),
            section("Reading", "reading", 3, 6, 3),
            section("Mathematics", "math", 3, 6, 4),
            section("English", "english", 3, 6, 3),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_formats_are_consistent() {
        let catalogue = FormatCatalogue::builtin();
        assert_eq!(catalogue.len(), 2);
        let oc = catalogue.get("opportunity-class").unwrap();
        assert_eq!(oc.total_questions, 40);
        assert_eq!(oc.sections[2].difficulty_distribution, DifficultyQuota::new(3, 5, 2));
        let ss = catalogue.get("selective-school").unwrap();
        assert_eq!(ss.total_questions, 50);
        assert!(oc.check().is_ok() && ss.check().is_ok());
    }

    #[test]
    fn defaults_apply_to_missing_sections() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.session.low_water_mark, 3);
        assert_eq!(config.session.replenish_batch, 10);
        assert_eq!(config.assembly.attempt_factor, 5);
        assert!(config.bank_path.is_none());
    }

    const MINI: &str = r#"
        bank_path = "bank.json"

        [session]
        low_water_mark = 5
        background_replenish = false

        [[formats]]
        name = "mini-maths"
        displayName = "Mini Maths"
        totalQuestions = 4
        timeLimitMinutes = 10

        [[formats.sections]]
        name = "Maths"
        subject = "math"
        questionCount = 4
        difficultyDistribution = { easy = 1, medium = 2, hard = 1 }
    "#;

    #[test]
    fn configured_formats_extend_the_catalogue() {
        let config = EngineConfig::from_toml_str(MINI).unwrap();
        assert_eq!(config.session.low_water_mark, 5);
        assert_eq!(config.session.replenish_batch, 10);
        assert!(!config.session.background_replenish);
        let catalogue = config.catalogue().unwrap();
        assert_eq!(catalogue.len(), 3);
        assert_eq!(catalogue.get("mini-maths").unwrap().sections.len(), 1);
    }

    #[test]
    fn inconsistent_format_is_rejected() {
        let broken = MINI.replace("totalQuestions = 4", "totalQuestions = 6");
        match EngineConfig::from_toml_str(&broken) {
            Err(ConfigError::InvalidFormat { name, .. }) => assert_eq!(name, "mini-maths"),
            other => panic!("expected InvalidFormat, got {other:?}"),
        }
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        assert!(matches!(EngineConfig::from_toml_str("session = ["), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{MINI}").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.formats.len(), 1);

        let missing = EngineConfig::load("/nonexistent/practice.toml");
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
