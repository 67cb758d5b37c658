//! Error types for the assembly engine.
//!
//! Only structural failures are errors. Bank shortfalls travel as data
//! (see [`crate::assembly_engine::distributor::Shortfall`]) and are absorbed by
//! procedural generation.

use std::path::PathBuf;

use thiserror::Error;

/// The question bank could not be loaded.
///
/// Cloneable so a single failed load can be reported to every caller until
/// a reload is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataSourceError {
    #[error("failed to read question bank {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("question bank is not a valid record array: {0}")]
    Parse(String),

    #[error("question bank is empty")]
    Empty,
}

/// A procedural generator could not produce a question.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("no procedural generator for subject '{0}'")]
    UnsupportedSubject(String),

    #[error("generated question {id} is malformed: {reason}")]
    Malformed { id: String, reason: String },

    #[error("generation exhausted for {subject}: produced {produced} of {requested}")]
    Exhausted { subject: String, requested: usize, produced: usize },
}

/// Hard failures of [`crate::StratifiedTestAssembler::assemble`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("unknown test format: {0}")]
    UnknownFormat(String),

    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    /// Neither the bank nor any generator produced a single question.
    #[error("no questions available for format '{format}' at grade {grade}")]
    NoQuestionsAvailable { format: String, grade: String },
}

impl AssemblyError {
    /// Stable machine-readable reason code for the surrounding application.
    pub fn reason_code(&self) -> &'static str {
        match self {
            AssemblyError::UnknownFormat(_)            => "unknown_format",
            AssemblyError::DataSource(_)               => "data_source",
            AssemblyError::NoQuestionsAvailable { .. } => "no_questions_available",
        }
    }
}

/// Failures of the practice-session maintainer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("unknown practice session: {0}")]
    UnknownSession(String),

    #[error(transparent)]
    DataSource(#[from] DataSourceError),
}

/// Configuration could not be read or contains an invalid format.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid test format '{name}': {reason}")]
    InvalidFormat { name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_are_distinct() {
        let errors = [
            AssemblyError::UnknownFormat("x".into()),
            AssemblyError::DataSource(DataSourceError::Empty),
            AssemblyError::NoQuestionsAvailable { format: "f".into(), grade: "5".into() },
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(|e| e.reason_code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn data_source_error_converts_into_assembly_error() {
        let err: AssemblyError = DataSourceError::Parse("bad".into()).into();
        assert_eq!(err.reason_code(), "data_source");
        assert!(err.to_string().contains("bad"));
    }
}
