//! Core assembly engine: bank lookup, quota selection, procedural generation
//! and practice-session pools.
//!
//! ## Module overview
//!
//! | Module        | Purpose |
//! |---------------|---------|
//! | `models`      | Shared types: questions, formats, assembled tests, reports |
//! | `error`       | `thiserror` enums for every failure the engine reports |
//! | `bank`        | Lazily loaded, single-flight question bank over a `BankSource` |
//! | `filter`      | Order-preserving removal of excluded ids |
//! | `distributor` | Difficulty-quota selection returning `Result<QuestionSet, Shortfall>` |
//! | `shuffle`     | Fisher-Yates shuffle and uniform pick over an injected RNG |
//! | `helpers`     | Grade bands, distractor synthesis, question builder |
//! | `topics`      | One procedural generator per subject |
//! | `generator`   | Seeded dispatch to `topics` with stable ids |
//! | `fallback`    | Infallible arithmetic generator for sessions |
//! | `assembler`   | Multi-section test assembly with generated supplements |
//! | `validator`   | Read-only shortage diagnostic |
//! | `session`     | Per-session reserves with synchronous and background top-ups |
//! | `config`      | TOML configuration and the test-format catalogue |

pub mod assembler;
pub mod bank;
pub mod config;
pub mod distributor;
pub mod error;
pub mod fallback;
pub mod filter;
pub mod generator;
pub mod helpers;
pub mod models;
pub mod session;
pub mod shuffle;
pub mod topics;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the public API surface so callers can use
// `assembly_engine::StratifiedTestAssembler` without reaching into sub-modules.
pub use assembler::StratifiedTestAssembler;
pub use bank::{BankSource, InMemorySource, JsonFileSource, QuestionBank};
pub use config::{AssemblyConfig, EngineConfig, FormatCatalogue, SessionConfig};
pub use distributor::{select, QuestionSet, Shortfall};
pub use error::{AssemblyError, ConfigError, DataSourceError, GenerationError, SessionError};
pub use filter::{exclude, excluded_set};
pub use generator::{generate, generate_batch, generate_for_subject, generate_fresh, generate_question, GenerationRequest};
pub use models::{
    Difficulty, DifficultyQuota, GeneratedTest, Question, Section, SectionResult, Subject,
    TestFormat, ValidationReport,
};
pub use session::{SessionFilter, SessionPoolMaintainer};
pub use validator::ValidationAdvisor;
