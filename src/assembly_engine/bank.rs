//! The shared, read-only question bank.
//!
//! A bank wraps a [`BankSource`] and loads it at most once. Loading is a
//! single flight behind a mutex: concurrent first callers wait for the same
//! load and all see its outcome. A failed load is remembered and returned to
//! every caller until [`QuestionBank::reload`] is called. Once loaded, the
//! index is an immutable `Arc` read without locking.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing::{info, warn};

use crate::assembly_engine::{
    error::DataSourceError,
    models::{canonical_subject, normalize_grade, Difficulty, Question},
};
use crate::record_adapter::BankRecord;

/// Where the bank's records come from.
pub trait BankSource: Send + Sync {
    /// Read every record in full. Malformed records are the source's concern
    /// to skip; structural failures (unreadable, not an array) are errors.
    fn load(&self) -> Result<Vec<Question>, DataSourceError>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

/// A bank held in memory, e.g. questions handed over by a collaborator.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    questions: Vec<Question>,
}

impl InMemorySource {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }
}

impl BankSource for InMemorySource {
    fn load(&self) -> Result<Vec<Question>, DataSourceError> {
        Ok(self.questions.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory ({} questions)", self.questions.len())
    }
}

/// A JSON file holding an array of bank records.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl BankSource for JsonFileSource {
    fn load(&self) -> Result<Vec<Question>, DataSourceError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| DataSourceError::Io {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        let records: Vec<serde_json::Value> =
            serde_json::from_str(&raw).map_err(|e| DataSourceError::Parse(e.to_string()))?;
        if records.is_empty() {
            return Err(DataSourceError::Empty);
        }

        let mut questions = Vec::with_capacity(records.len());
        for (index, value) in records.into_iter().enumerate() {
            let converted = serde_json::from_value::<BankRecord>(value)
                .map_err(|e| e.to_string())
                .and_then(Question::try_from);
            match converted {
                Ok(q) => questions.push(q),
                Err(reason) => warn!(index, %reason, "skipping malformed bank record"),
            }
        }
        Ok(questions)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Immutable lookup index built once per successful load.
#[derive(Debug, Default)]
struct BankIndex {
    questions: Vec<Question>,
    /// (grade, canonical subject) -> positions in `questions`.
    by_grade_subject: HashMap<(String, String), Vec<usize>>,
}

impl BankIndex {
    fn build(raw: Vec<Question>) -> Self {
        let mut seen = HashSet::with_capacity(raw.len());
        let mut questions = Vec::with_capacity(raw.len());
        for mut q in raw {
            if let Err(reason) = q.check() {
                warn!(id = %q.id, %reason, "dropping question that breaks option invariants");
                continue;
            }
            if !seen.insert(q.id.clone()) {
                warn!(id = %q.id, "dropping duplicate question id");
                continue;
            }
            q.subject = canonical_subject(&q.subject);
            q.grade = normalize_grade(&q.grade);
            questions.push(q);
        }

        let mut by_grade_subject: HashMap<(String, String), Vec<usize>> = HashMap::new();
        for (pos, q) in questions.iter().enumerate() {
            by_grade_subject
                .entry((q.grade.clone(), q.subject.clone()))
                .or_default()
                .push(pos);
        }
        Self { questions, by_grade_subject }
    }

    fn matching<'a>(
        &'a self,
        grade: &str,
        subject: &str,
        difficulty: Option<Difficulty>,
    ) -> impl Iterator<Item = &'a Question> + 'a {
        let key = (normalize_grade(grade), canonical_subject(subject));
        self.by_grade_subject
            .get(&key)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&pos| &self.questions[pos])
            .filter(move |q| difficulty.map_or(true, |d| q.difficulty == d))
    }
}

pub struct QuestionBank {
    source: Box<dyn BankSource>,
    index: OnceLock<Arc<BankIndex>>,
    /// Serializes loads; holds the last load failure until a reload.
    load_state: Mutex<Option<DataSourceError>>,
}

impl std::fmt::Debug for QuestionBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionBank")
            .field("source", &self.source.describe())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl QuestionBank {
    pub fn new(source: impl BankSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            index: OnceLock::new(),
            load_state: Mutex::new(None),
        }
    }

    /// Convenience constructor for an already-materialized question list.
    pub fn from_questions(questions: Vec<Question>) -> Self {
        Self::new(InMemorySource::new(questions))
    }

    pub fn is_loaded(&self) -> bool {
        self.index.get().is_some()
    }

    fn ensure_loaded(&self) -> Result<Arc<BankIndex>, DataSourceError> {
        if let Some(index) = self.index.get() {
            return Ok(Arc::clone(index));
        }

        let mut state = self.load_state.lock().unwrap_or_else(|p| p.into_inner());
        // Another caller may have finished loading while we waited.
        if let Some(index) = self.index.get() {
            return Ok(Arc::clone(index));
        }
        if let Some(err) = state.as_ref() {
            return Err(err.clone());
        }

        match self.source.load() {
            Ok(raw) => {
                let index = Arc::new(BankIndex::build(raw));
                info!(
                    source = %self.source.describe(),
                    questions = index.questions.len(),
                    "question bank loaded"
                );
                let _ = self.index.set(Arc::clone(&index));
                Ok(index)
            }
            Err(err) => {
                warn!(source = %self.source.describe(), error = %err, "question bank failed to load");
                *state = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Load the bank now instead of on first lookup.
    pub fn preload(&self) -> Result<usize, DataSourceError> {
        self.ensure_loaded().map(|ix| ix.questions.len())
    }

    /// Forget a remembered load failure and try the source again.
    /// A bank that already loaded stays as it is.
    pub fn reload(&self) -> Result<usize, DataSourceError> {
        {
            let mut state = self.load_state.lock().unwrap_or_else(|p| p.into_inner());
            *state = None;
        }
        self.preload()
    }

    /// Questions for a grade and subject, optionally narrowed to one difficulty.
    /// Both grade and subject are normalized before comparison.
    pub fn lookup(
        &self,
        grade: &str,
        subject: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<Vec<Question>, DataSourceError> {
        let index = self.ensure_loaded()?;
        Ok(index.matching(grade, subject, difficulty).cloned().collect())
    }

    /// Number of questions `lookup` would return, without cloning them.
    pub fn count(
        &self,
        grade: &str,
        subject: &str,
        difficulty: Option<Difficulty>,
    ) -> Result<usize, DataSourceError> {
        let index = self.ensure_loaded()?;
        Ok(index.matching(grade, subject, difficulty).count())
    }

    /// Total number of questions after load-time filtering.
    pub fn len(&self) -> Result<usize, DataSourceError> {
        self.preload()
    }

    pub fn is_empty(&self) -> Result<bool, DataSourceError> {
        self.len().map(|n| n == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly_engine::test_support::question;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        loads: Arc<AtomicUsize>,
        fail_first: bool,
    }

    impl BankSource for CountingSource {
        fn load(&self) -> Result<Vec<Question>, DataSourceError> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && n == 0 {
                return Err(DataSourceError::Parse("truncated".into()));
            }
            Ok(vec![question("m1", "math", "5", Difficulty::Easy)])
        }

        fn describe(&self) -> String {
            "counting".into()
        }
    }

    #[test]
    fn lookup_canonicalizes_subject_on_both_sides() {
        let bank = QuestionBank::from_questions(vec![
            question("a", "Mathematics", "5", Difficulty::Easy),
            question("b", "maths", "5", Difficulty::Hard),
            question("c", "math", "6", Difficulty::Easy),
            question("d", "thinking_skills", "5", Difficulty::Medium),
        ]);
        assert_eq!(bank.lookup("5", "math", None).unwrap().len(), 2);
        assert_eq!(bank.lookup("5", "mathematics", Some(Difficulty::Hard)).unwrap().len(), 1);
        assert_eq!(bank.count("5", "mathematical-reasoning", None).unwrap(), 1);
        assert_eq!(bank.count(" 5 ", "MATH", None).unwrap(), 2);
    }

    #[test]
    fn load_happens_once_across_threads() {
        let loads = Arc::new(AtomicUsize::new(0));
        let bank = Arc::new(QuestionBank::new(CountingSource {
            loads: Arc::clone(&loads),
            fail_first: false,
        }));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let bank = Arc::clone(&bank);
                std::thread::spawn(move || bank.lookup("5", "math", None).unwrap().len())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 1);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_is_sticky_until_reload() {
        let loads = Arc::new(AtomicUsize::new(0));
        let bank = QuestionBank::new(CountingSource { loads: Arc::clone(&loads), fail_first: true });

        assert!(bank.lookup("5", "math", None).is_err());
        assert!(bank.count("5", "math", None).is_err());
        assert_eq!(loads.load(Ordering::SeqCst), 1, "failed load must not be retried implicitly");

        assert_eq!(bank.reload().unwrap(), 1);
        assert_eq!(bank.lookup("5", "math", None).unwrap().len(), 1);
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn duplicate_and_malformed_questions_are_dropped() {
        let mut broken = question("x", "math", "5", Difficulty::Easy);
        broken.correct_answer = "not an option".into();
        let bank = QuestionBank::from_questions(vec![
            question("a", "math", "5", Difficulty::Easy),
            question("a", "math", "5", Difficulty::Hard),
            broken,
        ]);
        let found = bank.lookup("5", "math", None).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].difficulty, Difficulty::Easy);
    }

    #[test]
    fn json_file_source_reads_loose_records() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"_id":"r1","content":"Q","options":["a","b"],"correctAnswer":"a","subject":"Reading","grade":4,"difficulty":"Easy"}},
                {{"_id":"r2","content":"Q","options":["a"],"correctAnswer":"a","subject":"Reading","grade":4,"difficulty":"Easy"}}
            ]"#
        )
        .unwrap();
        let bank = QuestionBank::new(JsonFileSource::new(file.path()));
        let found = bank.lookup("4", "reading", None).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "r1");
    }

    #[test]
    fn missing_or_empty_file_is_a_data_source_error() {
        let bank = QuestionBank::new(JsonFileSource::new("/nonexistent/bank.json"));
        assert!(matches!(bank.preload(), Err(DataSourceError::Io { .. })));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        let bank = QuestionBank::new(JsonFileSource::new(file.path()));
        assert_eq!(bank.preload(), Err(DataSourceError::Empty));
    }
}
