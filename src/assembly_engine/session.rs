//! Open-ended practice sessions.
//!
//! Each session keeps a reserve of questions it has not served yet and the
//! set of ids it already delivered. `next_batch` serves from the reserve and
//! tops it up synchronously when it runs short; after serving, a reserve
//! below the low-water mark schedules a background top-up on the tokio
//! runtime, if one is running.
//!
//! A top-up happens in three steps so no partial state is ever visible:
//! seeds are reserved under the session lock, questions are generated into a
//! local buffer, and the buffer is committed under the lock in one step,
//! dropping any id the session already knows.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, warn};

use crate::assembly_engine::{
    bank::QuestionBank,
    config::SessionConfig,
    error::SessionError,
    fallback, filter,
    generator::{self, fresh_seed},
    models::{canonical_subject, normalize_grade, Difficulty, Question, Subject},
    shuffle::shuffle,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The fixed (subject, grade, difficulty) a session was opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFilter {
    /// Canonical bank subject.
    pub subject: String,
    pub grade: String,
    pub difficulty: Difficulty,
}

impl SessionFilter {
    pub fn new(subject: &str, grade: &str, difficulty: Difficulty) -> Self {
        Self {
            subject: canonical_subject(subject),
            grade: normalize_grade(grade),
            difficulty,
        }
    }
}

/// Seeds reserved for one top-up. Producing from a plan needs no lock.
#[derive(Debug, Clone)]
struct TopUpPlan {
    generator: Option<Subject>,
    filter: SessionFilter,
    first_seed: u64,
    count: usize,
}

impl TopUpPlan {
    fn produce(&self) -> Vec<Question> {
        (0..self.count as u64)
            .map(|i| self.generate_one(self.first_seed.wrapping_add(i)))
            .collect()
    }

    fn generate_one(&self, seed: u64) -> Question {
        let SessionFilter { subject, grade, difficulty } = &self.filter;
        if let Some(kind) = self.generator {
            match generator::generate(kind, grade, *difficulty, seed) {
                Ok(q) => return q,
                Err(err) => warn!(%err, "generator failed, using arithmetic fallback"),
            }
        }
        fallback::arithmetic(subject, grade, *difficulty, seed)
    }
}

#[derive(Debug)]
struct SessionPool {
    filter: SessionFilter,
    generator: Option<Subject>,
    excluded: HashSet<String>,
    delivered: HashSet<String>,
    reserve: VecDeque<Question>,
    /// Ids currently in `reserve`.
    reserved: HashSet<String>,
    next_seed: u64,
    replenishing: bool,
}

impl SessionPool {
    fn plan(&mut self, count: usize) -> TopUpPlan {
        let first_seed = self.next_seed;
        self.next_seed = self.next_seed.wrapping_add(count as u64);
        TopUpPlan {
            generator: self.generator,
            filter: self.filter.clone(),
            first_seed,
            count,
        }
    }

    /// Append `batch` to the reserve, skipping ids already delivered,
    /// reserved or excluded. Returns how many were added.
    fn commit(&mut self, batch: Vec<Question>) -> usize {
        let mut added = 0;
        for q in batch {
            if self.delivered.contains(&q.id) || self.reserved.contains(&q.id) || self.excluded.contains(&q.id) {
                continue;
            }
            self.reserved.insert(q.id.clone());
            self.reserve.push_back(q);
            added += 1;
        }
        added
    }

    /// Synchronous top-up until the reserve holds at least `target`.
    fn top_up(&mut self, target: usize, config: &SessionConfig) {
        let rounds = config.attempt_factor.max(1);
        for _ in 0..rounds {
            if self.reserve.len() >= target {
                return;
            }
            let need = (target - self.reserve.len()).max(config.replenish_batch);
            let plan = self.plan(need);
            self.commit(plan.produce());
        }
        if self.reserve.len() < target {
            warn!(
                subject = %self.filter.subject,
                reserve = self.reserve.len(),
                target,
                "reserve still short after top-up"
            );
        }
    }

    fn take(&mut self, count: usize) -> Vec<Question> {
        let mut out = Vec::with_capacity(count);
        while out.len() < count {
            let Some(q) = self.reserve.pop_front() else { break };
            self.reserved.remove(&q.id);
            if self.delivered.insert(q.id.clone()) {
                out.push(q);
            }
        }
        out
    }
}

type SharedPool = Arc<Mutex<SessionPool>>;

/// Clears `replenishing` when a background top-up ends, even by panic.
struct ReplenishGuard(SharedPool);

impl Drop for ReplenishGuard {
    fn drop(&mut self) {
        lock(&self.0).replenishing = false;
    }
}

/// Registry of live practice sessions backed by one shared bank.
///
/// Requests for one session are serialized by that session's mutex; the
/// registry lock is only held to look sessions up or insert them.
#[derive(Debug)]
pub struct SessionPoolMaintainer {
    bank: Arc<QuestionBank>,
    config: SessionConfig,
    sessions: Mutex<HashMap<String, SharedPool>>,
}

impl SessionPoolMaintainer {
    pub fn new(bank: Arc<QuestionBank>) -> Self {
        Self::with_config(bank, SessionConfig::default())
    }

    pub fn with_config(bank: Arc<QuestionBank>, config: SessionConfig) -> Self {
        Self { bank, config, sessions: Mutex::new(HashMap::new()) }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open a session whose reserve skips the learner's mastered ids. An
    /// already open session is left as it is.
    pub fn open_session(
        &self,
        session_id: &str,
        subject: &str,
        grade: &str,
        difficulty: Difficulty,
        excluded: &HashSet<String>,
    ) -> Result<(), SessionError> {
        self.session(session_id, SessionFilter::new(subject, grade, difficulty), subject, excluded)
            .map(|_| ())
    }

    /// Serve `count` questions this session has never delivered.
    ///
    /// The first call for an unknown id opens the session with the given
    /// filter. Later calls must repeat that filter; a different one is
    /// logged and ignored.
    pub fn next_batch(
        &self,
        session_id: &str,
        subject: &str,
        grade: &str,
        difficulty: Difficulty,
        count: usize,
    ) -> Result<Vec<Question>, SessionError> {
        let requested = SessionFilter::new(subject, grade, difficulty);
        let shared = self.session(session_id, requested.clone(), subject, &HashSet::new())?;

        let mut pool = lock(&shared);
        if pool.filter != requested {
            warn!(
                session = session_id,
                fixed = ?pool.filter,
                requested = ?requested,
                "ignoring filter change for an open session"
            );
        }
        if pool.reserve.len() < count {
            pool.top_up(count, &self.config);
        }
        let batch = pool.take(count);
        let low = pool.reserve.len() < self.config.low_water_mark;
        drop(pool);

        if low {
            self.schedule_background(session_id, &shared);
        }
        Ok(batch)
    }

    /// Top the reserve of an open session up to `minimum` right now.
    /// Returns the reserve size afterwards.
    pub fn ensure_minimum_reserve(&self, session_id: &str, minimum: usize) -> Result<usize, SessionError> {
        let shared = self
            .get(session_id)
            .ok_or_else(|| SessionError::UnknownSession(session_id.to_string()))?;
        let mut pool = lock(&shared);
        pool.top_up(minimum, &self.config);
        Ok(pool.reserve.len())
    }

    /// Drop a session. Returns whether it existed.
    pub fn close_session(&self, session_id: &str) -> bool {
        lock(&self.sessions).remove(session_id).is_some()
    }

    pub fn reserve_len(&self, session_id: &str) -> Option<usize> {
        self.get(session_id).map(|s| lock(&s).reserve.len())
    }

    pub fn delivered_count(&self, session_id: &str) -> Option<usize> {
        self.get(session_id).map(|s| lock(&s).delivered.len())
    }

    pub fn session_filter(&self, session_id: &str) -> Option<SessionFilter> {
        self.get(session_id).map(|s| lock(&s).filter.clone())
    }

    pub fn session_count(&self) -> usize {
        lock(&self.sessions).len()
    }

    fn get(&self, session_id: &str) -> Option<SharedPool> {
        lock(&self.sessions).get(session_id).cloned()
    }

    /// Look a session up, creating and seeding it from the bank if needed.
    /// The bank is read outside the registry lock.
    fn session(
        &self,
        session_id: &str,
        filter: SessionFilter,
        raw_subject: &str,
        excluded: &HashSet<String>,
    ) -> Result<SharedPool, SessionError> {
        if let Some(existing) = self.get(session_id) {
            return Ok(existing);
        }

        let generator = Subject::parse(raw_subject);
        if generator.is_none() {
            warn!(
                session = session_id,
                subject = raw_subject,
                "no generator for subject, shortfalls use arithmetic fallback"
            );
        }

        let next_seed = fresh_seed();
        let from_bank = filter::exclude(
            self.bank.lookup(&filter.grade, &filter.subject, Some(filter.difficulty))?,
            excluded,
        );
        let mut pool = SessionPool {
            filter,
            generator,
            excluded: excluded.clone(),
            delivered: HashSet::new(),
            reserve: VecDeque::new(),
            reserved: HashSet::new(),
            next_seed: next_seed.wrapping_add(1),
            replenishing: false,
        };
        let mut seeded = from_bank;
        shuffle(&mut seeded, &mut StdRng::seed_from_u64(next_seed));
        let added = pool.commit(seeded);
        debug!(session = session_id, from_bank = added, "opened practice session");

        let mut sessions = lock(&self.sessions);
        Ok(Arc::clone(
            sessions
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(pool))),
        ))
    }

    fn schedule_background(&self, session_id: &str, shared: &SharedPool) {
        if !self.config.background_replenish {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let plan = {
            let mut pool = lock(shared);
            if pool.replenishing || pool.reserve.len() >= self.config.low_water_mark {
                return;
            }
            pool.replenishing = true;
            pool.plan(self.config.replenish_batch)
        };

        let guard = ReplenishGuard(Arc::clone(shared));
        let session = session_id.to_string();
        handle.spawn_blocking(move || {
            let guard = guard;
            let batch = plan.produce();
            let mut pool = lock(&guard.0);
            let added = pool.commit(batch);
            debug!(%session, added, reserve = pool.reserve.len(), "background replenishment committed");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly_engine::test_support::questions;

    fn maintainer(bank: Vec<Question>) -> SessionPoolMaintainer {
        SessionPoolMaintainer::with_config(
            Arc::new(QuestionBank::from_questions(bank)),
            SessionConfig { background_replenish: false, ..SessionConfig::default() },
        )
    }

    #[test]
    fn bank_questions_are_served_before_generated_ones() {
        let m = maintainer(questions("b", 4, "math", "5", Difficulty::Easy));
        let batch = m.next_batch("s", "math", "5", Difficulty::Easy, 4).unwrap();
        assert!(batch.iter().all(|q| !q.is_generated));
        let next = m.next_batch("s", "math", "5", Difficulty::Easy, 4).unwrap();
        assert_eq!(next.len(), 4);
        assert!(next.iter().all(|q| q.is_generated && q.subject == "math" && q.grade == "5"));
    }

    #[test]
    fn exclusions_apply_to_the_initial_reserve() {
        let m = maintainer(questions("b", 4, "english", "3", Difficulty::Medium));
        let excluded: HashSet<String> = ["b0", "b1"].into_iter().map(String::from).collect();
        m.open_session("s", "english", "3", Difficulty::Medium, &excluded).unwrap();
        assert_eq!(m.reserve_len("s"), Some(2));
        let batch = m.next_batch("s", "english", "3", Difficulty::Medium, 5).unwrap();
        assert!(batch.iter().all(|q| !excluded.contains(&q.id)));
    }

    #[test]
    fn panicking_top_up_clears_the_replenishing_flag() {
        let m = maintainer(Vec::new());
        m.open_session("s", "math", "5", Difficulty::Easy, &HashSet::new()).unwrap();
        let shared = m.get("s").unwrap();
        lock(&shared).replenishing = true;
        let guard = ReplenishGuard(Arc::clone(&shared));
        let outcome = std::thread::spawn(move || {
            let _guard = guard;
            panic!("generator failed mid top-up");
        })
        .join();
        assert!(outcome.is_err());
        assert!(!lock(&shared).replenishing);
    }

    #[test]
    fn filter_change_is_ignored() {
        let m = maintainer(Vec::new());
        m.next_batch("s", "reading", "4", Difficulty::Easy, 2).unwrap();
        let batch = m.next_batch("s", "math", "9", Difficulty::Hard, 3).unwrap();
        assert!(batch.iter().all(|q| q.subject == "reading" && q.difficulty == Difficulty::Easy));
        assert_eq!(m.session_filter("s").unwrap().grade, "4");
    }

    #[test]
    fn unsupported_subject_falls_back_to_arithmetic() {
        let m = maintainer(Vec::new());
        let batch = m.next_batch("s", "geography", "6", Difficulty::Hard, 6).unwrap();
        assert_eq!(batch.len(), 6);
        assert!(batch.iter().all(|q| q.subject == "geography" && q.tags.contains("fallback")));
    }

    #[test]
    fn ensure_minimum_reserve_needs_an_open_session() {
        let m = maintainer(Vec::new());
        assert_eq!(
            m.ensure_minimum_reserve("ghost", 5),
            Err(SessionError::UnknownSession("ghost".into()))
        );
        m.open_session("s", "math", "5", Difficulty::Easy, &HashSet::new()).unwrap();
        assert!(m.ensure_minimum_reserve("s", 25).unwrap() >= 25);
    }

    #[test]
    fn closing_forgets_the_session() {
        let m = maintainer(Vec::new());
        m.next_batch("s", "math", "5", Difficulty::Easy, 1).unwrap();
        assert_eq!(m.session_count(), 1);
        assert!(m.close_session("s"));
        assert!(!m.close_session("s"));
        assert_eq!(m.delivered_count("s"), None);
    }

    #[test]
    fn sessions_do_not_share_delivered_sets() {
        let m = maintainer(questions("b", 3, "math", "5", Difficulty::Easy));
        let a = m.next_batch("a", "math", "5", Difficulty::Easy, 3).unwrap();
        let b = m.next_batch("b", "math", "5", Difficulty::Easy, 3).unwrap();
        assert!(a.iter().all(|q| !q.is_generated));
        assert!(b.iter().all(|q| !q.is_generated));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn low_reserve_triggers_background_replenishment() {
        let m = SessionPoolMaintainer::new(Arc::new(QuestionBank::from_questions(Vec::new())));
        let first = m.next_batch("s", "math", "5", Difficulty::Medium, 10).unwrap();
        assert_eq!(first.len(), 10);
        // The synchronous top-up left nothing over; the background one refills.
        let mut reserve = m.reserve_len("s").unwrap();
        for _ in 0..100 {
            if reserve >= m.config().low_water_mark {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            reserve = m.reserve_len("s").unwrap();
        }
        assert!(reserve >= m.config().low_water_mark, "reserve stayed at {reserve}");

        let second = m.next_batch("s", "math", "5", Difficulty::Medium, 10).unwrap();
        let ids: HashSet<_> = first.iter().chain(&second).map(|q| q.id.clone()).collect();
        assert_eq!(ids.len(), 20);
    }
}
