//! Quota-driven selection from a candidate pool.

use rand::Rng;

use crate::assembly_engine::{
    models::{Difficulty, DifficultyQuota, Question},
    shuffle::shuffle,
};

/// A set of questions that filled its quota completely.
pub type QuestionSet = Vec<Question>;

/// The bank could not fill a quota. Carries what it could select and how
/// many questions each difficulty is still missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    pub selected: Vec<Question>,
    pub missing: DifficultyQuota,
}

impl Shortfall {
    pub fn missing_total(&self) -> usize {
        self.missing.total()
    }
}

/// Select up to `quota[d]` questions of each difficulty `d`.
///
/// Each difficulty bucket is shuffled and truncated on its own; a thin bucket
/// never borrows from another. The combined selection is shuffled once more
/// so section order reveals nothing about difficulty.
pub fn select<R: Rng>(
    candidates: Vec<Question>,
    quota: &DifficultyQuota,
    rng: &mut R,
) -> Result<QuestionSet, Shortfall> {
    let mut buckets: [Vec<Question>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for q in candidates {
        let slot = match q.difficulty {
            Difficulty::Easy   => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard   => 2,
        };
        buckets[slot].push(q);
    }

    let mut selected = Vec::with_capacity(quota.total());
    let mut missing = DifficultyQuota::default();
    for (bucket, difficulty) in buckets.iter_mut().zip(Difficulty::ALL) {
        let want = quota.get(difficulty);
        shuffle(bucket, rng);
        bucket.truncate(want);
        missing.set(difficulty, want - bucket.len());
        selected.append(bucket);
    }
    shuffle(&mut selected, rng);

    if missing.total() == 0 {
        Ok(selected)
    } else {
        Err(Shortfall { selected, missing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly_engine::test_support::questions;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool(easy: usize, medium: usize, hard: usize) -> Vec<Question> {
        let mut all = questions("e", easy, "math", "5", Difficulty::Easy);
        all.extend(questions("m", medium, "math", "5", Difficulty::Medium));
        all.extend(questions("h", hard, "math", "5", Difficulty::Hard));
        all
    }

    fn count(qs: &[Question], d: Difficulty) -> usize {
        qs.iter().filter(|q| q.difficulty == d).count()
    }

    #[test]
    fn ample_supply_fills_quota_exactly() {
        let mut rng = StdRng::seed_from_u64(7);
        let quota = DifficultyQuota::new(3, 5, 2);
        let picked = select(pool(10, 10, 10), &quota, &mut rng).expect("full fill");
        assert_eq!(picked.len(), 10);
        assert_eq!(count(&picked, Difficulty::Easy), 3);
        assert_eq!(count(&picked, Difficulty::Medium), 5);
        assert_eq!(count(&picked, Difficulty::Hard), 2);
    }

    #[test]
    fn thin_bucket_reports_shortfall_without_borrowing() {
        let mut rng = StdRng::seed_from_u64(7);
        let quota = DifficultyQuota::new(3, 5, 2);
        let short = select(pool(2, 20, 0), &quota, &mut rng).unwrap_err();
        assert_eq!(short.selected.len(), 7);
        assert_eq!(count(&short.selected, Difficulty::Medium), 5);
        assert_eq!(short.missing, DifficultyQuota::new(1, 0, 2));
        assert_eq!(short.missing_total(), 3);
    }

    #[test]
    fn selection_is_deterministic_for_a_seed() {
        let quota = DifficultyQuota::new(2, 2, 2);
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            select(pool(6, 6, 6), &quota, &mut rng)
                .unwrap()
                .into_iter()
                .map(|q| q.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(3), run(3));
    }

    #[test]
    fn zero_quota_on_empty_pool_is_complete() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(select(vec![], &DifficultyQuota::default(), &mut rng), Ok(vec![]));
    }
}
