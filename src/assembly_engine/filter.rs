use std::collections::HashSet;

use crate::assembly_engine::models::Question;

/// Drop every candidate whose id is in `excluded`, keeping the original order.
pub fn exclude(candidates: Vec<Question>, excluded: &HashSet<String>) -> Vec<Question> {
    if excluded.is_empty() {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|q| !excluded.contains(&q.id))
        .collect()
}

/// Build the excluded-id set from a learner's history.
pub fn excluded_set<I, S>(ids: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter().map(Into::into).collect()
}
