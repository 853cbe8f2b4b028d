//! List merging primitives used by the page aggregators.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{Drama, Source};

/// Identity used to collapse duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupKey {
    /// `(source, id)`: safe across sources that reuse ids.
    SourceAndId,
    /// Plain `id`, for lists that mix only sources with disjoint ids or a
    /// single source.
    Id,
}

/// Concatenate lists in the given order.
pub fn concat<I>(lists: I) -> Vec<Drama>
where
    I: IntoIterator<Item = Vec<Drama>>,
{
    lists.into_iter().flatten().collect()
}

/// Keep the first occurrence of every key, preserving order.
pub fn dedup(dramas: Vec<Drama>, key: DedupKey) -> Vec<Drama> {
    let mut seen: HashSet<(Option<Source>, String)> = HashSet::with_capacity(dramas.len());
    dramas
        .into_iter()
        .filter(|drama| {
            let (source, id) = drama.key();
            let source = match key {
                DedupKey::SourceAndId => Some(source),
                DedupKey::Id => None,
            };
            seen.insert((source, id.to_string()))
        })
        .collect()
}

/// Move `is_new` entries to the front; order within each group is kept.
pub fn prioritize_new(dramas: &mut [Drama]) {
    dramas.sort_by_key(|drama| !drama.is_new);
}

/// Random order for variety. Callers that need reproducible output pass a
/// seeded RNG.
pub fn shuffle<R: Rng + ?Sized>(dramas: &mut [Drama], rng: &mut R) {
    dramas.shuffle(rng);
}
