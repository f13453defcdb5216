//! Concrete governed names reachable from a request.
//!
//! A policy may govern `*/patient/pat_id` without knowing which collection a
//! caller addresses. Such entries only become concrete once combined with
//! the prefixes the request itself carries; prefixes that do not appear in
//! the request are never invented.

use itertools::Itertools;
use tracing::debug;

use crate::error::MediatorError;
use crate::pattern::PatternCache;
use crate::types::{AttributeName, WildcardShape};

/// Build the candidate set for `requested` against `governed`.
///
/// 1. concrete governed names, as-is;
/// 2. `*/*/leaf` entries, instantiated with each requested
///    `collection/group/` prefix their own prefix pattern accepts;
/// 3. `*/group/leaf` entries, instantiated with each requested
///    `collection/` prefix their own collection pattern accepts.
///
/// The union keeps first-seen order and drops duplicates.
pub fn build_candidates(
    requested: &[AttributeName],
    governed: &[AttributeName],
) -> Result<Vec<AttributeName>, MediatorError> {
    build_candidates_with(requested, governed, &mut PatternCache::new())
}

pub(crate) fn build_candidates_with(
    requested: &[AttributeName],
    governed: &[AttributeName],
    cache: &mut PatternCache,
) -> Result<Vec<AttributeName>, MediatorError> {
    let concrete = governed
        .iter()
        .filter(|g| g.shape() == WildcardShape::Concrete)
        .cloned();

    let mut from_group_prefixes = Vec::new();
    for g in governed
        .iter()
        .filter(|g| g.shape() == WildcardShape::LeadingCollectionAndGroup)
    {
        let matcher = cache.matcher(&g.group_prefix())?;
        for r in requested {
            if matcher.is_match(&r.group_prefix()) {
                from_group_prefixes.push(AttributeName::join(
                    r.collection(),
                    r.group(),
                    g.attribute(),
                ));
            }
        }
    }

    let mut from_collection_prefixes = Vec::new();
    for g in governed
        .iter()
        .filter(|g| g.shape() == WildcardShape::LeadingCollection)
    {
        let matcher = cache.matcher(&g.collection_prefix())?;
        for r in requested {
            if matcher.is_match(&r.collection_prefix()) {
                from_collection_prefixes.push(AttributeName::join(
                    r.collection(),
                    g.group(),
                    g.attribute(),
                ));
            }
        }
    }

    let candidates: Vec<AttributeName> = concrete
        .chain(from_group_prefixes)
        .chain(from_collection_prefixes)
        .unique()
        .collect();

    debug!(
        event = "Resolve",
        phase = "Candidates",
        requested = requested.len(),
        governed = governed.len(),
        candidates = candidates.len()
    );

    Ok(candidates)
}
