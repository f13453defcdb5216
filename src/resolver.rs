//! Wildcard resolution of requested names against governed names.

use serde::Serialize;
use tracing::debug;

use crate::candidates::build_candidates_with;
use crate::error::MediatorError;
use crate::pattern::{PatternCache, compile};
use crate::types::{AttributeName, SEPARATOR, WildcardShape};

/// What one requested name resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// The requested name, qualified.
    pub requested: AttributeName,
    /// Matching candidates in candidate order, or the requested name alone
    /// when nothing matched.
    pub names: Vec<AttributeName>,
}

/// Resolve `requested` against `governed`, flattened.
///
/// Names without wildcards come back untouched. A wildcarded name expands
/// to every candidate it matches; one that matches nothing is kept verbatim
/// in its own position. Repeats are never collapsed: downstream column
/// alignment depends on them.
///
/// ```rust
/// use mediator_core::{AttributeName, resolve};
/// let governed: Vec<AttributeName> = ["*/patient/pat_id", "*/patient/pat_name"]
///     .iter().map(|s| s.parse().unwrap()).collect();
/// let requested: Vec<AttributeName> = vec!["*/patient/*".parse().unwrap()];
/// let resolved = resolve(&requested, &governed).unwrap();
/// assert_eq!(resolved, governed);
/// ```
pub fn resolve(
    requested: &[AttributeName],
    governed: &[AttributeName],
) -> Result<Vec<AttributeName>, MediatorError> {
    Ok(resolve_expanded(requested, governed)?
        .into_iter()
        .flat_map(|r| r.names)
        .collect())
}

/// Like [`resolve`], grouped per requested name.
pub fn resolve_expanded(
    requested: &[AttributeName],
    governed: &[AttributeName],
) -> Result<Vec<Resolution>, MediatorError> {
    resolve_expanded_with(requested, governed, &mut PatternCache::new())
}

pub(crate) fn resolve_expanded_with(
    requested: &[AttributeName],
    governed: &[AttributeName],
    cache: &mut PatternCache,
) -> Result<Vec<Resolution>, MediatorError> {
    if !requested.iter().any(AttributeName::has_wildcard) {
        return Ok(requested
            .iter()
            .map(|r| Resolution {
                requested: r.clone(),
                names: vec![r.clone()],
            })
            .collect());
    }

    let candidates = build_candidates_with(requested, governed, cache)?;

    let mut resolutions = Vec::with_capacity(requested.len());
    for r in requested {
        let matcher = cache.matcher(r.as_str())?;
        let matches: Vec<AttributeName> = candidates
            .iter()
            .filter(|c| matcher.is_match(c.as_str()))
            .cloned()
            .collect();
        let names = if matches.is_empty() {
            debug!(
                event = "Resolve",
                phase = "Fallback",
                requested = r.as_str()
            );
            vec![r.clone()]
        } else {
            matches
        };
        resolutions.push(Resolution {
            requested: r.clone(),
            names,
        });
    }

    Ok(resolutions)
}

/// Concretize one governed name against one reference name.
///
/// `reference` must be fully qualified (exactly two separators); otherwise
/// `governed` comes back unchanged. A leading provider segment on
/// `governed` (`csp1/*/patient/pat_name`) is dropped first. Then:
///
/// - `*/*/leaf` takes the reference's collection and group, when its own
///   prefix pattern accepts them;
/// - `*/group/leaf` takes the reference's collection, when its
///   `*/group/` prefix accepts the reference's `collection/group/`;
/// - anything else is returned as is.
///
/// Never fails: a prefix pattern that does not compile accepts nothing.
///
/// ```rust
/// use mediator_core::resolve_one;
/// assert_eq!(resolve_one("*/*/pat_name", "postgres/patient/pat_id"), "postgres/patient/pat_name");
/// assert_eq!(resolve_one("*/episode/ep_pat", "postgres/patient/pat_id"), "*/episode/ep_pat");
/// ```
pub fn resolve_one(governed: &str, reference: &str) -> String {
    let Ok(reference) = reference.parse::<AttributeName>() else {
        return governed.to_string();
    };

    let unprefixed = strip_provider_prefix(governed);
    let Ok(name) = unprefixed.parse::<AttributeName>() else {
        return unprefixed.to_string();
    };

    let accepts = |name: &AttributeName| {
        compile(&name.group_prefix()).is_ok_and(|m| m.is_match(&reference.group_prefix()))
    };

    let resolved = match name.shape() {
        WildcardShape::LeadingCollectionAndGroup if accepts(&name) => {
            AttributeName::join(reference.collection(), reference.group(), name.attribute())
        }
        WildcardShape::LeadingCollection if accepts(&name) => {
            AttributeName::join(reference.collection(), name.group(), name.attribute())
        }
        _ => name,
    };

    resolved.into()
}

/// Fill the wildcard prefix of a `protected_as` template from a resolved
/// name. Unlike [`resolve_one`] there is no prefix gate: a template may
/// rename the group (`*/pt/name_enc`) and still takes the resolved
/// collection.
pub(crate) fn fill_template(template: &str, resolved: &AttributeName) -> String {
    let unprefixed = strip_provider_prefix(template);
    let Ok(name) = unprefixed.parse::<AttributeName>() else {
        return unprefixed.to_string();
    };

    let filled = match name.shape() {
        WildcardShape::LeadingCollectionAndGroup => {
            AttributeName::join(resolved.collection(), resolved.group(), name.attribute())
        }
        WildcardShape::LeadingCollection => {
            AttributeName::join(resolved.collection(), name.group(), name.attribute())
        }
        _ => name,
    };

    filled.into()
}

/// Drop the leading provider segment of a four-segment name.
pub(crate) fn strip_provider_prefix(name: &str) -> &str {
    match name.matches(SEPARATOR).count() {
        3 => name.split_once(SEPARATOR).map_or(name, |(_, rest)| rest),
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    const PATIENT: &[&str] = &[
        "*/patient/pat_id",
        "*/patient/pat_name",
        "*/patient/pat_last1",
        "*/patient/pat_last2",
    ];

    fn names(raw: &[&str]) -> Vec<AttributeName> {
        raw.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn resolve_strs(requested: &[&str], governed: &[&str]) -> Vec<String> {
        resolve(&names(requested), &names(governed))
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_group_wildcard_expands_in_governed_order() {
        assert_eq!(resolve_strs(&["*/patient/*"], PATIENT), PATIENT);
    }

    #[test]
    fn test_overlapping_requests_keep_duplicates() {
        let resolved = resolve_strs(
            &["*/patient/pat_name", "*/patient/*", "*/patient/pat_id"],
            PATIENT,
        );
        assert_eq!(
            resolved,
            vec![
                "*/patient/pat_name",
                "*/patient/pat_id",
                "*/patient/pat_name",
                "*/patient/pat_last1",
                "*/patient/pat_last2",
                "*/patient/pat_id",
            ]
        );
    }

    #[test]
    fn test_unmatched_wildcard_kept_in_position() {
        let resolved = resolve_strs(
            &["*/patient/pat_name", "*/episode/*", "*/patient/pat_id"],
            PATIENT,
        );
        assert_eq!(
            resolved,
            vec!["*/patient/pat_name", "*/episode/*", "*/patient/pat_id"]
        );
    }

    #[parameterized(
        concrete_governed = { &["pg/patient/pat_id", "mysql/x/y"], &["pg/patient/pat_id"] },
        wildcard_governed = { &["pg/patient/pat_id", "pg/episode/ep_id"], PATIENT },
        unknown = { &["a/b/c", "d/e/f", "a/b/c"], &[] },
    )]
    fn test_no_wildcard_is_identity(requested: &[&str], governed: &[&str]) {
        assert_eq!(resolve_strs(requested, governed), requested);
    }

    #[test]
    fn test_collection_wildcard_across_collections() {
        let resolved = resolve_strs(
            &["pg/patient/pat_id", "*/*/pat_name"],
            &["*/*/pat_name", "*/patient/pat_id"],
        );
        // `*/*/pat_name` also matches the candidate built from its own prefix.
        assert_eq!(
            resolved,
            vec!["pg/patient/pat_id", "pg/patient/pat_name", "*/*/pat_name"]
        );
    }

    #[test]
    fn test_resolve_expanded_groups_by_request() {
        let resolutions =
            resolve_expanded(&names(&["*/patient/pat_*", "*/episode/*"]), &names(PATIENT)).unwrap();
        assert_eq!(resolutions.len(), 2);
        assert_eq!(resolutions[0].names.len(), 4);
        assert_eq!(resolutions[1].names, names(&["*/episode/*"]));
        assert_eq!(resolutions[1].requested.as_str(), "*/episode/*");
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let requested = names(&["*/*/pat_name", "*/patient/*"]);
        let governed = names(PATIENT);
        assert_eq!(
            resolve(&requested, &governed).unwrap(),
            resolve(&requested, &governed).unwrap()
        );
    }

    #[parameterized(
        single = { "*/patient/pat_name", "postgres/patient/pat_id", "postgres/patient/pat_name" },
        double = { "*/*/pat_name", "postgres/patient/pat_id", "postgres/patient/pat_name" },
        other_group = { "*/episode/ep_pat", "postgres/patient/pat_id", "*/episode/ep_pat" },
        concrete = { "pg/patient/pat_name", "postgres/patient/pat_id", "pg/patient/pat_name" },
        provider_prefix = { "csp1/*/patient/pat_name", "postgres/patient/pat_id", "postgres/patient/pat_name" },
        provider_prefix_untouched = { "csp1/*/episode/ep_pat", "postgres/patient/pat_id", "*/episode/ep_pat" },
        unqualified_reference = { "*/patient/pat_name", "patient/pat_id", "*/patient/pat_name" },
        wildcard_reference = { "*/*/enc", "*/patient/pat_name", "*/patient/enc" },
        leaf_wildcard = { "*/patient/*", "postgres/patient/pat_id", "*/patient/*" },
    )]
    fn test_resolve_one(governed: &str, reference: &str, expected: &str) {
        assert_eq!(resolve_one(governed, reference), expected);
    }

    #[parameterized(
        renamed_group = { "*/pt/name_enc", "pg/patient/pat_name", "pg/pt/name_enc" },
        provider_renamed_group = { "csp2/*/pt/name_enc", "pg/patient/pat_name", "pg/pt/name_enc" },
        same_group = { "*/patient/name_enc", "pg/patient/pat_name", "pg/patient/name_enc" },
        both_prefixes = { "*/*/name_enc", "pg/patient/pat_name", "pg/patient/name_enc" },
        concrete = { "vault/secrets/name_enc", "pg/patient/pat_name", "vault/secrets/name_enc" },
    )]
    fn test_fill_template(template: &str, resolved: &str, expected: &str) {
        assert_eq!(fill_template(template, &resolved.parse().unwrap()), expected);
    }
}
