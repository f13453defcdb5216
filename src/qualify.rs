//! Qualification of partial attribute names.

use crate::error::MediatorError;
use crate::types::{AttributeName, SEPARATOR};

/// Left-pad a possibly partial name with wildcard segments.
///
/// ```text
/// attribute1              -> */*/attribute1
/// data/attribute2         -> */data/attribute2
/// dataset/data/attribute3 -> dataset/data/attribute3
/// ```
///
/// More than two separators, or an empty segment, is a `MalformedName`.
pub fn qualify(name: &str) -> Result<AttributeName, MediatorError> {
    let qualified = match name.matches(SEPARATOR).count() {
        0 => format!("*/*/{name}"),
        1 => format!("*/{name}"),
        2 => name.to_string(),
        _ => return Err(MediatorError::MalformedName(name.to_string())),
    };
    qualified
        .parse()
        .map_err(|_| MediatorError::MalformedName(name.to_string()))
}

/// [`qualify`] every name, keeping order. Stops at the first malformed one.
pub fn qualify_all<I, S>(names: I) -> Result<Vec<AttributeName>, MediatorError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(|n| qualify(n.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        bare = { "attribute1", "*/*/attribute1" },
        group = { "data/attribute2", "*/data/attribute2" },
        full = { "dataset/data/attribute3", "dataset/data/attribute3" },
        wildcard_leaf = { "*", "*/*/*" },
        wildcard_group = { "patient/*", "*/patient/*" },
    )]
    fn test_qualify(input: &str, expected: &str) {
        assert_eq!(qualify(input).unwrap().as_str(), expected);
    }

    #[parameterized(
        too_deep = { "csp/dataset/data/attribute" },
        empty = { "" },
        empty_leaf = { "data/" },
        empty_middle = { "dataset//attribute" },
    )]
    fn test_qualify_malformed(input: &str) {
        assert_eq!(
            qualify(input).unwrap_err(),
            MediatorError::MalformedName(input.to_string())
        );
    }

    #[test]
    fn test_qualify_all_keeps_order() {
        let names = qualify_all(["pat_id", "patient/pat_name", "pg/patient/pat_last1"]).unwrap();
        let names: Vec<&str> = names.iter().map(|n| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["*/*/pat_id", "*/patient/pat_name", "pg/patient/pat_last1"]
        );
    }

    #[test]
    fn test_qualify_all_fails_fast() {
        let err = qualify_all(["pat_id", "a/b/c/d", "x//y"]).unwrap_err();
        assert_eq!(err, MediatorError::MalformedName("a/b/c/d".to_string()));
    }
}
