//! Fully qualified `collection/group/attribute` names.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{Display as StrumDisplay, EnumString};
use utoipa::ToSchema;

use crate::error::MediatorError;

/// The wildcard token. A segment containing it matches any run of
/// characters within that segment.
pub const WILDCARD: char = '*';

/// The segment separator.
pub const SEPARATOR: char = '/';

static LEADING_COLLECTION_AND_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^/]*\*[^/]*/[^/]*\*[^/]*/[^/*]+$").expect("valid regex"));

static LEADING_COLLECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^/]*\*[^/]*/[^/*]+/[^/*]+$").expect("valid regex"));

/// Where the wildcards of a qualified name sit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum WildcardShape {
    /// No wildcard anywhere, e.g. `postgres/patient/pat_id`.
    Concrete,
    /// Collection and group are wildcards, the attribute is literal, e.g. `*/*/pat_id`.
    LeadingCollectionAndGroup,
    /// Only the collection is a wildcard, e.g. `*/patient/pat_id`.
    LeadingCollection,
    /// Any other placement, e.g. `*/patient/*` or `postgres/*/pat_id`.
    Other,
}

/// A qualified attribute name with exactly three non-empty segments.
///
/// Construct one with [`FromStr`] for names that are already qualified, or
/// with [`crate::qualify`] for names that may omit leading segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
pub struct AttributeName(String);

impl AttributeName {
    /// Join three segments that are known to be valid.
    pub(crate) fn join(collection: &str, group: &str, attribute: &str) -> Self {
        AttributeName(format!("{collection}/{group}/{attribute}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segments(&self) -> (&str, &str, &str) {
        let mut parts = self.0.splitn(3, SEPARATOR);
        let collection = parts.next().unwrap_or_default();
        let group = parts.next().unwrap_or_default();
        let attribute = parts.next().unwrap_or_default();
        (collection, group, attribute)
    }

    pub fn collection(&self) -> &str {
        self.segments().0
    }

    pub fn group(&self) -> &str {
        self.segments().1
    }

    pub fn attribute(&self) -> &str {
        self.segments().2
    }

    /// `collection/`, including the trailing separator.
    pub fn collection_prefix(&self) -> String {
        format!("{}/", self.collection())
    }

    /// `collection/group/`, including the trailing separator.
    pub fn group_prefix(&self) -> String {
        let (collection, group, _) = self.segments();
        format!("{collection}/{group}/")
    }

    pub fn has_wildcard(&self) -> bool {
        self.0.contains(WILDCARD)
    }

    /// True when the attribute (last) segment contains a wildcard.
    pub fn has_leaf_wildcard(&self) -> bool {
        self.attribute().contains(WILDCARD)
    }

    pub fn shape(&self) -> WildcardShape {
        if !self.has_wildcard() {
            WildcardShape::Concrete
        } else if LEADING_COLLECTION_AND_GROUP.is_match(&self.0) {
            WildcardShape::LeadingCollectionAndGroup
        } else if LEADING_COLLECTION.is_match(&self.0) {
            WildcardShape::LeadingCollection
        } else {
            WildcardShape::Other
        }
    }
}

impl Display for AttributeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AttributeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for AttributeName {
    type Err = MediatorError;

    /// Accepts only fully qualified names: `collection/group/attribute`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split(SEPARATOR).collect();
        if segments.len() != 3 || segments.iter().any(|segment| segment.is_empty()) {
            return Err(MediatorError::MalformedName(s.to_string()));
        }
        Ok(AttributeName(s.to_string()))
    }
}

impl From<AttributeName> for String {
    fn from(name: AttributeName) -> Self {
        name.0
    }
}

impl Serialize for AttributeName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AttributeName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
