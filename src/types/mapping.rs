//! Per-provider mapping from caller-facing names to protected names.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One `caller name -> protected name` association.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct MappingEntry {
    /// The name as the caller wrote it.
    pub attribute_name: String,
    /// The name the provider knows the attribute by.
    pub protected_name: String,
}

/// An ordered multimap scoped to a single provider.
///
/// A caller name may appear several times as a key: a wildcarded request
/// can expand to more than one protected name. Entries keep insertion
/// order, and inside an [`crate::OperationCommand`] entry `k` always
/// describes `protected_attribute_names[k]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Mapping {
    entries: Vec<MappingEntry>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, attribute_name: impl Into<String>, protected_name: impl Into<String>) {
        self.entries.push(MappingEntry {
            attribute_name: attribute_name.into(),
            protected_name: protected_name.into(),
        });
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Caller names, in entry order. Repeats are kept.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.attribute_name.as_str())
    }

    /// Protected names, in entry order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.protected_name.as_str())
    }

    /// First protected name mapped from `attribute_name`.
    pub fn get(&self, attribute_name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.attribute_name == attribute_name)
            .map(|e| e.protected_name.as_str())
    }

    /// Every protected name mapped from `attribute_name`.
    pub fn get_all<'a>(&'a self, attribute_name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.attribute_name == attribute_name)
            .map(|e| e.protected_name.as_str())
    }

    /// Index of the first entry keyed by `attribute_name`.
    pub fn position(&self, attribute_name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.attribute_name == attribute_name)
    }

    pub fn contains_key(&self, attribute_name: &str) -> bool {
        self.position(attribute_name).is_some()
    }
}

impl<'a> IntoIterator for &'a Mapping {
    type Item = &'a MappingEntry;
    type IntoIter = std::slice::Iter<'a, MappingEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
