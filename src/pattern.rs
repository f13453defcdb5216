//! Wildcard name patterns compiled to anchored regular expressions.

use std::collections::HashMap;

use itertools::Itertools;
use regex::Regex;

use crate::error::MediatorError;
use crate::types::WILDCARD;

/// What a single `*` matches: anything inside one segment.
const SEGMENT_WILDCARD: &str = "[^/]*";

/// A compiled name pattern. Matching is whole-string.
#[derive(Debug, Clone)]
pub struct Matcher {
    source: String,
    regex: Regex,
}

impl Matcher {
    /// The pattern this matcher was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Compile `pattern`: literal text is escaped, every `*` matches within a
/// single segment and never crosses a `/`.
///
/// ```rust
/// use mediator_core::compile;
/// let m = compile("*/patient/pat_*").unwrap();
/// assert!(m.is_match("postgres/patient/pat_id"));
/// assert!(!m.is_match("postgres/patient/episode/pat_id"));
/// ```
pub fn compile(pattern: &str) -> Result<Matcher, MediatorError> {
    let body = pattern.split(WILDCARD).map(regex::escape).join(SEGMENT_WILDCARD);
    let regex = Regex::new(&format!("^{body}$"))
        .map_err(|_| MediatorError::MalformedName(pattern.to_string()))?;
    Ok(Matcher {
        source: pattern.to_string(),
        regex,
    })
}

/// Matchers keyed by their source string. Lives for one resolution pass.
#[derive(Debug, Default)]
pub struct PatternCache {
    matchers: HashMap<String, Matcher>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matcher(&mut self, pattern: &str) -> Result<&Matcher, MediatorError> {
        if !self.matchers.contains_key(pattern) {
            let matcher = compile(pattern)?;
            self.matchers.insert(pattern.to_string(), matcher);
        }
        Ok(&self.matchers[pattern])
    }

    pub fn is_match(&mut self, pattern: &str, name: &str) -> Result<bool, MediatorError> {
        Ok(self.matcher(pattern)?.is_match(name))
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}
