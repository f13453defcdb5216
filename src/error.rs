use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum MediatorError {
    #[error("malformed attribute name: '{0}' (expected collection/group/attribute)")]
    MalformedName(String),

    #[error("wildcard not supported in attribute segment: '{0}'")]
    UnsupportedLeafWildcard(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("failed to parse policy: {0}")]
    ParseError(String),

    #[error("Poisoned lock error: {0}")]
    PoisonedLockError(String),
}

impl From<serde_json::Error> for MediatorError {
    fn from(err: serde_json::Error) -> Self {
        MediatorError::ParseError(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for MediatorError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        MediatorError::PoisonedLockError(err.to_string())
    }
}
