// src/lib.rs
pub use candidates::build_candidates;
pub use error::MediatorError;
pub use loader::load_policy;
pub use operations::DataOperations;
pub use pattern::{Matcher, PatternCache, compile};
pub use policy::{GovernedAttribute, SecurityPolicy};
pub use qualify::{qualify, qualify_all};
pub use resolver::{Resolution, resolve, resolve_expanded, resolve_one};
pub use types::{
    AttributeName, Criteria, Mapping, MappingEntry, OperationCommand, OperationCommandBuilder,
    OperationKind, OperationOutcome, OperationResult, Operator, SEPARATOR, Table, WILDCARD,
    WildcardShape,
};

pub mod metrics;

mod candidates;
mod error;
mod loader;
mod operations;
mod pattern;
mod policy;
mod qualify;
mod resolver;
mod timers;
mod types;
