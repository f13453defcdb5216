//! Data model shared by the resolver and the operations.
//!
//! Canonical name form: `collection/group/attribute`, where any segment may
//! contain the `*` wildcard. Commands flow out to providers, outcomes flow
//! back to the caller.

mod attribute_name;
mod command;
mod criteria;
mod mapping;
mod outcome;
mod table;

pub use attribute_name::{AttributeName, SEPARATOR, WILDCARD, WildcardShape};
pub use command::{OperationCommand, OperationCommandBuilder};
pub use criteria::{Criteria, Operator};
pub use mapping::{Mapping, MappingEntry};
pub use outcome::{OperationKind, OperationOutcome, OperationResult};
pub use table::Table;
pub(crate) use table::{check_columns, project};
