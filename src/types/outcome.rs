//! Inbound results and the outcome sum type.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use super::command::OperationCommand;
use super::table::Table;

/// Caller-facing rows rebuilt from provider payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OperationResult {
    id: u64,
    attribute_names: Vec<String>,
    contents: Table,
}

impl OperationResult {
    pub fn new(id: u64, attribute_names: Vec<String>, contents: Table) -> Self {
        Self {
            id,
            attribute_names,
            contents,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    pub fn contents(&self) -> &Table {
        &self.contents
    }
}

/// What an inbound operation hands back: either reconstructed data, or a
/// command asking the caller to contact a provider again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationOutcome {
    Command(OperationCommand),
    Response(OperationResult),
}

impl OperationOutcome {
    pub fn id(&self) -> u64 {
        match self {
            OperationOutcome::Command(command) => command.id(),
            OperationOutcome::Response(result) => result.id(),
        }
    }

    pub fn as_response(&self) -> Option<&OperationResult> {
        match self {
            OperationOutcome::Response(result) => Some(result),
            OperationOutcome::Command(_) => None,
        }
    }

    pub fn as_command(&self) -> Option<&OperationCommand> {
        match self {
            OperationOutcome::Command(command) => Some(command),
            OperationOutcome::Response(_) => None,
        }
    }
}

/// The caller-facing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    Get,
    GetResponse,
    Post,
    Put,
    Delete,
    Head,
}

impl OperationKind {
    /// Only name resolution may carry a wildcard in the attribute segment;
    /// everything that moves payloads or predicates must not.
    pub fn allows_leaf_wildcard(&self) -> bool {
        matches!(self, OperationKind::Head)
    }
}
