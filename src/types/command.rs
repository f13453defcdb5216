//! The per-provider unit of work produced by an outbound operation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::criteria::Criteria;
use super::mapping::Mapping;
use super::table::Table;

/// Everything a transport layer needs to build one provider call.
///
/// Exactly one command exists per configured provider for every outbound
/// operation. A provider that takes no part in the operation still gets a
/// command, with empty protected names, mapping, and criteria, and a
/// zero-row payload.
///
/// Commands are immutable once built; use [`OperationCommand::builder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OperationCommand {
    id: u64,
    provider: String,
    attribute_names: Vec<String>,
    protected_attribute_names: Vec<String>,
    mapping: Mapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    protected_contents: Option<Table>,
    #[serde(default)]
    criteria: Vec<Criteria>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    extra_protected_attribute_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extra_binary_content: Option<Vec<u8>>,
}

impl OperationCommand {
    /// Start a command for `provider`. `attribute_names` are the caller's
    /// names, verbatim and in request order.
    pub fn builder<I, S>(id: u64, provider: impl Into<String>, attribute_names: I) -> OperationCommandBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OperationCommandBuilder {
            command: OperationCommand {
                id,
                provider: provider.into(),
                attribute_names: attribute_names.into_iter().map(Into::into).collect(),
                protected_attribute_names: Vec::new(),
                mapping: Mapping::new(),
                protected_contents: None,
                criteria: Vec::new(),
                extra_protected_attribute_names: Vec::new(),
                extra_binary_content: None,
            },
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    pub fn protected_attribute_names(&self) -> &[String] {
        &self.protected_attribute_names
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn protected_contents(&self) -> Option<&Table> {
        self.protected_contents.as_ref()
    }

    pub fn criteria(&self) -> &[Criteria] {
        &self.criteria
    }

    pub fn extra_protected_attribute_names(&self) -> &[String] {
        &self.extra_protected_attribute_names
    }

    pub fn extra_binary_content(&self) -> Option<&[u8]> {
        self.extra_binary_content.as_deref()
    }

    /// True when the provider has anything to do for this command.
    pub fn is_involved(&self) -> bool {
        !self.protected_attribute_names.is_empty() || !self.criteria.is_empty()
    }

    /// A copy of this command under a new id, used to ask a provider again.
    pub fn reissue(&self, id: u64) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }
}

/// Builds an [`OperationCommand`]; every protected name is added together
/// with its mapping entry so the two stay aligned.
#[derive(Debug, Clone)]
pub struct OperationCommandBuilder {
    command: OperationCommand,
}

impl OperationCommandBuilder {
    /// Record that the caller's `attribute_name` is stored by this provider
    /// as `protected_name`.
    pub fn protect(mut self, attribute_name: impl Into<String>, protected_name: impl Into<String>) -> Self {
        let protected_name = protected_name.into();
        self.command.mapping.push(attribute_name, protected_name.clone());
        self.command.protected_attribute_names.push(protected_name);
        self
    }

    pub fn criterion(mut self, criteria: Criteria) -> Self {
        self.command.criteria.push(criteria);
        self
    }

    /// Payload whose columns follow the protected names.
    pub fn contents(mut self, contents: Table) -> Self {
        self.command.protected_contents = Some(contents);
        self
    }

    /// Opaque binary payload and the names it carries.
    pub fn extra_binary<I, S>(mut self, names: I, content: Vec<u8>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command.extra_protected_attribute_names = names.into_iter().map(Into::into).collect();
        self.command.extra_binary_content = Some(content);
        self
    }

    pub fn build(self) -> OperationCommand {
        self.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Operator;

    #[test]
    fn test_builder_keeps_mapping_aligned() {
        let command = OperationCommand::builder(7, "csp1", ["*/*/pat_name", "*/patient/pat_id"])
            .protect("*/*/pat_name", "a/patient/pat_name")
            .protect("*/*/pat_name", "b/patient/pat_name")
            .protect("*/patient/pat_id", "*/patient/pat_id")
            .build();

        assert_eq!(command.id(), 7);
        assert_eq!(command.provider(), "csp1");
        assert_eq!(command.attribute_names().len(), 2);
        assert_eq!(command.protected_attribute_names().len(), command.mapping().len());
        for (k, value) in command.mapping().values().enumerate() {
            assert_eq!(command.protected_attribute_names()[k], value);
        }
        assert!(command.is_involved());
    }

    #[test]
    fn test_uninvolved_command() {
        let command = OperationCommand::builder(1, "csp2", ["*/patient/pat_id"])
            .contents(Table::new())
            .build();
        assert!(!command.is_involved());
        assert!(command.mapping().is_empty());
        assert_eq!(command.protected_contents().map(|t| t.len()), Some(0));
    }

    #[test]
    fn test_criteria_only_is_involved() {
        let command = OperationCommand::builder(1, "csp2", ["*/patient/pat_id"])
            .criterion(Criteria::new("*/patient/pat_id", Operator::Eq, "1"))
            .build();
        assert!(command.is_involved());
        assert!(command.protected_attribute_names().is_empty());
    }

    #[test]
    fn test_extra_binary() {
        let command = OperationCommand::builder(1, "csp1", Vec::<String>::new())
            .extra_binary(["*/scan/blob"], vec![1, 2, 3])
            .build();
        assert_eq!(command.extra_binary_content(), Some(&[1u8, 2, 3][..]));
        assert_eq!(command.extra_protected_attribute_names(), &["*/scan/blob".to_string()]);
    }

    #[test]
    fn test_reissue_changes_only_id() {
        let command = OperationCommand::builder(1, "csp1", ["x/y/z"])
            .protect("x/y/z", "x/y/z")
            .build();
        let again = command.reissue(9);
        assert_eq!(again.id(), 9);
        assert_eq!(again.mapping(), command.mapping());
        assert_eq!(again.attribute_names(), command.attribute_names());
    }

    #[test]
    fn test_serialization_skips_absent_payloads() {
        let command = OperationCommand::builder(3, "csp1", ["x/y/z"])
            .protect("x/y/z", "x/y/z")
            .build();
        let json = serde_json::to_value(&command).unwrap();
        assert!(json.get("protected_contents").is_none());
        assert!(json.get("extra_binary_content").is_none());
        let back: OperationCommand = serde_json::from_value(json).unwrap();
        assert_eq!(back, command);
    }
}
