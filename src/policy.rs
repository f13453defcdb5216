//! The security policy: providers and the attributes they govern.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::MediatorError;
use crate::pattern::PatternCache;
use crate::resolver::{fill_template, strip_provider_prefix};
use crate::types::AttributeName;

/// A governed attribute and the providers that hold it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GovernedAttribute {
    name: AttributeName,
    providers: Vec<String>,
    /// Template for the name the provider stores the attribute under, e.g.
    /// `*/*/pat_name_enc` or `csp2/*/patient/name_enc`. Wildcards are filled
    /// from the resolved caller name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    protected_as: Option<String>,
}

impl GovernedAttribute {
    pub fn new<I, S>(name: AttributeName, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name,
            providers: providers.into_iter().map(Into::into).collect(),
            protected_as: None,
        }
    }

    pub fn with_protected_as(mut self, template: impl Into<String>) -> Self {
        self.protected_as = Some(template.into());
        self
    }

    pub fn name(&self) -> &AttributeName {
        &self.name
    }

    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    pub fn protected_as(&self) -> Option<&str> {
        self.protected_as.as_deref()
    }

    /// The provider-side name for a resolved caller name. A template's
    /// leading wildcards take the resolved collection (and group).
    pub fn protected_name(&self, resolved: &AttributeName) -> String {
        match &self.protected_as {
            Some(template) => fill_template(template, resolved),
            None => resolved.to_string(),
        }
    }
}

/// Where a resolved name goes: a provider (by position) and the name that
/// provider knows it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Route {
    pub(crate) provider: usize,
    pub(crate) protected_name: String,
}

/// Providers in their fixed order, plus the governed attributes.
///
/// Names that no governed attribute covers are routed, unchanged, to the
/// default provider.
///
/// # Fields
///
/// * `providers` - Provider ids. Their order is the order of every
///   per-provider result.
/// * `default_provider` - Index of the provider receiving ungoverned names.
/// * `attributes` - Governed attributes in declaration order. When several
///   match one name, the first wins for each provider.
///
/// # Example
///
/// ```rust
/// use mediator_core::{GovernedAttribute, SecurityPolicy, qualify};
///
/// let policy = SecurityPolicy::new(
///     vec!["csp1".to_string(), "csp2".to_string()],
///     Some("csp2"),
///     vec![GovernedAttribute::new(qualify("patient/pat_id").unwrap(), ["csp1"])],
/// )
/// .unwrap();
/// assert_eq!(policy.default_provider(), "csp2");
/// assert_eq!(policy.governed_names_for("csp1")[0].as_str(), "*/patient/pat_id");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SecurityPolicy {
    providers: Vec<String>,
    default_provider: usize,
    attributes: Vec<GovernedAttribute>,
}

impl SecurityPolicy {
    /// Validate and build a policy. `default_provider` falls back to the
    /// first provider.
    pub fn new(
        providers: Vec<String>,
        default_provider: Option<&str>,
        attributes: Vec<GovernedAttribute>,
    ) -> Result<Self, MediatorError> {
        if providers.is_empty() {
            return Err(MediatorError::InvalidPolicy(
                "at least one provider is required".to_string(),
            ));
        }
        if let Some(duplicate) = providers.iter().duplicates().next() {
            return Err(MediatorError::InvalidPolicy(format!(
                "provider '{duplicate}' is declared twice"
            )));
        }

        let default_provider = match default_provider {
            Some(name) => providers
                .iter()
                .position(|p| p == name)
                .ok_or_else(|| MediatorError::UnknownProvider(name.to_string()))?,
            None => 0,
        };

        for attribute in &attributes {
            if attribute.providers.is_empty() {
                return Err(MediatorError::InvalidPolicy(format!(
                    "attribute '{}' has no provider",
                    attribute.name
                )));
            }
            if let Some(unknown) = attribute.providers.iter().find(|p| !providers.contains(*p)) {
                return Err(MediatorError::UnknownProvider(unknown.clone()));
            }
            if let Some(template) = &attribute.protected_as {
                validate_template(template)?;
            }
        }

        Ok(Self {
            providers,
            default_provider,
            attributes,
        })
    }

    pub fn providers(&self) -> &[String] {
        &self.providers
    }

    pub fn default_provider(&self) -> &str {
        &self.providers[self.default_provider]
    }

    pub fn attributes(&self) -> &[GovernedAttribute] {
        &self.attributes
    }

    pub fn provider_index(&self, provider: &str) -> Option<usize> {
        self.providers.iter().position(|p| p == provider)
    }

    /// The governed name set, in declaration order, without repeats.
    pub fn governed_names(&self) -> Vec<AttributeName> {
        self.attributes
            .iter()
            .map(|a| a.name.clone())
            .unique()
            .collect()
    }

    /// Governed names held by one provider.
    pub fn governed_names_for(&self, provider: &str) -> Vec<AttributeName> {
        self.attributes
            .iter()
            .filter(|a| a.providers.iter().any(|p| p == provider))
            .map(|a| a.name.clone())
            .unique()
            .collect()
    }

    /// Every provider governing `resolved`, in provider order. The first
    /// matching attribute wins for each provider. Empty when nothing
    /// governs the name.
    pub(crate) fn routes(
        &self,
        resolved: &AttributeName,
        cache: &mut PatternCache,
    ) -> Result<Vec<Route>, MediatorError> {
        let mut by_provider: Vec<Option<String>> = vec![None; self.providers.len()];
        for attribute in &self.attributes {
            if !cache.is_match(attribute.name.as_str(), resolved.as_str())? {
                continue;
            }
            for provider in &attribute.providers {
                let Some(index) = self.provider_index(provider) else {
                    continue;
                };
                if by_provider[index].is_none() {
                    by_provider[index] = Some(attribute.protected_name(resolved));
                }
            }
        }

        Ok(by_provider
            .into_iter()
            .enumerate()
            .filter_map(|(provider, protected_name)| {
                protected_name.map(|protected_name| Route {
                    provider,
                    protected_name,
                })
            })
            .collect())
    }

    /// Route for a name nobody governs.
    pub(crate) fn default_route(&self, resolved: &AttributeName) -> Route {
        Route {
            provider: self.default_provider,
            protected_name: resolved.to_string(),
        }
    }
}

/// A template is a qualified name, optionally behind one provider segment.
fn validate_template(template: &str) -> Result<(), MediatorError> {
    strip_provider_prefix(template)
        .parse::<AttributeName>()
        .map(|_| ())
        .map_err(|_| MediatorError::InvalidPolicy(format!("malformed protected_as '{template}'")))
}
