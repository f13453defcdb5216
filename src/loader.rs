use serde::Deserialize;
use tracing::debug;

use crate::error::MediatorError;
use crate::policy::{GovernedAttribute, SecurityPolicy};
use crate::qualify::qualify;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyDocument {
    providers: Vec<String>,
    #[serde(default)]
    default_provider: Option<String>,
    #[serde(default)]
    attributes: Vec<AttributeDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AttributeDocument {
    name: String,
    providers: Vec<String>,
    #[serde(default)]
    protected_as: Option<String>,
}

/// Load a JSON policy document into a `SecurityPolicy`.
///
/// Attribute names may be partial; they are qualified on load. JSON errors
/// map to `MediatorError::ParseError`, structural problems to
/// `InvalidPolicy`, `UnknownProvider`, or `MalformedName`.
///
/// Example:
/// ```rust
/// use mediator_core::load_policy;
/// let policy = load_policy(r#"{
///     "providers": ["csp1", "csp2"],
///     "attributes": [
///         { "name": "patient/pat_id", "providers": ["csp1"] },
///         { "name": "*/*/pat_name", "providers": ["csp2"], "protected_as": "*/*/name_enc" }
///     ]
/// }"#).unwrap();
/// assert_eq!(policy.governed_names()[0].as_str(), "*/patient/pat_id");
/// ```
pub fn load_policy(text: &str) -> Result<SecurityPolicy, MediatorError> {
    let document: PolicyDocument = serde_json::from_str(text)?;

    let attributes = document
        .attributes
        .into_iter()
        .map(|a| {
            let governed = GovernedAttribute::new(qualify(&a.name)?, a.providers);
            Ok(match a.protected_as {
                Some(template) => governed.with_protected_as(template),
                None => governed,
            })
        })
        .collect::<Result<Vec<_>, MediatorError>>()?;

    debug!(
        event = "Policy",
        phase = "Loaded",
        providers = document.providers.len(),
        attributes = attributes.len()
    );

    SecurityPolicy::new(
        document.providers,
        document.default_provider.as_deref(),
        attributes,
    )
}
