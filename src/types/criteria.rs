//! Search predicates carried alongside an operation.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};
use utoipa::ToSchema;

/// Comparison operator of a [`Criteria`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString, AsRefStr,
)]
pub enum Operator {
    #[strum(serialize = "=")]
    #[serde(rename = "=")]
    Eq,
    #[strum(to_string = "!=", serialize = "<>")]
    #[serde(rename = "!=")]
    Ne,
    #[strum(serialize = "<")]
    #[serde(rename = "<")]
    Lt,
    #[strum(serialize = "<=")]
    #[serde(rename = "<=")]
    Le,
    #[strum(serialize = ">")]
    #[serde(rename = ">")]
    Gt,
    #[strum(serialize = ">=")]
    #[serde(rename = ">=")]
    Ge,
    #[strum(serialize = "like", ascii_case_insensitive)]
    #[serde(rename = "like")]
    Like,
    #[strum(serialize = "in", ascii_case_insensitive)]
    #[serde(rename = "in")]
    In,
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_ref())
    }
}

/// A single predicate, e.g. `*/patient/pat_id = 42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Criteria {
    pub attribute_name: String,
    pub operator: Operator,
    pub value: String,
}

impl Criteria {
    pub fn new(
        attribute_name: impl Into<String>,
        operator: Operator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            operator,
            value: value.into(),
        }
    }

    /// The same predicate addressed to another attribute name.
    pub fn renamed(&self, attribute_name: impl Into<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            operator: self.operator,
            value: self.value.clone(),
        }
    }
}

impl Display for Criteria {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} {} {}", self.attribute_name, self.operator, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use yare::parameterized;

    #[parameterized(
        eq = { "=", Operator::Eq },
        ne = { "!=", Operator::Ne },
        ne_sql = { "<>", Operator::Ne },
        le = { "<=", Operator::Le },
        like_upper = { "LIKE", Operator::Like },
        in_lower = { "in", Operator::In },
    )]
    fn test_operator_from_str(raw: &str, expected: Operator) {
        assert_eq!(Operator::from_str(raw).unwrap(), expected);
    }

    #[test]
    fn test_operator_unknown() {
        assert!(Operator::from_str("~").is_err());
    }

    #[test]
    fn test_criteria_display() {
        let c = Criteria::new("*/patient/pat_id", Operator::Ge, "42");
        assert_eq!(c.to_string(), "*/patient/pat_id >= 42");
    }

    #[test]
    fn test_criteria_renamed_keeps_predicate() {
        let c = Criteria::new("*/patient/pat_id", Operator::Eq, "42");
        let renamed = c.renamed("csp1/patient/id_enc");
        assert_eq!(renamed.attribute_name, "csp1/patient/id_enc");
        assert_eq!(renamed.operator, Operator::Eq);
        assert_eq!(renamed.value, "42");
    }

    #[test]
    fn test_criteria_serialization() {
        let c = Criteria::new("*/patient/pat_id", Operator::Like, "a%");
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["operator"], "like");
        let back: Criteria = serde_json::from_value(json).unwrap();
        assert_eq!(back, c);
    }
}
