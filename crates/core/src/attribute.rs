//! Server-declared attribute metadata.
//!
//! The backend publishes the attributes a segment can filter on, together
//! with the operator names valid for each. [`AttributeCatalog::from_wire`]
//! turns that document into typed [`AttributeSchema`]s, dropping anything
//! it does not recognise and reporting what it dropped as [`SchemaIssue`]s.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::input::InputKind;
use crate::operator::Operator;

// ──────────────────────────────────────────────
// AttributeType
// ──────────────────────────────────────────────

/// Type of a contact attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    Enum,
    Array,
}

impl AttributeType {
    pub fn as_str(self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Number => "number",
            AttributeType::Integer => "integer",
            AttributeType::Boolean => "boolean",
            AttributeType::Date => "date",
            AttributeType::Enum => "enum",
            AttributeType::Array => "array",
        }
    }

    /// Every operator this type can meaningfully carry. Operators the
    /// server declares outside this set are rejected.
    pub fn supported_operators(self) -> &'static [Operator] {
        use Operator::*;
        match self {
            AttributeType::String => &[
                Equals, NotEquals, Contains, NotContains, StartsWith, EndsWith, IsEmpty,
                IsNotEmpty, IsSet, IsNotSet,
            ],
            AttributeType::Number | AttributeType::Integer => &[
                Equals,
                NotEquals,
                Gt,
                Gte,
                Lt,
                Lte,
                GreaterThan,
                GreaterThanOrEqual,
                LessThan,
                LessThanOrEqual,
                IsEmpty,
                IsNotEmpty,
                IsSet,
                IsNotSet,
            ],
            AttributeType::Boolean => &[IsTrue, IsFalse, Equals, NotEquals, IsSet, IsNotSet],
            AttributeType::Date => &[
                Equals,
                Before,
                After,
                ExpiresWithin,
                ExpiredSince,
                ExpiresInDaysGt,
                ExpiresInDaysLt,
                ExpiresInDaysEq,
                DaysAgoGt,
                DaysAgoLt,
                DaysAgoEq,
                IsEmpty,
                IsNotEmpty,
                IsSet,
                IsNotSet,
            ],
            AttributeType::Enum => &[Equals, NotEquals, IsEmpty, IsNotEmpty, IsSet, IsNotSet],
            AttributeType::Array => &[
                Contains,
                NotContains,
                Count,
                AnyExpiryWithin,
                AnyExpiryInDays,
                AnyExpiryAfter,
                AnyExpiredSince,
                IsEmpty,
                IsNotEmpty,
            ],
        }
    }

    pub fn supports(self, op: Operator) -> bool {
        self.supported_operators().contains(&op)
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(AttributeType::String),
            "number" => Ok(AttributeType::Number),
            "integer" => Ok(AttributeType::Integer),
            "boolean" => Ok(AttributeType::Boolean),
            "date" => Ok(AttributeType::Date),
            "enum" => Ok(AttributeType::Enum),
            "array" => Ok(AttributeType::Array),
            other => Err(format!("unknown attribute type: '{}'", other)),
        }
    }
}

// ──────────────────────────────────────────────
// Wire document
// ──────────────────────────────────────────────

/// Response body of the attributes endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeList {
    pub attributes: Vec<WireAttribute>,
}

/// One attribute exactly as the backend sends it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireAttribute {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub options: Option<Vec<WireOption>>,
    #[serde(default)]
    pub conditions: Vec<String>,
}

/// Enum options come either as bare strings or as `{value, label}` objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireOption {
    Plain(String),
    Labelled {
        value: String,
        #[serde(default)]
        label: Option<String>,
    },
}

impl From<WireOption> for EnumOption {
    fn from(option: WireOption) -> Self {
        match option {
            WireOption::Plain(value) => EnumOption {
                label: value.clone(),
                value,
            },
            WireOption::Labelled { value, label } => EnumOption {
                label: label.unwrap_or_else(|| value.clone()),
                value,
            },
        }
    }
}

// ──────────────────────────────────────────────
// Typed schema
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumOption {
    pub value: String,
    pub label: String,
}

/// A validated attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeSchema {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: AttributeType,
    pub options: Vec<EnumOption>,
    /// Declared operators, in server order, restricted to those `kind` supports.
    pub operators: Vec<Operator>,
}

impl AttributeSchema {
    pub fn allows(&self, op: Operator) -> bool {
        self.operators.contains(&op)
    }

    pub fn input_kind(&self, op: Option<Operator>) -> InputKind {
        InputKind::select(self.kind, op)
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

/// Something in the attribute document that was skipped or looks wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaIssue {
    #[error("attribute with empty key skipped")]
    EmptyKey,
    #[error("attribute '{key}' skipped: unknown type '{kind}'")]
    UnknownType { key: String, kind: String },
    #[error("attribute '{key}' declared more than once; later declaration skipped")]
    DuplicateKey { key: String },
    #[error("attribute '{key}': unknown operator '{operator}' dropped")]
    UnknownOperator { key: String, operator: String },
    #[error("attribute '{key}': operator '{operator}' not valid for type {kind}, dropped")]
    UnsupportedOperator {
        key: String,
        operator: Operator,
        kind: AttributeType,
    },
    #[error("attribute '{key}' declares no usable operators")]
    NoOperators { key: String },
    #[error("enum attribute '{key}' declares no options")]
    MissingOptions { key: String },
}

/// The set of attributes a builder can reference, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributeCatalog {
    attributes: Vec<AttributeSchema>,
}

impl AttributeCatalog {
    /// Validate a wire document.
    ///
    /// Attributes with an empty key, an unknown type or a duplicate key are
    /// skipped. Operators that are unknown or not supported by the
    /// attribute's type are dropped. Each of these produces a
    /// [`SchemaIssue`]; none of them fails the load.
    pub fn from_wire(wire: Vec<WireAttribute>) -> (Self, Vec<SchemaIssue>) {
        let mut issues = Vec::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut attributes = Vec::with_capacity(wire.len());

        for raw in wire {
            if raw.key.is_empty() {
                issues.push(SchemaIssue::EmptyKey);
                continue;
            }
            let kind = match raw.kind.parse::<AttributeType>() {
                Ok(kind) => kind,
                Err(_) => {
                    issues.push(SchemaIssue::UnknownType {
                        key: raw.key,
                        kind: raw.kind,
                    });
                    continue;
                }
            };
            if !seen.insert(raw.key.clone()) {
                issues.push(SchemaIssue::DuplicateKey { key: raw.key });
                continue;
            }

            let mut operators = Vec::with_capacity(raw.conditions.len());
            for name in &raw.conditions {
                match name.parse::<Operator>() {
                    Ok(op) if !kind.supports(op) => {
                        issues.push(SchemaIssue::UnsupportedOperator {
                            key: raw.key.clone(),
                            operator: op,
                            kind,
                        });
                    }
                    Ok(op) => {
                        if !operators.contains(&op) {
                            operators.push(op);
                        }
                    }
                    Err(_) => issues.push(SchemaIssue::UnknownOperator {
                        key: raw.key.clone(),
                        operator: name.clone(),
                    }),
                }
            }
            if operators.is_empty() {
                issues.push(SchemaIssue::NoOperators {
                    key: raw.key.clone(),
                });
            }

            let options: Vec<EnumOption> = raw
                .options
                .unwrap_or_default()
                .into_iter()
                .map(EnumOption::from)
                .collect();
            if kind == AttributeType::Enum && options.is_empty() {
                issues.push(SchemaIssue::MissingOptions {
                    key: raw.key.clone(),
                });
            }

            attributes.push(AttributeSchema {
                label: raw.label.unwrap_or_else(|| raw.key.clone()),
                key: raw.key,
                kind,
                options,
                operators,
            });
        }

        (AttributeCatalog { attributes }, issues)
    }

    pub fn get(&self, key: &str) -> Option<&AttributeSchema> {
        self.attributes.iter().find(|a| a.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttributeSchema> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl FromIterator<AttributeSchema> for AttributeCatalog {
    fn from_iter<I: IntoIterator<Item = AttributeSchema>>(iter: I) -> Self {
        AttributeCatalog {
            attributes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(doc: serde_json::Value) -> Vec<WireAttribute> {
        serde_json::from_value::<AttributeList>(doc)
            .expect("valid attribute document")
            .attributes
    }

    #[test]
    fn parses_typed_attributes_in_server_order() {
        let (catalog, issues) = AttributeCatalog::from_wire(wire(json!({
            "attributes": [
                {"key": "balance", "label": "Balance", "type": "number", "conditions": ["gt", "lt", "equals"]},
                {"key": "is_vip", "label": "VIP", "type": "boolean", "conditions": ["is_true", "is_false"]},
            ]
        })));

        assert!(issues.is_empty(), "unexpected issues: {:?}", issues);
        let keys: Vec<&str> = catalog.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["balance", "is_vip"]);

        let balance = catalog.get("balance").unwrap();
        assert_eq!(balance.kind, AttributeType::Number);
        assert_eq!(
            balance.operators,
            vec![Operator::Gt, Operator::Lt, Operator::Equals]
        );
    }

    #[test]
    fn unknown_and_incompatible_operators_are_dropped() {
        let (catalog, issues) = AttributeCatalog::from_wire(wire(json!({
            "attributes": [
                {"key": "city", "type": "string", "conditions": ["equals", "fuzzy", "count"]},
            ]
        })));

        assert_eq!(catalog.get("city").unwrap().operators, vec![Operator::Equals]);
        assert_eq!(
            issues,
            vec![
                SchemaIssue::UnknownOperator {
                    key: "city".into(),
                    operator: "fuzzy".into()
                },
                SchemaIssue::UnsupportedOperator {
                    key: "city".into(),
                    operator: Operator::Count,
                    kind: AttributeType::String
                },
            ]
        );
    }

    #[test]
    fn unknown_type_and_duplicates_are_skipped() {
        let (catalog, issues) = AttributeCatalog::from_wire(wire(json!({
            "attributes": [
                {"key": "geo", "type": "polygon", "conditions": ["contains"]},
                {"key": "city", "type": "string", "conditions": ["equals"]},
                {"key": "city", "type": "number", "conditions": ["gt"]},
                {"key": "", "type": "string", "conditions": ["equals"]},
            ]
        })));

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("city").unwrap().kind, AttributeType::String);
        assert!(matches!(issues[0], SchemaIssue::UnknownType { .. }));
        assert!(matches!(issues[1], SchemaIssue::DuplicateKey { .. }));
        assert_eq!(issues[2], SchemaIssue::EmptyKey);
    }

    #[test]
    fn enum_options_accept_both_shapes() {
        let (catalog, issues) = AttributeCatalog::from_wire(wire(json!({
            "attributes": [
                {"key": "tier", "type": "enum", "conditions": ["equals"],
                 "options": ["gold", {"value": "silver", "label": "Silver tier"}, {"value": "bronze"}]},
            ]
        })));

        assert!(issues.is_empty());
        let tier = catalog.get("tier").unwrap();
        assert_eq!(
            tier.options,
            vec![
                EnumOption { value: "gold".into(), label: "gold".into() },
                EnumOption { value: "silver".into(), label: "Silver tier".into() },
                EnumOption { value: "bronze".into(), label: "bronze".into() },
            ]
        );
        assert!(tier.has_option("silver"));
        assert!(!tier.has_option("platinum"));
    }

    #[test]
    fn enum_without_options_and_attribute_without_operators_are_reported() {
        let (catalog, issues) = AttributeCatalog::from_wire(wire(json!({
            "attributes": [
                {"key": "tier", "type": "enum", "conditions": []},
            ]
        })));

        assert_eq!(catalog.len(), 1);
        assert_eq!(
            issues,
            vec![
                SchemaIssue::NoOperators { key: "tier".into() },
                SchemaIssue::MissingOptions { key: "tier".into() },
            ]
        );
    }

    #[test]
    fn label_defaults_to_key() {
        let (catalog, _) = AttributeCatalog::from_wire(wire(json!({
            "attributes": [{"key": "email", "type": "string", "conditions": ["contains"]}]
        })));
        assert_eq!(catalog.get("email").unwrap().label, "email");
    }
}
