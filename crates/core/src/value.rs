//! Condition values.
//!
//! The wire format lets `value` be absent, a string, a number, a boolean or
//! a `{operator, count}` object. [`ConditionValue`] gives each shape its own
//! variant; the input shape a condition expects is decided by
//! [`InputKind`](crate::InputKind).

use std::fmt;

use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::macros::format_description;
use time::Date;

use crate::operator::CountOperator;

/// A single scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    /// Calendar date, serialized as `YYYY-MM-DD`.
    Date(Date),
}

impl Scalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Text(_) => "text",
            Scalar::Number(_) => "number",
            Scalar::Bool(_) => "boolean",
            Scalar::Date(_) => "date",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => write!(f, "{:?}", s),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Date(d) => write!(f, "{}", format_date(*d)),
        }
    }
}

/// The value side of a condition.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConditionValue {
    /// No value: unary operators, or not filled in yet.
    #[default]
    None,
    Scalar(Scalar),
    /// Cardinality test over an array attribute.
    Count {
        operator: CountOperator,
        count: u64,
    },
}

impl ConditionValue {
    pub fn text(s: impl Into<String>) -> Self {
        ConditionValue::Scalar(Scalar::Text(s.into()))
    }

    pub fn number(n: impl Into<serde_json::Number>) -> Self {
        ConditionValue::Scalar(Scalar::Number(n.into()))
    }

    pub fn bool(b: bool) -> Self {
        ConditionValue::Scalar(Scalar::Bool(b))
    }

    pub fn date(d: Date) -> Self {
        ConditionValue::Scalar(Scalar::Date(d))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ConditionValue::None)
    }

    /// True when the value is absent or an empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            ConditionValue::None => true,
            ConditionValue::Scalar(Scalar::Text(s)) => s.is_empty(),
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ConditionValue::None => "nothing",
            ConditionValue::Scalar(s) => s.type_name(),
            ConditionValue::Count { .. } => "count",
        }
    }

    /// Build a value from its JSON wire form.
    pub fn from_json(value: serde_json::Value) -> Result<Self, String> {
        match value {
            serde_json::Value::Null => Ok(ConditionValue::None),
            serde_json::Value::Bool(b) => Ok(ConditionValue::bool(b)),
            serde_json::Value::Number(n) => Ok(ConditionValue::Scalar(Scalar::Number(n))),
            serde_json::Value::String(s) => Ok(ConditionValue::text(s)),
            serde_json::Value::Object(map) => {
                let operator = map
                    .get("operator")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| "count value requires a string 'operator'".to_string())?;
                let operator = operator.parse::<CountOperator>().map_err(|e| e.to_string())?;
                let count = map
                    .get("count")
                    .and_then(|v| v.as_u64())
                    .ok_or_else(|| "count value requires a non-negative integer 'count'".to_string())?;
                Ok(ConditionValue::Count { operator, count })
            }
            serde_json::Value::Array(_) => Err("array values are not supported".to_string()),
        }
    }
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionValue::None => f.write_str("-"),
            ConditionValue::Scalar(s) => write!(f, "{}", s),
            ConditionValue::Count { operator, count } => write!(f, "{} {}", operator, count),
        }
    }
}

impl Serialize for ConditionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConditionValue::None => serializer.serialize_none(),
            ConditionValue::Scalar(Scalar::Text(s)) => serializer.serialize_str(s),
            ConditionValue::Scalar(Scalar::Number(n)) => n.serialize(serializer),
            ConditionValue::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            ConditionValue::Scalar(Scalar::Date(d)) => serializer.serialize_str(&format_date(*d)),
            ConditionValue::Count { operator, count } => {
                let mut state = serializer.serialize_struct("CountValue", 2)?;
                state.serialize_field("operator", operator)?;
                state.serialize_field("count", count)?;
                state.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ConditionValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        ConditionValue::from_json(raw).map_err(D::Error::custom)
    }
}

// ──────────────────────────────────────────────
// Dates
// ──────────────────────────────────────────────

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Option<Date> {
    Date::parse(s, format_description!("[year]-[month]-[day]")).ok()
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(d: Date) -> String {
    d.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| d.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    #[test]
    fn empty_means_absent_or_blank_text() {
        assert!(ConditionValue::None.is_empty());
        assert!(ConditionValue::text("").is_empty());
        assert!(!ConditionValue::text("x").is_empty());
        assert!(!ConditionValue::number(0).is_empty());
        assert!(!ConditionValue::bool(false).is_empty());
    }

    #[test]
    fn count_serializes_as_object() {
        let v = ConditionValue::Count {
            operator: CountOperator::GreaterThanOrEqual,
            count: 3,
        };
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!({"operator": "greater_than_or_equal", "count": 3})
        );
    }

    #[test]
    fn date_serializes_as_iso_day() {
        let v = ConditionValue::date(date!(2024 - 03 - 07));
        assert_eq!(serde_json::to_value(&v).unwrap(), json!("2024-03-07"));
    }

    #[test]
    fn deserialize_picks_variant_from_json_shape() {
        let v: ConditionValue = serde_json::from_value(json!(100)).unwrap();
        assert_eq!(v, ConditionValue::number(100));

        let v: ConditionValue = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(v, ConditionValue::bool(true));

        let v: ConditionValue = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(v, ConditionValue::None);

        let v: ConditionValue =
            serde_json::from_value(json!({"operator": "less_than", "count": 2})).unwrap();
        assert_eq!(
            v,
            ConditionValue::Count {
                operator: CountOperator::LessThan,
                count: 2
            }
        );
    }

    #[test]
    fn malformed_count_is_rejected() {
        let err = serde_json::from_value::<ConditionValue>(json!({"operator": "less_than"}))
            .unwrap_err();
        assert!(err.to_string().contains("count"));

        assert!(serde_json::from_value::<ConditionValue>(json!([1, 2])).is_err());
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert_eq!(parse_date("2024-02-29"), Some(date!(2024 - 02 - 29)));
        assert_eq!(parse_date("2023-02-29"), None);
        assert_eq!(parse_date("yesterday"), None);
    }
}
