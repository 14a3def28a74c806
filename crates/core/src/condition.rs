use serde::{Deserialize, Serialize};

use crate::operator::Operator;
use crate::value::ConditionValue;

/// One `(attribute, operator, value)` clause of a segment filter.
///
/// An empty `key` or a `None` operator means the clause is still being
/// filled in. On the wire an unset operator is the empty string and an
/// absent value is omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub key: String,
    #[serde(default, with = "operator_field")]
    pub operator: Option<Operator>,
    #[serde(default, skip_serializing_if = "ConditionValue::is_none")]
    pub value: ConditionValue,
}

impl Condition {
    pub fn new(key: impl Into<String>, operator: Operator, value: ConditionValue) -> Self {
        Condition {
            key: key.into(),
            operator: Some(operator),
            value,
        }
    }

    /// A clause is complete when it names an attribute and an operator, and
    /// either the operator is value-less or a non-empty value is present.
    pub fn is_complete(&self) -> bool {
        match self.operator {
            None => false,
            Some(_) if self.key.is_empty() => false,
            Some(op) if op.is_valueless() => true,
            Some(_) => !self.value.is_empty(),
        }
    }
}

mod operator_field {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::operator::Operator;

    pub fn serialize<S: Serializer>(op: &Option<Operator>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(op.map(Operator::as_str).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Operator>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(D::Error::custom)
    }
}
