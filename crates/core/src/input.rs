//! Value input shape selection.
//!
//! Which kind of value a condition takes depends only on the attribute
//! type and the chosen operator. [`InputKind::select`] makes that choice;
//! [`InputKind::coerce`] and [`InputKind::parse`] turn user input into a
//! [`ConditionValue`] of the matching shape.

use std::fmt;

use crate::attribute::AttributeType;
use crate::operator::{CountOperator, Operator};
use crate::value::{parse_date, ConditionValue, Scalar};

/// The shape of value input a condition expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Value-less operator: no input at all.
    None,
    /// Non-negative whole number of days.
    Days,
    /// Relational sub-operator plus a non-negative count.
    CountComparison,
    /// Unset, true or false.
    TriState,
    /// One of the attribute's enum options.
    Select,
    /// Calendar date.
    DatePicker,
    /// Number; `integer` rejects fractions.
    Numeric { integer: bool },
    /// Free text.
    Text,
}

/// A raw value could not be turned into the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    #[error("{kind} input does not accept a {found} value")]
    NotAccepted {
        kind: &'static str,
        found: &'static str,
    },
    #[error("'{0}' is not a number")]
    InvalidNumber(String),
    #[error("'{0}' is not a whole number")]
    InvalidInteger(String),
    #[error("'{0}' is not a non-negative number of days")]
    InvalidDays(String),
    #[error("'{0}' is not a date (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("'{0}' is not true, false or unset")]
    InvalidBool(String),
    #[error("'{0}' is not a count comparison (expected e.g. 'greater_than_or_equal 3' or '>= 3')")]
    InvalidCount(String),
}

impl InputKind {
    /// Choose the input shape for an attribute type and operator.
    ///
    /// Value-less operators take no input. Without an operator the choice
    /// falls back to what the attribute type alone implies.
    pub fn select(kind: AttributeType, operator: Option<Operator>) -> InputKind {
        if operator.is_some_and(Operator::is_valueless) {
            return InputKind::None;
        }
        match kind {
            AttributeType::Array => match operator {
                Some(op) if op.is_array_days() => InputKind::Days,
                Some(Operator::Count) => InputKind::CountComparison,
                _ => InputKind::Text,
            },
            AttributeType::Boolean => InputKind::TriState,
            AttributeType::Enum => InputKind::Select,
            AttributeType::Date => match operator {
                Some(op) if op.is_date_days() => InputKind::Days,
                _ => InputKind::DatePicker,
            },
            AttributeType::Number => InputKind::Numeric { integer: false },
            AttributeType::Integer => InputKind::Numeric { integer: true },
            AttributeType::String => InputKind::Text,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            InputKind::None => "no",
            InputKind::Days => "days",
            InputKind::CountComparison => "count",
            InputKind::TriState => "true/false",
            InputKind::Select => "option",
            InputKind::DatePicker => "date",
            InputKind::Numeric { integer: true } => "integer",
            InputKind::Numeric { integer: false } => "number",
            InputKind::Text => "text",
        }
    }

    /// Check a value against this shape, normalising where the meaning is
    /// unambiguous (an empty string becomes `None`, a `"2024-01-31"` string
    /// becomes a date, `"12"` becomes a number, and so on).
    ///
    /// `ConditionValue::None` is accepted by every shape: it is how a value
    /// is cleared.
    pub fn coerce(self, value: ConditionValue) -> Result<ConditionValue, ValueError> {
        if value.is_empty() {
            return Ok(ConditionValue::None);
        }
        let not_accepted = |value: &ConditionValue| ValueError::NotAccepted {
            kind: self.name(),
            found: value.type_name(),
        };

        match (self, value) {
            (InputKind::None, other) => Err(not_accepted(&other)),

            (InputKind::Days, ConditionValue::Scalar(Scalar::Number(n))) => {
                if n.as_u64().is_some() {
                    Ok(ConditionValue::Scalar(Scalar::Number(n)))
                } else {
                    Err(ValueError::InvalidDays(n.to_string()))
                }
            }
            (InputKind::Days, ConditionValue::Scalar(Scalar::Text(s))) => s
                .trim()
                .parse::<u64>()
                .map(ConditionValue::number)
                .map_err(|_| ValueError::InvalidDays(s)),

            (InputKind::CountComparison, v @ ConditionValue::Count { .. }) => Ok(v),
            (InputKind::CountComparison, ConditionValue::Scalar(Scalar::Text(s))) => {
                parse_count(&s)
            }

            (InputKind::TriState, v @ ConditionValue::Scalar(Scalar::Bool(_))) => Ok(v),
            (InputKind::TriState, ConditionValue::Scalar(Scalar::Text(s))) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "yes" => Ok(ConditionValue::bool(true)),
                    "false" | "no" => Ok(ConditionValue::bool(false)),
                    "unset" | "-" => Ok(ConditionValue::None),
                    _ => Err(ValueError::InvalidBool(s)),
                }
            }

            (InputKind::Select, v @ ConditionValue::Scalar(Scalar::Text(_))) => Ok(v),

            (InputKind::DatePicker, v @ ConditionValue::Scalar(Scalar::Date(_))) => Ok(v),
            (InputKind::DatePicker, ConditionValue::Scalar(Scalar::Text(s))) => {
                parse_date(s.trim())
                    .map(ConditionValue::date)
                    .ok_or(ValueError::InvalidDate(s))
            }

            (InputKind::Numeric { integer }, ConditionValue::Scalar(Scalar::Number(n))) => {
                if integer && n.as_i64().is_none() && n.as_u64().is_none() {
                    Err(ValueError::InvalidInteger(n.to_string()))
                } else {
                    Ok(ConditionValue::Scalar(Scalar::Number(n)))
                }
            }
            (InputKind::Numeric { integer }, ConditionValue::Scalar(Scalar::Text(s))) => {
                parse_number(s.trim(), integer)
            }

            (InputKind::Text, v @ ConditionValue::Scalar(Scalar::Text(_))) => Ok(v),
            (InputKind::Text, ConditionValue::Scalar(Scalar::Number(n))) => {
                Ok(ConditionValue::text(n.to_string()))
            }

            (_, other) => Err(not_accepted(&other)),
        }
    }

    /// Parse raw user input (as typed in a prompt) into a value of this shape.
    pub fn parse(self, raw: &str) -> Result<ConditionValue, ValueError> {
        self.coerce(ConditionValue::text(raw.trim()))
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn parse_number(s: &str, integer: bool) -> Result<ConditionValue, ValueError> {
    if let Ok(i) = s.parse::<i64>() {
        return Ok(ConditionValue::number(i));
    }
    if integer {
        return Err(ValueError::InvalidInteger(s.to_string()));
    }
    s.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(|n| ConditionValue::Scalar(Scalar::Number(n)))
        .ok_or_else(|| ValueError::InvalidNumber(s.to_string()))
}

/// `"<sub-operator> <count>"`, e.g. `"greater_than_or_equal 3"` or `">= 3"`.
fn parse_count(s: &str) -> Result<ConditionValue, ValueError> {
    let invalid = || ValueError::InvalidCount(s.to_string());
    let mut parts = s.split_whitespace();
    let (Some(op), Some(count), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };
    let operator = op.parse::<CountOperator>().map_err(|_| invalid())?;
    let count = count.parse::<u64>().map_err(|_| invalid())?;
    Ok(ConditionValue::Count { operator, count })
}
