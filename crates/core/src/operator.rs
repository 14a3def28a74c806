//! Operator vocabulary recognised by the builder.
//!
//! The backend declares, per attribute, which operator names are valid.
//! Those names are parsed into [`Operator`]; anything outside this closed
//! set is rejected when the attribute catalog is built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A condition operator.
///
/// Wire names are the snake_case spelling of each variant
/// (`GreaterThanOrEqual` ↔ `"greater_than_or_equal"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    // Presence
    IsEmpty,
    IsNotEmpty,
    IsSet,
    IsNotSet,
    // Boolean
    IsTrue,
    IsFalse,
    // Equality and text matching
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    // Numeric comparison, short and long spellings
    Gt,
    Gte,
    Lt,
    Lte,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    // Date
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
    // Array
    Count,
    AnyExpiryWithin,
    AnyExpiryInDays,
    AnyExpiryAfter,
    AnyExpiredSince,
}

impl Operator {
    pub const ALL: [Operator; 35] = [
        Operator::IsEmpty,
        Operator::IsNotEmpty,
        Operator::IsSet,
        Operator::IsNotSet,
        Operator::IsTrue,
        Operator::IsFalse,
        Operator::Equals,
        Operator::NotEquals,
        Operator::Contains,
        Operator::NotContains,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::GreaterThan,
        Operator::GreaterThanOrEqual,
        Operator::LessThan,
        Operator::LessThanOrEqual,
        Operator::Before,
        Operator::After,
        Operator::ExpiresWithin,
        Operator::ExpiredSince,
        Operator::ExpiresInDaysGt,
        Operator::ExpiresInDaysLt,
        Operator::ExpiresInDaysEq,
        Operator::DaysAgoGt,
        Operator::DaysAgoLt,
        Operator::DaysAgoEq,
        Operator::Count,
        Operator::AnyExpiryWithin,
        Operator::AnyExpiryInDays,
        Operator::AnyExpiryAfter,
        Operator::AnyExpiredSince,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
            Operator::IsSet => "is_set",
            Operator::IsNotSet => "is_not_set",
            Operator::IsTrue => "is_true",
            Operator::IsFalse => "is_false",
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::GreaterThan => "greater_than",
            Operator::GreaterThanOrEqual => "greater_than_or_equal",
            Operator::LessThan => "less_than",
            Operator::LessThanOrEqual => "less_than_or_equal",
            Operator::Before => "before",
            Operator::After => "after",
            Operator::ExpiresWithin => "expires_within",
            Operator::ExpiredSince => "expired_since",
            Operator::ExpiresInDaysGt => "expires_in_days_gt",
            Operator::ExpiresInDaysLt => "expires_in_days_lt",
            Operator::ExpiresInDaysEq => "expires_in_days_eq",
            Operator::DaysAgoGt => "days_ago_gt",
            Operator::DaysAgoLt => "days_ago_lt",
            Operator::DaysAgoEq => "days_ago_eq",
            Operator::Count => "count",
            Operator::AnyExpiryWithin => "any_expiry_within",
            Operator::AnyExpiryInDays => "any_expiry_in_days",
            Operator::AnyExpiryAfter => "any_expiry_after",
            Operator::AnyExpiredSince => "any_expired_since",
        }
    }

    /// Operators that never carry a value. Setting one of these on a
    /// condition clears whatever value it held.
    pub fn is_valueless(self) -> bool {
        matches!(
            self,
            Operator::IsEmpty
                | Operator::IsNotEmpty
                | Operator::IsSet
                | Operator::IsNotSet
                | Operator::IsTrue
                | Operator::IsFalse
        )
    }

    /// Date operators whose value is a number of days rather than a date.
    pub fn is_date_days(self) -> bool {
        matches!(
            self,
            Operator::ExpiresWithin
                | Operator::ExpiredSince
                | Operator::ExpiresInDaysGt
                | Operator::ExpiresInDaysLt
                | Operator::ExpiresInDaysEq
                | Operator::DaysAgoGt
                | Operator::DaysAgoLt
                | Operator::DaysAgoEq
        )
    }

    /// Array operators whose value is a number of days.
    pub fn is_array_days(self) -> bool {
        matches!(
            self,
            Operator::AnyExpiryWithin
                | Operator::AnyExpiryInDays
                | Operator::AnyExpiryAfter
                | Operator::AnyExpiredSince
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an operator name is not part of the recognised vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator: '{0}'")]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

// ──────────────────────────────────────────────
// CountOperator
// ──────────────────────────────────────────────

/// Relational sub-operator of an array `count` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountOperator {
    Equals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl CountOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            CountOperator::Equals => "equals",
            CountOperator::GreaterThan => "greater_than",
            CountOperator::GreaterThanOrEqual => "greater_than_or_equal",
            CountOperator::LessThan => "less_than",
            CountOperator::LessThanOrEqual => "less_than_or_equal",
        }
    }
}

impl fmt::Display for CountOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CountOperator {
    type Err = UnknownOperator;

    /// Accepts wire names plus the usual symbols and short forms
    /// (`=`, `>`, `>=`, `≥`, `<`, `<=`, `≤`, `eq`, `gt`, `gte`, `lt`, `lte`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" | "eq" | "=" | "==" => Ok(CountOperator::Equals),
            "greater_than" | "gt" | ">" => Ok(CountOperator::GreaterThan),
            "greater_than_or_equal" | "gte" | ">=" | "≥" => Ok(CountOperator::GreaterThanOrEqual),
            "less_than" | "lt" | "<" => Ok(CountOperator::LessThan),
            "less_than_or_equal" | "lte" | "<=" | "≤" => Ok(CountOperator::LessThanOrEqual),
            other => Err(UnknownOperator(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip_through_from_str() {
        for op in Operator::ALL {
            assert_eq!(op.as_str().parse::<Operator>(), Ok(op));
        }
    }

    #[test]
    fn wire_names_match_serde_spelling() {
        for op in Operator::ALL {
            let json = serde_json::to_value(op).unwrap();
            assert_eq!(json, serde_json::json!(op.as_str()));
        }
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let err = "matches_regex".parse::<Operator>().unwrap_err();
        assert_eq!(err, UnknownOperator("matches_regex".to_string()));
        assert_eq!(err.to_string(), "unknown operator: 'matches_regex'");
    }

    #[test]
    fn valueless_set() {
        assert!(Operator::IsEmpty.is_valueless());
        assert!(Operator::IsTrue.is_valueless());
        assert!(Operator::IsNotSet.is_valueless());
        assert!(!Operator::Equals.is_valueless());
        assert!(!Operator::Count.is_valueless());
    }

    #[test]
    fn days_operators_are_split_by_type_family() {
        assert!(Operator::ExpiresWithin.is_date_days());
        assert!(Operator::DaysAgoGt.is_date_days());
        assert!(!Operator::AnyExpiryWithin.is_date_days());
        assert!(Operator::AnyExpiredSince.is_array_days());
        assert!(!Operator::Before.is_array_days());
    }

    #[test]
    fn count_operator_accepts_symbols() {
        assert_eq!(">=".parse(), Ok(CountOperator::GreaterThanOrEqual));
        assert_eq!("≤".parse(), Ok(CountOperator::LessThanOrEqual));
        assert_eq!("eq".parse(), Ok(CountOperator::Equals));
        assert_eq!(
            "greater_than".parse::<CountOperator>(),
            Ok(CountOperator::GreaterThan)
        );
        assert!("between".parse::<CountOperator>().is_err());
    }
}
