use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;

/// How the conditions of a filter combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::And => f.write_str("AND"),
            Logic::Or => f.write_str("OR"),
        }
    }
}

impl FromStr for Logic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Ok(Logic::And),
            "OR" => Ok(Logic::Or),
            _ => Err(format!("logic must be AND or OR, got '{}'", s)),
        }
    }
}

/// A boolean combination of conditions, as sent to the preview and
/// campaign endpoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentFilter {
    #[serde(default)]
    pub logic: Logic,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl SegmentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The combination mode that actually applies. With fewer than two
    /// conditions there is nothing to combine and it is always `AND`.
    pub fn effective_logic(&self) -> Logic {
        if self.conditions.len() > 1 {
            self.logic
        } else {
            Logic::And
        }
    }

    /// Non-empty, and every condition complete.
    pub fn is_previewable(&self) -> bool {
        !self.conditions.is_empty() && self.conditions.iter().all(Condition::is_complete)
    }

    /// Positions of conditions that are not complete yet.
    pub fn incomplete(&self) -> Vec<usize> {
        self.conditions
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_complete())
            .map(|(i, _)| i)
            .collect()
    }

    /// The filter as it goes over the wire: logic normalised by
    /// [`effective_logic`](Self::effective_logic).
    pub fn payload(&self) -> SegmentFilter {
        SegmentFilter {
            logic: self.effective_logic(),
            conditions: self.conditions.clone(),
        }
    }
}
