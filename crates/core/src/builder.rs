//! Interactive construction of a [`SegmentFilter`].
//!
//! [`SegmentBuilder`] owns the filter being edited and the catalog it is
//! validated against. Every mutation either applies completely or returns
//! a [`BuilderError`] and leaves the filter untouched.
//!
//! Field updates cascade:
//! - changing the attribute clears the operator and the value,
//! - choosing a value-less operator clears the value.

use std::sync::Arc;

use crate::attribute::{AttributeCatalog, AttributeSchema};
use crate::condition::Condition;
use crate::error::BuilderError;
use crate::filter::{Logic, SegmentFilter};
use crate::input::InputKind;
use crate::operator::Operator;
use crate::value::{ConditionValue, Scalar};

/// A single-field update to one condition.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionUpdate {
    Key(String),
    Operator(Option<Operator>),
    Value(ConditionValue),
}

/// A problem found while loading an existing filter into a builder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionIssue {
    #[error("condition {index}: {error}")]
    Rejected { index: usize, error: BuilderError },
    #[error("condition {index} is incomplete")]
    Incomplete { index: usize },
}

impl ConditionIssue {
    pub fn index(&self) -> usize {
        match self {
            ConditionIssue::Rejected { index, .. } | ConditionIssue::Incomplete { index } => *index,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SegmentBuilder {
    catalog: Arc<AttributeCatalog>,
    filter: SegmentFilter,
}

impl SegmentBuilder {
    pub fn new(catalog: Arc<AttributeCatalog>) -> Self {
        SegmentBuilder {
            catalog,
            filter: SegmentFilter::new(),
        }
    }

    /// Load an existing filter, replaying each condition through the same
    /// validation interactive edits go through.
    ///
    /// Parts of a condition that fail validation are dropped (a bad
    /// operator leaves the operator unset, and so on) and reported. Clauses
    /// left incomplete are reported too.
    pub fn load(catalog: Arc<AttributeCatalog>, filter: SegmentFilter) -> (Self, Vec<ConditionIssue>) {
        let mut builder = SegmentBuilder::new(catalog);
        builder.filter.logic = filter.logic;
        let mut issues = Vec::new();

        for (index, condition) in filter.conditions.into_iter().enumerate() {
            builder.add_condition();
            let mut steps = vec![ConditionUpdate::Key(condition.key)];
            if condition.operator.is_some() {
                steps.push(ConditionUpdate::Operator(condition.operator));
            }
            // A value-less operator ignores any value left over from before.
            let valueless = condition.operator.is_some_and(Operator::is_valueless);
            if !valueless && !condition.value.is_empty() {
                steps.push(ConditionUpdate::Value(condition.value));
            }
            for step in steps {
                if let Err(error) = builder.update_condition(index, step) {
                    issues.push(ConditionIssue::Rejected { index, error });
                    break;
                }
            }
            if !builder.filter.conditions[index].is_complete()
                && !issues.iter().any(|i| i.index() == index)
            {
                issues.push(ConditionIssue::Incomplete { index });
            }
        }

        (builder, issues)
    }

    pub fn catalog(&self) -> &AttributeCatalog {
        &self.catalog
    }

    pub fn shared_catalog(&self) -> Arc<AttributeCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn filter(&self) -> &SegmentFilter {
        &self.filter
    }

    pub fn into_filter(self) -> SegmentFilter {
        self.filter
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.filter.conditions
    }

    pub fn len(&self) -> usize {
        self.filter.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filter.conditions.is_empty()
    }

    /// Append an empty clause and return its index.
    pub fn add_condition(&mut self) -> usize {
        self.filter.conditions.push(Condition::default());
        self.filter.conditions.len() - 1
    }

    /// Remove the clause at `index`; later clauses shift down by one.
    pub fn remove_condition(&mut self, index: usize) -> Result<Condition, BuilderError> {
        self.check_index(index)?;
        Ok(self.filter.conditions.remove(index))
    }

    pub fn update_condition(
        &mut self,
        index: usize,
        update: ConditionUpdate,
    ) -> Result<(), BuilderError> {
        match update {
            ConditionUpdate::Key(key) => self.set_key(index, key),
            ConditionUpdate::Operator(op) => self.set_operator(index, op),
            ConditionUpdate::Value(value) => self.set_value(index, value),
        }
    }

    /// Select the attribute. Operator and value are always reset.
    /// An empty key returns the clause to its initial state.
    pub fn set_key(&mut self, index: usize, key: impl Into<String>) -> Result<(), BuilderError> {
        self.check_index(index)?;
        let key = key.into();
        if !key.is_empty() && self.catalog.get(&key).is_none() {
            return Err(BuilderError::UnknownAttribute { key });
        }
        let condition = &mut self.filter.conditions[index];
        condition.key = key;
        condition.operator = None;
        condition.value = ConditionValue::None;
        Ok(())
    }

    /// Select the operator. Clearing the operator or choosing a value-less
    /// one clears the value; a value that no longer fits the new input shape
    /// is cleared as well.
    pub fn set_operator(
        &mut self,
        index: usize,
        operator: Option<Operator>,
    ) -> Result<(), BuilderError> {
        let attribute = self.attribute_at(index)?;
        if let Some(op) = operator {
            if !attribute.allows(op) {
                return Err(BuilderError::OperatorNotAllowed {
                    key: attribute.key.clone(),
                    operator: op,
                });
            }
        }
        let kind = attribute.input_kind(operator);

        let condition = &mut self.filter.conditions[index];
        let previous = std::mem::take(&mut condition.value);
        condition.operator = operator;
        condition.value = match (operator, kind) {
            (None, _) | (_, InputKind::None) => ConditionValue::None,
            _ => kind.coerce(previous).unwrap_or_default(),
        };
        Ok(())
    }

    /// Set the value, checked against the clause's input shape.
    pub fn set_value(&mut self, index: usize, value: ConditionValue) -> Result<(), BuilderError> {
        let attribute = self.attribute_at(index)?;
        let operator = self.filter.conditions[index].operator;
        if operator.is_none() && !value.is_empty() {
            return Err(BuilderError::MissingOperator { index });
        }
        let value = attribute
            .input_kind(operator)
            .coerce(value)
            .map_err(|source| BuilderError::InvalidValue { index, source })?;
        if let ConditionValue::Scalar(Scalar::Text(choice)) = &value {
            if attribute.input_kind(operator) == InputKind::Select && !attribute.has_option(choice) {
                return Err(BuilderError::NotAnOption {
                    key: attribute.key.clone(),
                    value: choice.clone(),
                });
            }
        }
        self.filter.conditions[index].value = value;
        Ok(())
    }

    /// Parse raw text into the clause's input shape, then set it.
    pub fn set_value_from_str(&mut self, index: usize, raw: &str) -> Result<(), BuilderError> {
        let kind = self.input_kind(index)?;
        let value = kind
            .parse(raw)
            .map_err(|source| BuilderError::InvalidValue { index, source })?;
        self.set_value(index, value)
    }

    pub fn logic(&self) -> Logic {
        self.filter.logic
    }

    pub fn set_logic(&mut self, logic: Logic) {
        self.filter.logic = logic;
    }

    /// The AND/OR choice only means something with two or more clauses.
    pub fn logic_selectable(&self) -> bool {
        self.filter.conditions.len() > 1
    }

    /// Input shape for the clause at `index`.
    pub fn input_kind(&self, index: usize) -> Result<InputKind, BuilderError> {
        let attribute = self.attribute_at(index)?;
        Ok(attribute.input_kind(self.filter.conditions[index].operator))
    }

    pub fn is_previewable(&self) -> bool {
        self.filter.is_previewable()
    }

    fn check_index(&self, index: usize) -> Result<(), BuilderError> {
        let len = self.filter.conditions.len();
        if index < len {
            Ok(())
        } else {
            Err(BuilderError::IndexOutOfRange { index, len })
        }
    }

    /// The attribute selected by the clause at `index`.
    fn attribute_at(&self, index: usize) -> Result<&AttributeSchema, BuilderError> {
        self.check_index(index)?;
        let key = &self.filter.conditions[index].key;
        if key.is_empty() {
            return Err(BuilderError::MissingAttribute { index });
        }
        self.catalog
            .get(key)
            .ok_or_else(|| BuilderError::UnknownAttribute { key: key.clone() })
    }
}
