use crate::input::ValueError;
use crate::operator::Operator;

/// Errors returned by [`SegmentBuilder`](crate::SegmentBuilder) mutations.
///
/// A rejected mutation leaves the filter unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuilderError {
    #[error("no condition at index {index} (filter has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unknown attribute '{key}'")]
    UnknownAttribute { key: String },

    #[error("operator '{operator}' is not available for attribute '{key}'")]
    OperatorNotAllowed { key: String, operator: Operator },

    #[error("condition {index} has no attribute selected")]
    MissingAttribute { index: usize },

    #[error("condition {index} has no operator selected")]
    MissingOperator { index: usize },

    #[error("'{value}' is not an option of attribute '{key}'")]
    NotAnOption { key: String, value: String },

    #[error("condition {index}: {source}")]
    InvalidValue {
        index: usize,
        #[source]
        source: ValueError,
    },
}
