//! segment-core: segment filter model and builder.
//!
//! A segment filter is an AND/OR combination of attribute conditions used to
//! target an audience. This crate holds everything that does not talk to the
//! network:
//!
//! - [`AttributeCatalog`] -- server-declared attributes, validated against
//!   the recognised [`Operator`] vocabulary
//! - [`Condition`], [`ConditionValue`], [`SegmentFilter`] -- the wire model
//! - [`InputKind`] -- which value shape a condition takes
//! - [`SegmentBuilder`] -- the editing state machine with cascading resets

pub mod attribute;
pub mod builder;
pub mod condition;
pub mod error;
pub mod filter;
pub mod input;
pub mod operator;
pub mod value;

pub use attribute::{
    AttributeCatalog, AttributeList, AttributeSchema, AttributeType, EnumOption, SchemaIssue,
    WireAttribute, WireOption,
};
pub use builder::{ConditionIssue, ConditionUpdate, SegmentBuilder};
pub use condition::Condition;
pub use error::BuilderError;
pub use filter::{Logic, SegmentFilter};
pub use input::{InputKind, ValueError};
pub use operator::{CountOperator, Operator, UnknownOperator};
pub use value::{ConditionValue, Scalar};
