use segment_core::BuilderError;

/// Errors talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, timeout and the like.
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    /// The backend answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// The body was not the JSON we expected.
    #[error("could not decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// The blocking request task panicked or was cancelled.
    #[error("request task failed: {0}")]
    Task(String),
}

/// Errors from a [`SegmentSession`](crate::SegmentSession).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Attribute schemas could not be fetched. Without them no condition
    /// can be built.
    #[error("could not load attribute schemas: {0}")]
    SchemaLoad(#[source] ApiError),

    #[error("backend declared no usable attributes")]
    EmptySchema,

    #[error(transparent)]
    Builder(#[from] BuilderError),

    #[error("segment is not complete (incomplete conditions: {incomplete:?})")]
    IncompleteSegment { incomplete: Vec<usize> },

    #[error("email campaigns need a subject")]
    MissingSubject,

    #[error("could not create campaign: {0}")]
    Campaign(#[source] ApiError),
}
