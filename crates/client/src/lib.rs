//! segment-client: talks to the segment backend.
//!
//! [`SegmentApi`] abstracts the three endpoints (attribute schemas,
//! preview, campaign creation); [`HttpSegmentApi`] implements it over HTTP.
//! [`PreviewScheduler`] debounces preview requests and keeps only the
//! newest answer. [`SegmentSession`] ties a
//! [`SegmentBuilder`](segment_core::SegmentBuilder) to both.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod preview;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use api::SegmentApi;
pub use config::{resolve, ClientConfig, ConfigError, FileConfig, Overrides, PreviewSettings};
pub use error::{ApiError, SessionError};
pub use http::HttpSegmentApi;
pub use model::{
    Campaign, CampaignDraft, CampaignMessage, Channel, Contact, PreviewRequest, PreviewResult,
};
pub use preview::{PreviewScheduler, PreviewSnapshot, Scheduled};
pub use session::{catalog_from_list, load_attribute_schemas, SegmentSession};
