use async_trait::async_trait;

use segment_core::{AttributeList, SegmentFilter};

use crate::error::ApiError;
use crate::model::{Campaign, CampaignDraft, PreviewResult};

/// The backend endpoints a segment editing session depends on.
///
/// [`HttpSegmentApi`](crate::HttpSegmentApi) is the production
/// implementation; tests substitute in-memory fakes.
#[async_trait]
pub trait SegmentApi: Send + Sync {
    /// `GET {locale}/attributes`
    async fn attributes(&self) -> Result<AttributeList, ApiError>;

    /// `POST {locale}/segments/preview`
    ///
    /// The filter is sent as given; callers pass
    /// [`SegmentFilter::payload`] output.
    async fn preview(&self, filter: &SegmentFilter, limit: u32) -> Result<PreviewResult, ApiError>;

    /// `POST {locale}/campaigns`
    async fn create_campaign(&self, draft: &CampaignDraft) -> Result<Campaign, ApiError>;
}
