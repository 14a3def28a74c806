//! An editing session: builder, backend and preview wired together.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use segment_core::{
    AttributeCatalog, AttributeList, BuilderError, Condition, ConditionIssue, ConditionUpdate,
    Logic, SchemaIssue, SegmentBuilder, SegmentFilter,
};

use crate::api::SegmentApi;
use crate::config::PreviewSettings;
use crate::error::SessionError;
use crate::model::{Campaign, CampaignDraft, CampaignMessage, Channel};
use crate::preview::{PreviewScheduler, PreviewSnapshot};

/// Fetch and validate the attribute schemas.
///
/// Schema problems are logged and returned alongside the catalog; only a
/// failed request or a catalog with nothing usable in it is an error.
pub async fn load_attribute_schemas(
    api: &dyn SegmentApi,
) -> Result<(AttributeCatalog, Vec<SchemaIssue>), SessionError> {
    let list = api.attributes().await.map_err(SessionError::SchemaLoad)?;
    catalog_from_list(list)
}

/// Validate an attribute document obtained some other way (a saved file,
/// for instance), with the same logging and emptiness check.
pub fn catalog_from_list(
    list: AttributeList,
) -> Result<(AttributeCatalog, Vec<SchemaIssue>), SessionError> {
    let (catalog, issues) = AttributeCatalog::from_wire(list.attributes);
    for issue in &issues {
        warn!(%issue, "attribute schema");
    }
    if catalog.is_empty() {
        return Err(SessionError::EmptySchema);
    }
    info!(attributes = catalog.len(), issues = issues.len(), "attribute schemas loaded");
    Ok((catalog, issues))
}

/// One segment being edited against a live backend.
///
/// Every successful edit schedules a preview. Failed edits leave the filter
/// untouched and schedule nothing. Edits must be made from within a tokio
/// runtime, since scheduling a preview spawns a task.
pub struct SegmentSession {
    api: Arc<dyn SegmentApi>,
    builder: SegmentBuilder,
    preview: PreviewScheduler,
    schema_issues: Vec<SchemaIssue>,
}

impl SegmentSession {
    /// Load schemas from the backend and start with an empty filter.
    pub async fn start(
        api: Arc<dyn SegmentApi>,
        settings: PreviewSettings,
    ) -> Result<Self, SessionError> {
        let (catalog, issues) = load_attribute_schemas(api.as_ref()).await?;
        let mut session = SegmentSession::with_catalog(api, Arc::new(catalog), settings);
        session.schema_issues = issues;
        Ok(session)
    }

    /// Start with an already-validated catalog.
    pub fn with_catalog(
        api: Arc<dyn SegmentApi>,
        catalog: Arc<AttributeCatalog>,
        settings: PreviewSettings,
    ) -> Self {
        let preview = PreviewScheduler::new(Arc::clone(&api), settings);
        SegmentSession {
            api,
            builder: SegmentBuilder::new(catalog),
            preview,
            schema_issues: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &AttributeCatalog {
        self.builder.catalog()
    }

    pub fn schema_issues(&self) -> &[SchemaIssue] {
        &self.schema_issues
    }

    pub fn builder(&self) -> &SegmentBuilder {
        &self.builder
    }

    pub fn filter(&self) -> &SegmentFilter {
        self.builder.filter()
    }

    pub fn latest_preview(&self) -> Option<PreviewSnapshot> {
        self.preview.latest()
    }

    pub fn subscribe_preview(&self) -> watch::Receiver<Option<PreviewSnapshot>> {
        self.preview.subscribe()
    }

    // ── Edits ────────────────────────────────────────────────────────────────

    /// Replace the filter with `filter`, replaying it through validation.
    pub fn load_filter(&mut self, filter: SegmentFilter) -> Vec<ConditionIssue> {
        let catalog = self.builder.shared_catalog();
        let (builder, issues) = SegmentBuilder::load(catalog, filter);
        self.builder = builder;
        self.refresh();
        issues
    }

    pub fn add_condition(&mut self) -> usize {
        let index = self.builder.add_condition();
        self.refresh();
        index
    }

    pub fn remove_condition(&mut self, index: usize) -> Result<Condition, SessionError> {
        let removed = self.builder.remove_condition(index)?;
        self.refresh();
        Ok(removed)
    }

    pub fn update_condition(
        &mut self,
        index: usize,
        update: ConditionUpdate,
    ) -> Result<(), SessionError> {
        self.apply(|b| b.update_condition(index, update))
    }

    pub fn set_value_from_str(&mut self, index: usize, raw: &str) -> Result<(), SessionError> {
        self.apply(|b| b.set_value_from_str(index, raw))
    }

    pub fn set_logic(&mut self, logic: Logic) {
        self.builder.set_logic(logic);
        self.refresh();
    }

    fn apply(
        &mut self,
        edit: impl FnOnce(&mut SegmentBuilder) -> Result<(), BuilderError>,
    ) -> Result<(), SessionError> {
        edit(&mut self.builder)?;
        self.refresh();
        Ok(())
    }

    fn refresh(&mut self) {
        self.preview.schedule(self.builder.filter());
    }

    // ── Campaigns ────────────────────────────────────────────────────────────

    /// Create a campaign targeting the current segment.
    pub async fn create_campaign(&self, message: CampaignMessage) -> Result<Campaign, SessionError> {
        let filter = self.builder.filter();
        if !filter.is_previewable() {
            return Err(SessionError::IncompleteSegment {
                incomplete: filter.incomplete(),
            });
        }
        let has_subject = message
            .subject
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        if message.channel == Channel::Email && !has_subject {
            return Err(SessionError::MissingSubject);
        }

        let draft = CampaignDraft {
            message,
            segment: filter.payload(),
        };
        let campaign = self
            .api
            .create_campaign(&draft)
            .await
            .map_err(SessionError::Campaign)?;
        info!(name = %campaign.name, id = ?campaign.id, "campaign created");
        Ok(campaign)
    }
}
