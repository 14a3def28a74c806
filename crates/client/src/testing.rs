//! In-memory [`SegmentApi`] for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use segment_core::{AttributeList, SegmentFilter};

use crate::api::SegmentApi;
use crate::error::ApiError;
use crate::model::{Campaign, CampaignDraft, PreviewResult};

pub struct FakeApi {
    attributes: Mutex<Result<AttributeList, ApiError>>,
    previews: Mutex<Vec<(SegmentFilter, u32)>>,
    preview_delay: Mutex<Duration>,
    fail_previews: AtomicBool,
    campaigns: Mutex<Vec<CampaignDraft>>,
}

impl FakeApi {
    pub fn new() -> Self {
        FakeApi {
            attributes: Mutex::new(Ok(sample_attributes())),
            previews: Mutex::new(Vec::new()),
            preview_delay: Mutex::new(Duration::ZERO),
            fail_previews: AtomicBool::new(false),
            campaigns: Mutex::new(Vec::new()),
        }
    }

    pub fn with_attributes(attributes: Result<AttributeList, ApiError>) -> Self {
        let api = FakeApi::new();
        *api.attributes.lock().unwrap() = attributes;
        api
    }

    pub fn delay_previews(&self, delay: Duration) {
        *self.preview_delay.lock().unwrap() = delay;
    }

    pub fn fail_previews(&self, fail: bool) {
        self.fail_previews.store(fail, Ordering::SeqCst);
    }

    pub fn preview_calls(&self) -> Vec<(SegmentFilter, u32)> {
        self.previews.lock().unwrap().clone()
    }

    pub fn campaigns(&self) -> Vec<CampaignDraft> {
        self.campaigns.lock().unwrap().clone()
    }
}

#[async_trait]
impl SegmentApi for FakeApi {
    async fn attributes(&self) -> Result<AttributeList, ApiError> {
        self.attributes.lock().unwrap().clone()
    }

    async fn preview(&self, filter: &SegmentFilter, limit: u32) -> Result<PreviewResult, ApiError> {
        let call = {
            let mut previews = self.previews.lock().unwrap();
            previews.push((filter.clone(), limit));
            previews.len() as u64
        };
        let delay = *self.preview_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_previews.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                endpoint: "segments/preview".into(),
                status: 500,
            });
        }
        Ok(PreviewResult {
            total_count: call * 10,
            preview_count: 0,
            preview_contacts: Vec::new(),
        })
    }

    async fn create_campaign(&self, draft: &CampaignDraft) -> Result<Campaign, ApiError> {
        self.campaigns.lock().unwrap().push(draft.clone());
        Ok(Campaign {
            id: Some("1".into()),
            name: draft.message.name.clone(),
            status: Some("draft".into()),
        })
    }
}

pub fn sample_attributes() -> AttributeList {
    serde_json::from_value(json!({
        "attributes": [
            {"key": "balance", "label": "Balance", "type": "number", "conditions": ["gt", "lt", "equals"]},
            {"key": "is_vip", "label": "VIP", "type": "boolean", "conditions": ["is_true", "is_false"]},
            {"key": "city", "label": "City", "type": "enum",
             "options": ["Baku", "Ganja"], "conditions": ["equals", "not_equals"]},
        ]
    }))
    .unwrap()
}
