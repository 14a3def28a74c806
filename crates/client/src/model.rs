//! Request and response bodies exchanged with the backend.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use segment_core::SegmentFilter;

// ── Preview ───────────────────────────────────────────────────────────────────

/// Body of `POST {locale}/segments/preview`.
#[derive(Debug, Serialize)]
pub struct PreviewRequest<'a> {
    #[serde(flatten)]
    pub filter: &'a SegmentFilter,
    pub limit: u32,
}

/// Matching-contact count and a small sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewResult {
    pub total_count: u64,
    #[serde(default)]
    pub preview_count: u64,
    #[serde(default)]
    pub preview_contacts: Vec<Contact>,
}

/// A contact row as returned in previews. Fields beyond the common ones are
/// kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Contact {
    /// Best human-readable handle for the contact.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .or(self.phone.as_deref())
            .or(self.id.as_deref())
            .unwrap_or("(unnamed)")
    }
}

// ── Campaigns ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Sms,
    Email,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Sms => f.write_str("sms"),
            Channel::Email => f.write_str("email"),
        }
    }
}

/// What a campaign sends, independent of who it goes to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignMessage {
    pub name: String,
    pub channel: Channel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub content: String,
}

/// Body of `POST {locale}/campaigns`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignDraft {
    #[serde(flatten)]
    pub message: CampaignMessage,
    pub segment: SegmentFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Ids come back as numbers from some endpoints and strings from others.
fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Option::<serde_json::Value>::deserialize(d)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}
