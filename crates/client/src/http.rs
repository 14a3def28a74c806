//! HTTP implementation of [`SegmentApi`].
//!
//! Uses `ureq` (sync) wrapped in `tokio::task::spawn_blocking` so callers
//! on the async runtime are never blocked. Every endpoint lives under
//! `{base_url}/{locale}/`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use segment_core::{AttributeList, SegmentFilter};

use crate::api::SegmentApi;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::model::{Campaign, CampaignDraft, PreviewRequest, PreviewResult};

pub struct HttpSegmentApi {
    config: ClientConfig,
    agent: ureq::Agent,
}

impl HttpSegmentApi {
    pub fn new(config: ClientConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build();
        HttpSegmentApi {
            agent: ureq::Agent::new_with_config(agent_config),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full URL of an endpoint path under the configured locale.
    ///
    /// `segments/preview` → `{base_url}/{locale}/segments/preview`
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.locale.trim_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET when `body` is `None`, POST with a JSON body otherwise.
    async fn request<T>(&self, path: &str, body: Option<serde_json::Value>) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let url = self.endpoint(path);
        let agent = self.agent.clone();
        let authorization = self.config.token.as_ref().map(|t| format!("Bearer {}", t));

        let method = if body.is_some() { "POST" } else { "GET" };
        debug!(%url, method, "backend request");

        tokio::task::spawn_blocking(move || {
            let sent = match body {
                None => {
                    let mut request = agent.get(&url);
                    if let Some(ref value) = authorization {
                        request = request.header("Authorization", value);
                    }
                    request.call()
                }
                Some(json) => {
                    let mut request = agent.post(&url);
                    if let Some(ref value) = authorization {
                        request = request.header("Authorization", value);
                    }
                    request.send_json(&json)
                }
            };

            let response = sent.map_err(|e| classify_error(e, &url))?;
            response
                .into_body()
                .read_json::<T>()
                .map_err(|e| ApiError::Decode {
                    endpoint: url.clone(),
                    message: e.to_string(),
                })
        })
        .await
        .map_err(|e| ApiError::Task(e.to_string()))?
    }
}

#[async_trait]
impl SegmentApi for HttpSegmentApi {
    async fn attributes(&self) -> Result<AttributeList, ApiError> {
        self.request("attributes", None).await
    }

    async fn preview(&self, filter: &SegmentFilter, limit: u32) -> Result<PreviewResult, ApiError> {
        let body = serde_json::to_value(PreviewRequest { filter, limit }).map_err(|e| {
            ApiError::Decode {
                endpoint: self.endpoint("segments/preview"),
                message: format!("could not encode request: {}", e),
            }
        })?;
        self.request("segments/preview", Some(body)).await
    }

    async fn create_campaign(&self, draft: &CampaignDraft) -> Result<Campaign, ApiError> {
        let body = serde_json::to_value(draft).map_err(|e| ApiError::Decode {
            endpoint: self.endpoint("campaigns"),
            message: format!("could not encode request: {}", e),
        })?;
        self.request("campaigns", Some(body)).await
    }
}

/// Split ureq failures into HTTP status errors and everything else.
fn classify_error(err: ureq::Error, endpoint: &str) -> ApiError {
    match err {
        ureq::Error::StatusCode(status) => ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
        },
        other => ApiError::Transport {
            endpoint: endpoint.to_string(),
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str, locale: &str) -> HttpSegmentApi {
        let mut config = ClientConfig::new(base);
        config.locale = locale.to_string();
        HttpSegmentApi::new(config)
    }

    #[test]
    fn endpoint_joins_base_locale_and_path() {
        assert_eq!(
            api("https://api.example.com", "az").endpoint("attributes"),
            "https://api.example.com/az/attributes"
        );
        assert_eq!(
            api("https://api.example.com/", "/en/").endpoint("/segments/preview"),
            "https://api.example.com/en/segments/preview"
        );
    }

    #[test]
    fn status_errors_keep_the_code() {
        let err = classify_error(ureq::Error::StatusCode(404), "http://x/az/attributes");
        assert_eq!(
            err,
            ApiError::Status {
                endpoint: "http://x/az/attributes".into(),
                status: 404
            }
        );
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        // Port 9 (discard) is almost never listening on loopback.
        let err = api("http://127.0.0.1:9", "az").attributes().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }), "{:?}", err);
    }
}
