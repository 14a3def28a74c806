//! Settings and inputs shared by every subcommand.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use segment_client::{
    catalog_from_list, load_attribute_schemas, resolve, ClientConfig, FileConfig,
    HttpSegmentApi, Overrides, PreviewSettings, SegmentApi,
};
use segment_core::{AttributeCatalog, AttributeList, SchemaIssue, SegmentFilter};

use crate::OutputFormat;

/// Global flags after clap has applied environment fallbacks.
pub(crate) struct Globals {
    pub output: OutputFormat,
    pub quiet: bool,
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub locale: Option<String>,
    pub config: Option<PathBuf>,
    pub schema: Option<PathBuf>,
    pub limit: Option<u32>,
}

impl Globals {
    /// Merge flags with the config file, if any.
    pub fn client_settings(&self) -> Result<(ClientConfig, PreviewSettings), String> {
        let file = match &self.config {
            Some(path) => FileConfig::read(path).map_err(|e| e.to_string())?,
            None => FileConfig::default(),
        };
        let overrides = Overrides {
            api_url: self.api_url.clone(),
            token: self.token.clone(),
            locale: self.locale.clone(),
            limit: self.limit,
        };
        let (config, preview) = resolve(file, overrides).map_err(|e| e.to_string())?;
        debug!(
            base_url = %config.base_url,
            locale = %config.locale,
            limit = preview.limit,
            "client settings resolved"
        );
        Ok((config, preview))
    }

    pub fn api(&self) -> Result<(Arc<HttpSegmentApi>, PreviewSettings), String> {
        let (config, preview) = self.client_settings()?;
        Ok((Arc::new(HttpSegmentApi::new(config)), preview))
    }

    /// Attribute catalog from `--schema` when given, otherwise from the
    /// backend (which then must be configured).
    pub async fn catalog(
        &self,
        api: Option<&dyn SegmentApi>,
    ) -> Result<(AttributeCatalog, Vec<SchemaIssue>), String> {
        if let Some(path) = &self.schema {
            let list: AttributeList = read_json(path)?;
            return catalog_from_list(list).map_err(|e| format!("{} ({})", e, path.display()));
        }
        match api {
            Some(api) => load_attribute_schemas(api).await.map_err(|e| e.to_string()),
            None => {
                let (api, _) = self.api()?;
                load_attribute_schemas(&*api)
                    .await
                    .map_err(|e| e.to_string())
            }
        }
    }

    pub fn json(&self) -> bool {
        self.output == OutputFormat::Json
    }
}

pub(crate) fn read_filter(path: &Path) -> Result<SegmentFilter, String> {
    read_json(path)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading file '{}': {}", path.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("error parsing JSON in '{}': {}", path.display(), e))
}
