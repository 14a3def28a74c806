//! Client configuration.
//!
//! Settings are layered: explicit overrides (command-line flags, which the
//! CLI also fills from environment variables) win over the TOML config file,
//! which wins over built-in defaults.
//!
//! # Example
//!
//! ```toml
//! [api]
//! url = "https://api.example.com"
//! token = "…"
//! locale = "az"
//! timeout_secs = 30
//!
//! [preview]
//! debounce_ms = 500
//! limit = 5
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_LOCALE: &str = "az";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_PREVIEW_LIMIT: u32 = 5;

// ── Resolved settings ─────────────────────────────────────────────────────────

/// Where and how to reach the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without the locale segment, e.g. `https://api.example.com`.
    pub base_url: String,
    pub locale: String,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub token: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Debounce delay and row limit for preview requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewSettings {
    pub debounce: Duration,
    pub limit: u32,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        PreviewSettings {
            debounce: DEFAULT_DEBOUNCE,
            limit: DEFAULT_PREVIEW_LIMIT,
        }
    }
}

// ── File format ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub preview: PreviewSection,
}

/// `[api]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    pub url: Option<String>,
    pub token: Option<String>,
    pub locale: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// `[preview]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreviewSection {
    pub debounce_ms: Option<u64>,
    pub limit: Option<u32>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub locale: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no API URL configured (use --api-url, SEGMENT_API_URL or [api] url)")]
    MissingBaseUrl,
    #[error("API URL must start with http:// or https://, got '{0}'")]
    InvalidBaseUrl(String),
    #[error("locale must not be empty")]
    EmptyLocale,
    #[error("preview limit must be at least 1")]
    InvalidLimit,
}

/// Merge overrides, file and defaults into the settings the client runs with.
pub fn resolve(
    file: FileConfig,
    overrides: Overrides,
) -> Result<(ClientConfig, PreviewSettings), ConfigError> {
    let base_url = overrides
        .api_url
        .or(file.api.url)
        .ok_or(ConfigError::MissingBaseUrl)?;
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(base_url));
    }

    let locale = overrides
        .locale
        .or(file.api.locale)
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
    if locale.trim().is_empty() {
        return Err(ConfigError::EmptyLocale);
    }

    let mut client = ClientConfig::new(base_url);
    client.locale = locale;
    client.token = overrides.token.or(file.api.token).filter(|t| !t.is_empty());
    if let Some(secs) = file.api.timeout_secs {
        client.timeout = Duration::from_secs(secs);
    }

    let limit = overrides
        .limit
        .or(file.preview.limit)
        .unwrap_or(DEFAULT_PREVIEW_LIMIT);
    if limit == 0 {
        return Err(ConfigError::InvalidLimit);
    }
    let debounce = file
        .preview
        .debounce_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_DEBOUNCE);

    Ok((client, PreviewSettings { debounce, limit }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_when_only_url_is_given() {
        let (client, preview) = resolve(
            FileConfig::default(),
            Overrides {
                api_url: Some("https://api.example.com/".into()),
                ..Overrides::default()
            },
        )
        .unwrap();

        assert_eq!(client.base_url, "https://api.example.com");
        assert_eq!(client.locale, "az");
        assert_eq!(client.token, None);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);
        assert_eq!(preview, PreviewSettings::default());
    }

    #[test]
    fn overrides_win_over_file() {
        let file: FileConfig = toml::from_str(
            r#"
            [api]
            url = "https://file.example.com"
            token = "file-token"
            locale = "en"
            timeout_secs = 5

            [preview]
            debounce_ms = 250
            limit = 10
            "#,
        )
        .unwrap();

        let (client, preview) = resolve(
            file,
            Overrides {
                api_url: Some("http://localhost:8000".into()),
                locale: Some("ru".into()),
                ..Overrides::default()
            },
        )
        .unwrap();

        assert_eq!(client.base_url, "http://localhost:8000");
        assert_eq!(client.locale, "ru");
        assert_eq!(client.token.as_deref(), Some("file-token"));
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert_eq!(preview.debounce, Duration::from_millis(250));
        assert_eq!(preview.limit, 10);
    }

    #[test]
    fn missing_or_bad_url_is_an_error() {
        assert!(matches!(
            resolve(FileConfig::default(), Overrides::default()),
            Err(ConfigError::MissingBaseUrl)
        ));
        assert!(matches!(
            resolve(
                FileConfig::default(),
                Overrides {
                    api_url: Some("ftp://x".into()),
                    ..Overrides::default()
                }
            ),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn zero_limit_is_rejected() {
        let result = resolve(
            FileConfig::default(),
            Overrides {
                api_url: Some("http://x".into()),
                limit: Some(0),
                ..Overrides::default()
            },
        );
        assert!(matches!(result, Err(ConfigError::InvalidLimit)));
    }

    #[test]
    fn read_reports_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nurl = \"http://x\"\nproxy = \"nope\"").unwrap();
        let err = FileConfig::read(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{}", err);
    }

    #[test]
    fn read_missing_file() {
        let err = FileConfig::read(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
