//! Scrape configuration loading
//!
//! A scrape config names the target page, request headers, optional
//! pagination and the selector mapping. Selectors are validated on load so a
//! broken schema fails before anything is fetched.
//!
//! ```yaml
//! url: https://example.com/articles
//! headers:
//!   User-Agent: Mozilla/5.0
//! pagination:
//!   type: param
//!   param: page
//!   start: 1
//!   end: 5
//! selectors:
//!   title:
//!     type: css
//!     query: "h1.article-title"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::ConfigError;
use crate::schema::SelectorSchema;
use crate::validator::validate;

/// A loaded and validated scrape configuration
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub url: Url,
    pub headers: BTreeMap<String, String>,
    /// Name under which the caller persists cookies
    pub session: String,
    pub pagination: Option<PaginationConfig>,
    pub selectors: SelectorSchema,
}

/// Page-number pagination appended to the base URL
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaginationConfig {
    #[serde(rename = "type", default = "default_pagination_kind")]
    pub kind: String,
    pub param: String,
    pub start: u32,
    pub end: u32,
    #[serde(default = "default_step")]
    pub step: u32,
    /// `?`/`&` for a query parameter, `/` for a path segment, anything else
    /// is glued verbatim between the base URL and the page number
    #[serde(default = "default_appender")]
    pub appender: String,
}

fn default_pagination_kind() -> String {
    "param".to_string()
}

fn default_step() -> u32 {
    1
}

fn default_appender() -> String {
    "?".to_string()
}

impl PaginationConfig {
    /// URLs for every page from `start` to `end` inclusive
    pub fn page_urls(&self, base: &str) -> Vec<String> {
        let step = self.step.max(1) as usize;
        (self.start..=self.end)
            .step_by(step)
            .map(|page| match self.appender.as_str() {
                "/" => format!("{}/{}/{}", base.trim_end_matches('/'), self.param, page),
                "?" | "&" => {
                    let connector = if base.contains('?') { "&" } else { self.appender.as_str() };
                    format!("{}{}{}={}", base, connector, self.param, page)
                }
                custom => format!("{}{}{}", base, custom, page),
            })
            .collect()
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.kind != "param" {
            return Err(ConfigError::InvalidField {
                field: "pagination.type",
                message: format!("unsupported pagination type `{}`", self.kind),
            });
        }
        if self.step == 0 {
            return Err(ConfigError::InvalidField {
                field: "pagination.step",
                message: "step must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl ScrapeConfig {
    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        let config = match extension.as_deref() {
            Some("json") => Self::from_json_str(&contents)?,
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        tracing::info!(
            path = %path.display(),
            url = %config.url,
            fields = config.selectors.len(),
            "loaded scrape config"
        );
        Ok(config)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: Value = serde_json::from_str(contents)?;
        Self::from_value(&raw)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: Value = serde_yaml::from_str(contents)?;
        Self::from_value(&raw)
    }

    /// Build from an already-parsed mapping
    pub fn from_value(raw: &Value) -> Result<Self, ConfigError> {
        let url = raw
            .get("url")
            .and_then(Value::as_str)
            .ok_or(ConfigError::MissingField("url"))?;
        let url = Url::parse(url).map_err(|source| ConfigError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let headers = match raw.get("headers") {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(name, value)| {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (name.clone(), value)
                })
                .collect(),
            Some(_) => {
                return Err(ConfigError::InvalidField {
                    field: "headers",
                    message: "expected a mapping of header names to values".to_string(),
                })
            }
        };

        let session = raw
            .get("session")
            .and_then(Value::as_str)
            .unwrap_or("default")
            .to_string();

        let pagination = match raw.get("pagination") {
            None | Some(Value::Null) => None,
            Some(value) => {
                let pagination = PaginationConfig::deserialize(value).map_err(|e| {
                    ConfigError::InvalidField {
                        field: "pagination",
                        message: e.to_string(),
                    }
                })?;
                pagination.check()?;
                Some(pagination)
            }
        };

        // `extract` is the key used by the browser-driven scraper
        let selectors = raw
            .get("selectors")
            .or_else(|| raw.get("extract"))
            .ok_or(ConfigError::MissingField("selectors"))?;
        let selectors = validate(selectors)?;

        Ok(Self {
            url,
            headers,
            session,
            pagination,
            selectors,
        })
    }

    /// Every URL to fetch: the paginated range, or just the base URL
    pub fn page_urls(&self) -> Vec<String> {
        match &self.pagination {
            Some(pagination) => pagination.page_urls(self.url.as_str()),
            None => vec![self.url.to_string()],
        }
    }
}
