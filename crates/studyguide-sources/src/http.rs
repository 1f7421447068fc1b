//! Static HTTP server bank source.
//!
//! Talks to a server exposing `GET /modules` and `GET /<name>.json`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use studyguide_core::traits::{BankSource, ModuleInfo};

use crate::directory::safe_file_name;
use crate::error::SourceError;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Bank source backed by the study-tool HTTP server.
pub struct HttpSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base = if base_url.trim().is_empty() {
            DEFAULT_BASE_URL
        } else {
            base_url.trim()
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| SourceError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, url: String, name: &str) -> Result<Value, SourceError> {
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Network(format!("request to {url} timed out"))
            } else if e.is_connect() {
                SourceError::Network(format!("server not reachable at {}", self.base_url))
            } else {
                SourceError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(SourceError::NotFound(name.to_string()));
        }
        if status >= 400 {
            return Err(SourceError::Http { status, url });
        }

        response.json().await.map_err(|e| SourceError::InvalidJson {
            name: name.to_string(),
            message: e.to_string(),
        })
    }
}

/// Shapes accepted from `GET /modules`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ModulesResponse {
    Bare(Vec<ModuleEntry>),
    Wrapped { modules: Vec<ModuleEntry> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModuleEntry {
    Info {
        file: String,
        #[serde(default)]
        label: Option<String>,
    },
    Name(String),
}

impl From<ModuleEntry> for ModuleInfo {
    fn from(entry: ModuleEntry) -> Self {
        match entry {
            ModuleEntry::Info {
                file,
                label: Some(label),
            } if !label.trim().is_empty() => ModuleInfo { file, label },
            ModuleEntry::Info { file, .. } | ModuleEntry::Name(file) => ModuleInfo::from_file(file),
        }
    }
}

#[async_trait]
impl BankSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn list_modules(&self) -> anyhow::Result<Vec<ModuleInfo>> {
        let body = self
            .get_json(format!("{}/modules", self.base_url), "modules")
            .await?;
        let parsed: ModulesResponse =
            serde_json::from_value(body).map_err(|e| SourceError::InvalidJson {
                name: "modules".into(),
                message: e.to_string(),
            })?;

        let entries = match parsed {
            ModulesResponse::Bare(modules) | ModulesResponse::Wrapped { modules } => modules,
        };
        Ok(entries.into_iter().map(ModuleInfo::from).collect())
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_bank(&self, module: &str) -> anyhow::Result<Value> {
        let file = safe_file_name(module).ok_or_else(|| SourceError::NotFound(module.to_string()))?;
        let bank = self
            .get_json(format!("{}/{file}", self.base_url), &file)
            .await?;
        Ok(bank)
    }
}
