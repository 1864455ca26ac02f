use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_API_BASE: &str = "https://api.webflow.com/v2";
const DEFAULT_WRITE_DELAY_MS: u64 = 1100;
const MAX_WRITE_DELAY_MS: u64 = 60_000;

/// Where the standings document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Url(String),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub source: DocumentSource,
    pub api_base: String,
    pub api_token: String,
    pub collection_id: String,
    pub write_delay: Duration,
    pub create_missing: bool,
    pub publish: bool,
    pub dry_run: bool,
}

impl SyncConfig {
    /// Reads settings from the environment. `html_file` replaces `STANDINGS_URL`.
    pub fn from_env(html_file: Option<PathBuf>) -> Result<Self> {
        let source = match html_file {
            Some(path) => DocumentSource::File(path),
            None => DocumentSource::Url(required("STANDINGS_URL")?),
        };
        let api_base = env::var("CMS_API_BASE")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let write_delay_ms = env::var("SYNC_WRITE_DELAY_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_WRITE_DELAY_MS)
            .min(MAX_WRITE_DELAY_MS);

        Ok(Self {
            source,
            api_base,
            api_token: required("CMS_API_TOKEN")?,
            collection_id: required("CMS_COLLECTION_ID")?,
            write_delay: Duration::from_millis(write_delay_ms),
            create_missing: env_bool("SYNC_CREATE_MISSING", true),
            publish: env_bool("SYNC_PUBLISH", true),
            dry_run: false,
        })
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .with_context(|| format!("missing required setting {key}"))
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| {
            let t = v.trim().to_ascii_lowercase();
            !(t.is_empty() || t == "0" || t == "false" || t == "off" || t == "no")
        })
        .unwrap_or(default)
}
