// src/config/mod.rs
//! Pipeline configuration (TOML).
//!
//! Resolution order:
//! 1) $PIPELINE_CONFIG_PATH (must exist)
//! 2) config/pipeline.toml
//! 3) the same file embedded at build time
//!
//! Env overrides applied afterwards: NEWS_PROXY_BASE, NEWS_REQUEST_TIMEOUT_SECS,
//! NEWS_SCHEDULER.

pub mod ai;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::classify::KeywordConfig;
use crate::dedup::RankProfile;
use crate::ingest::types::FeedSource;

pub const DEFAULT_PIPELINE_CONFIG_PATH: &str = "config/pipeline.toml";
pub const ENV_PIPELINE_CONFIG_PATH: &str = "PIPELINE_CONFIG_PATH";
pub const ENV_PROXY_BASE: &str = "NEWS_PROXY_BASE";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "NEWS_REQUEST_TIMEOUT_SECS";
pub const ENV_SCHEDULER: &str = "NEWS_SCHEDULER";

const BUILTIN_CONFIG: &str = include_str!("../../config/pipeline.toml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// RSS-to-JSON proxy.
    Proxy,
    /// Fetch and parse the RSS XML directly.
    Direct,
}

fn default_mode() -> FetchMode {
    FetchMode::Proxy
}
fn default_proxy_base() -> String {
    "https://api.rss2json.com/v1/api.json".to_string()
}
fn default_count() -> u32 {
    20
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_request_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_mode")]
    pub mode: FetchMode,
    #[serde(default = "default_proxy_base")]
    pub proxy_base: String,
    /// Result-count hint sent to the proxy; also the per-feed cap in direct mode.
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Pause between successive outbound calls of the batch job.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            proxy_base: default_proxy_base(),
            count: default_count(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            api_key: None,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

fn widget_profile() -> RankProfile {
    RankProfile::WIDGET
}
fn feed_profile() -> RankProfile {
    RankProfile::FEED
}
fn batch_profile() -> RankProfile {
    RankProfile::BATCH
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfilesConfig {
    #[serde(default = "widget_profile")]
    pub widget: RankProfile,
    #[serde(default = "feed_profile")]
    pub feed: RankProfile,
    #[serde(default = "batch_profile")]
    pub batch: RankProfile,
}

impl Default for ProfilesConfig {
    fn default() -> Self {
        Self {
            widget: widget_profile(),
            feed: feed_profile(),
            batch: batch_profile(),
        }
    }
}

impl ProfilesConfig {
    /// Look up a named call-site profile ("widget" | "feed" | "batch").
    pub fn get(&self, name: &str) -> Option<RankProfile> {
        match name.trim().to_ascii_lowercase().as_str() {
            "widget" => Some(self.widget),
            "feed" => Some(self.feed),
            "batch" => Some(self.batch),
            _ => None,
        }
    }
}

fn default_table() -> String {
    "crc_news".to_string()
}
fn default_url_env() -> String {
    "SUPABASE_URL".to_string()
}
fn default_key_env() -> String {
    "SUPABASE_SERVICE_ROLE_KEY".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_table")]
    pub table: String,
    /// Name of the env var holding the project URL.
    #[serde(default = "default_url_env")]
    pub url_env: String,
    /// Name of the env var holding the service key.
    #[serde(default = "default_key_env")]
    pub key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            url_env: default_url_env(),
            key_env: default_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    24 * 3600
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub sources: Vec<FeedSource>,
    pub keywords: KeywordConfig,
    #[serde(default)]
    pub profiles: ProfilesConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s).context("parsing pipeline config")?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// The shipped `config/pipeline.toml`, compiled in.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CONFIG)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Resolve the config file (see module docs) and apply env overrides.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_PIPELINE_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!(
                    "{ENV_PIPELINE_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                ));
            }
            Self::load_from(&pb)?
        } else {
            let default_path = PathBuf::from(DEFAULT_PIPELINE_CONFIG_PATH);
            if default_path.exists() {
                Self::load_from(&default_path)?
            } else {
                Self::builtin()?
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(base) = std::env::var(ENV_PROXY_BASE) {
            if !base.trim().is_empty() {
                self.fetch.proxy_base = base.trim().to_string();
            }
        }
        if let Some(secs) = std::env::var(ENV_REQUEST_TIMEOUT_SECS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            self.fetch.timeout_secs = secs.max(1);
        }
        if let Ok(v) = std::env::var(ENV_SCHEDULER) {
            self.scheduler.enabled = matches!(v.trim(), "1" | "true" | "yes");
        }
    }

    fn sanitize(&mut self) {
        self.fetch.timeout_secs = self.fetch.timeout_secs.max(1);
        self.fetch.count = self.fetch.count.max(1);
        self.scheduler.interval_secs = self.scheduler.interval_secs.max(60);
        self.profiles.widget = self.profiles.widget.sanitized();
        self.profiles.feed = self.profiles.feed.sanitized();
        self.profiles.batch = self.profiles.batch.sanitized();
        self.sources
            .retain(|s| !s.name.trim().is_empty() && !s.url.trim().is_empty());
    }
}
