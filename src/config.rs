//! Process configuration, read from `UHURA_*` environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::domain::reader::{ReaderConfig, DEFAULT_BASE_URL, DEFAULT_MAX_DAY_ROLLOVERS};

pub const DEFAULT_PORT: u16 = 4242;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: String,
    pub port: u16,
    pub http_timeout: Duration,
    pub max_day_rollovers: u32,
    pub log_dir: Option<PathBuf>,
    pub debug_mode: bool,
    pub debug_asset: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("UHURA_API_KEY").ok_or_else(|| anyhow!("UHURA_API_KEY is required"))?;

        Ok(Self {
            api_key,
            base_url: get("UHURA_CH_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            port: parse_or(get("UHURA_PORT"), "UHURA_PORT", DEFAULT_PORT)?,
            http_timeout: Duration::from_secs(parse_or(
                get("UHURA_HTTP_TIMEOUT_SECS"),
                "UHURA_HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            max_day_rollovers: parse_or(
                get("UHURA_MAX_DAY_ROLLOVERS"),
                "UHURA_MAX_DAY_ROLLOVERS",
                DEFAULT_MAX_DAY_ROLLOVERS,
            )?,
            log_dir: get("UHURA_LOG_DIR").map(PathBuf::from),
            debug_mode: get("UHURA_DEBUG_MODE").is_some_and(|v| is_truthy(&v)),
            debug_asset: get("UHURA_DEBUG_ASSET"),
        })
    }

    pub fn reader_config(&self) -> ReaderConfig {
        ReaderConfig {
            base_url: self.base_url.clone(),
            max_day_rollovers: self.max_day_rollovers,
            ..ReaderConfig::new(self.api_key.clone())
        }
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {v:?}")),
        None => Ok(default),
    }
}

fn is_truthy(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
