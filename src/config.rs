use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_UPSTREAM_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";
pub const APP_TITLE: &str = "PlanWise Smart Task Planner";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Local,
    Remote,
    Memory,
}

impl std::str::FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("Unknown store backend: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Absence is reported per request, not at startup.
    pub openrouter_api_key: Option<String>,
    pub upstream_url: String,
    pub model: String,
    pub bind_addr: SocketAddr,
    pub referer: String,
    pub upstream_timeout: Duration,
    pub proxy_url: String,
    pub store: StoreKind,
    /// `None` when no home directory could be resolved and no override was given.
    pub history_file: Option<PathBuf>,
    pub remote_url: Option<String>,
    pub remote_auth: Option<String>,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openrouter_api_key: None,
            upstream_url: DEFAULT_UPSTREAM_URL.into(),
            model: DEFAULT_MODEL.into(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            referer: "http://localhost:3000".into(),
            upstream_timeout: Duration::from_secs(30),
            proxy_url: "http://127.0.0.1:3000/api/ai".into(),
            store: StoreKind::Local,
            history_file: default_history_file(),
            remote_url: None,
            remote_auth: None,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            openrouter_api_key: non_empty_var("OPENROUTER_API_KEY"),
            upstream_url: std::env::var("OPENROUTER_URL").unwrap_or(defaults.upstream_url),
            model: std::env::var("PLANWISE_MODEL").unwrap_or(defaults.model),
            bind_addr: match std::env::var("PLANWISE_BIND") {
                Ok(addr) => addr
                    .parse()
                    .context("PLANWISE_BIND must be a socket address like 127.0.0.1:3000")?,
                Err(_) => defaults.bind_addr,
            },
            referer: std::env::var("PLANWISE_REFERER").unwrap_or(defaults.referer),
            upstream_timeout: Duration::from_secs(
                std::env::var("PLANWISE_UPSTREAM_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".into())
                    .parse()
                    .context("PLANWISE_UPSTREAM_TIMEOUT_SECS must be a number")?,
            ),
            proxy_url: std::env::var("PLANWISE_PROXY_URL").unwrap_or(defaults.proxy_url),
            store: std::env::var("PLANWISE_STORE")
                .unwrap_or_else(|_| "local".into())
                .parse()?,
            history_file: std::env::var("PLANWISE_HISTORY_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .or(defaults.history_file),
            remote_url: non_empty_var("PLANWISE_REMOTE_URL"),
            remote_auth: non_empty_var("PLANWISE_REMOTE_AUTH"),
            log_format: match std::env::var("PLANWISE_LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        })
    }

    pub fn history_path(&self) -> Result<&Path> {
        self.history_file
            .as_deref()
            .context("Could not determine the home directory; set PLANWISE_HISTORY_FILE")
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn default_history_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".planwise").join("history.json"))
}
