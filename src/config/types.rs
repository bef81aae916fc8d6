use crate::{Error, Result, ollama::DEFAULT_MAX_LINE_BYTES};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Model name sent with every upstream request and reported by `GET /model`.
    #[serde(default = "default_model")]
    pub model: String,
    /// Lines buffered between the upstream reader and the response writer.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_url")]
    pub url: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Longest gap allowed between two upstream chunks before the relay gives up.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Longest upstream line accepted; a longer one ends the relay.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.relay.model.trim().is_empty() {
            return Err(Error::config("relay.model must not be empty"));
        }
        if self.relay.channel_capacity == 0 {
            return Err(Error::config("relay.channel_capacity must be at least 1"));
        }

        let url = reqwest::Url::parse(&self.upstream.url).map_err(|e| {
            Error::config(format!("upstream.url '{}' is invalid: {}", self.upstream.url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "upstream.url must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.upstream.connect_timeout_secs == 0 {
            return Err(Error::config("upstream.connect_timeout_secs must be positive"));
        }
        if self.upstream.idle_timeout_secs == 0 {
            return Err(Error::config("upstream.idle_timeout_secs must be positive"));
        }
        if self.upstream.max_line_bytes == 0 {
            return Err(Error::config("upstream.max_line_bytes must be positive"));
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logs: LogsConfig::default(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5005
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model() -> String {
    "gemma3:1b".to_string()
}

fn default_channel_capacity() -> usize {
    16
}

fn default_upstream_url() -> String {
    "http://localhost:11434/api/generate".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_idle_timeout_secs() -> u64 {
    120
}

fn default_max_line_bytes() -> usize {
    DEFAULT_MAX_LINE_BYTES
}
