//! Server/pool/api configuration: a TOML file layer plus env var overrides.
//!
//! This is a flat, serde-loadable struct rather than a fluent typestate
//! builder — there's no multi-step construction to guard against here, so
//! configuration loads via `Default` + `merge_env` rather than a builder.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub timeout_secs: u64,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            timeout_secs: 65,
            cors_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub size: usize,
    pub warmup_url: String,
    pub restart_after_count: u64,
    pub restart_after_time_secs: u64,
    pub headless: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 4,
            warmup_url: "about:blank".to_string(),
            restart_after_count: 100,
            restart_after_time_secs: 3600,
            headless: true,
        }
    }
}

impl PoolConfig {
    pub fn restart_after_time(&self) -> Option<Duration> {
        (self.restart_after_time_secs > 0).then(|| Duration::from_secs(self.restart_after_time_secs))
    }

    pub fn restart_after_count(&self) -> Option<u64> {
        (self.restart_after_count > 0).then_some(self.restart_after_count)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub keys: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            keys: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub pool: PoolConfig,
    pub api: ApiConfig,
}

impl AppConfig {
    /// Load from an optional TOML file, then apply env var overrides.
    ///
    /// File values come first so env vars can always override them without
    /// needing to know whether a file was even loaded.
    pub fn load(file_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match file_path {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
                toml::from_str(&raw)
                    .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))?
            }
            _ => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("JSBUG_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("JSBUG_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
        }
        if let Ok(origins) = std::env::var("JSBUG_CORS_ORIGINS") {
            self.server.cors_origins = split_csv(&origins);
        }
        if let Ok(size) = std::env::var("JSBUG_POOL_SIZE")
            && let Ok(size) = size.parse()
        {
            self.pool.size = size;
        }
        if let Ok(url) = std::env::var("JSBUG_POOL_WARMUP_URL") {
            self.pool.warmup_url = url;
        }
        if let Ok(keys) = std::env::var("JSBUG_API_KEYS") {
            let keys = split_csv(&keys);
            if !keys.is_empty() {
                self.api.enabled = true;
                self.api.keys = keys;
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if !(1..=16).contains(&self.pool.size) {
            anyhow::bail!("pool.size must be in [1,16], got {}", self.pool.size);
        }
        Ok(())
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn split_csv_filters_empty_segments() {
        assert_eq!(split_csv("a, ,b,,c"), vec!["a", "b", "c"]);
    }
}
