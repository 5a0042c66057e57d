use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub mod env;
pub mod validation;

use env::{EnvParser, EnvVars};
use validation::ConfigValidator;

fn default_download_threads() -> usize {
    10
}

fn default_chat_timeout_seconds() -> u64 {
    30
}

fn default_request_timeout_seconds() -> u64 {
    20
}

fn default_exiftool_path() -> String {
    "exiftool".to_string()
}

fn default_delete_unscrubbed() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("ddgs-cli/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Proxy used when a command does not pass `--proxy`
    #[serde(default)]
    pub proxy: Option<String>,

    /// Worker pool size for image downloads when `--threads` is omitted
    #[serde(default = "default_download_threads")]
    pub download_threads: usize,

    /// Chat exchange timeout when `--timeout` is omitted
    #[serde(default = "default_chat_timeout_seconds")]
    pub chat_timeout_seconds: u64,

    /// Timeout for search and download requests
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Metadata tool invoked by `--remove-metadata`
    #[serde(default = "default_exiftool_path")]
    pub exiftool_path: String,

    /// Delete a downloaded file whose metadata could not be stripped
    #[serde(default = "default_delete_unscrubbed")]
    pub delete_unscrubbed: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy: None,
            download_threads: default_download_threads(),
            chat_timeout_seconds: default_chat_timeout_seconds(),
            request_timeout_seconds: default_request_timeout_seconds(),
            exiftool_path: default_exiftool_path(),
            delete_unscrubbed: default_delete_unscrubbed(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Pick up a .env file when present (development setups)
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        let config_file = match config_path {
            Some(path) => PathBuf::from(path),
            None => Self::default_config_path()?,
        };

        if config_file.exists() {
            debug!("Loading configuration from {}", config_file.display());
            let content = fs::read_to_string(&config_file)?;
            config = toml::from_str(&content)?;
        }

        // Environment variables have the highest priority
        config.load_from_env()?;
        config.validate()?;

        if !config_file.exists() {
            if let Some(parent) = config_file.parent() {
                fs::create_dir_all(parent)?;
            }
            if let Err(e) = config.save(&config_file) {
                warn!("Could not write default config to {}: {}", config_file.display(), e);
            }
        }

        Ok(config)
    }

    fn load_from_env(&mut self) -> crate::error::Result<()> {
        if let Some(proxy) = EnvParser::parse_string(EnvVars::PROXY, Some(ConfigValidator::validate_proxy))? {
            self.proxy = Some(proxy);
        }

        if let Some(threads) = EnvParser::parse_usize(EnvVars::DOWNLOAD_THREADS, 1, 256)? {
            self.download_threads = threads;
        }

        if let Some(timeout) = EnvParser::parse_u64(EnvVars::CHAT_TIMEOUT_SECONDS, 1, 3600)? {
            self.chat_timeout_seconds = timeout;
        }

        if let Some(timeout) = EnvParser::parse_u64(EnvVars::REQUEST_TIMEOUT_SECONDS, 1, 3600)? {
            self.request_timeout_seconds = timeout;
        }

        if let Some(path) = EnvParser::parse_string(EnvVars::EXIFTOOL_PATH, None)? {
            self.exiftool_path = path;
        }

        if let Some(delete) = EnvParser::parse_bool(EnvVars::DELETE_UNSCRUBBED)? {
            self.delete_unscrubbed = delete;
        }

        Ok(())
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        ConfigValidator::validate_range(self.download_threads, 1, 256, "download_threads")?;
        ConfigValidator::validate_range(self.chat_timeout_seconds, 1, 3600, "chat_timeout_seconds")?;
        ConfigValidator::validate_range(self.request_timeout_seconds, 1, 3600, "request_timeout_seconds")?;
        if let Some(ref proxy) = self.proxy {
            ConfigValidator::validate_proxy(proxy)?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn default_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "ddgs", "ddgs")
            .ok_or(crate::error::ConfigError::ProjectDirs)?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }

    /// Proxy for a command: the `--proxy` value wins over the configured one.
    /// The `tb` alias expands to the Tor Browser socks endpoint.
    pub fn resolve_proxy(&self, cli_proxy: Option<&str>) -> Option<String> {
        cli_proxy
            .map(str::to_string)
            .or_else(|| self.proxy.clone())
            .map(|proxy| expand_proxy_alias(&proxy))
    }
}

pub fn expand_proxy_alias(proxy: &str) -> String {
    if proxy == "tb" {
        "socks5://127.0.0.1:9150".to_string()
    } else {
        proxy.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.download_threads, 10);
        assert_eq!(config.chat_timeout_seconds, 30);
        assert_eq!(config.exiftool_path, "exiftool");
        assert!(config.delete_unscrubbed);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_and_write_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        // Missing file is created with defaults
        let config = Config::load(path.to_str()).unwrap();
        assert!(path.exists());
        assert_eq!(config.download_threads, 10);

        fs::write(&path, "download_threads = 4\nexiftool_path = \"/opt/exiftool\"\n").unwrap();
        let config = Config::load(path.to_str()).unwrap();
        assert_eq!(config.download_threads, 4);
        assert_eq!(config.exiftool_path, "/opt/exiftool");
        assert_eq!(config.chat_timeout_seconds, 30);
    }

    #[test]
    fn test_resolve_proxy() {
        let mut config = Config::default();
        assert_eq!(config.resolve_proxy(None), None);
        assert_eq!(
            config.resolve_proxy(Some("tb")).as_deref(),
            Some("socks5://127.0.0.1:9150")
        );

        config.proxy = Some("http://localhost:8080".to_string());
        assert_eq!(config.resolve_proxy(None).as_deref(), Some("http://localhost:8080"));
        assert_eq!(
            config.resolve_proxy(Some("socks5://other:1080")).as_deref(),
            Some("socks5://other:1080")
        );
    }
}
