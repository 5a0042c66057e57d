use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::core::services::{Downloader, DuckDuckGoClient, HttpDownloader};

pub struct SimpleServices {
    config: Arc<Config>,
}

impl SimpleServices {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> Arc<Config> {
        self.config.clone()
    }

    /// Command-line proxy if given, otherwise the configured one
    pub fn proxy(&self, cli_proxy: Option<&str>) -> Option<String> {
        self.config.resolve_proxy(cli_proxy)
    }

    pub fn create_search_client(&self, cli_proxy: Option<&str>) -> Result<DuckDuckGoClient> {
        let proxy = self.proxy(cli_proxy);
        DuckDuckGoClient::new(
            &self.config.user_agent,
            proxy.as_deref(),
            Duration::from_secs(self.config.request_timeout_seconds),
        )
    }

    pub fn create_downloader(&self) -> Arc<dyn Downloader> {
        Arc::new(HttpDownloader::new(
            &self.config.user_agent,
            Duration::from_secs(self.config.request_timeout_seconds),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_prefers_command_line() {
        let mut config = Config::default();
        config.proxy = Some("http://configured:8080".to_string());
        let services = SimpleServices::new(config);

        assert_eq!(services.proxy(None).as_deref(), Some("http://configured:8080"));
        assert_eq!(services.proxy(Some("tb")).as_deref(), Some("socks5://127.0.0.1:9150"));
    }

    #[test]
    fn test_search_client_builds_with_defaults() {
        let services = SimpleServices::new(Config::default());
        assert!(services.create_search_client(None).is_ok());
    }
}
