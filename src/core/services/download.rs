use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// One file to fetch into the destination directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub url: String,
    pub destination: PathBuf,
    pub filename: String,
    pub proxy: Option<String>,
}

impl DownloadTask {
    pub fn target_path(&self) -> PathBuf {
        self.destination.join(&self.filename)
    }
}

#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch `task.url` into `task.target_path()` and return that path
    async fn download(&self, task: &DownloadTask) -> Result<PathBuf>;
}

/// HTTP downloader keeping one client per proxy
pub struct HttpDownloader {
    user_agent: String,
    timeout: Duration,
    clients: Mutex<HashMap<Option<String>, reqwest::Client>>,
}

impl HttpDownloader {
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            timeout,
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn client_for(&self, proxy: Option<&str>) -> Result<reqwest::Client> {
        let key = proxy.map(str::to_string);
        let mut clients = self
            .clients
            .lock()
            .map_err(|_| anyhow::anyhow!("download client cache poisoned"))?;

        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str());
        if let Some(proxy) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        let client = builder.build().context("Failed to create download client")?;
        clients.insert(key, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, task: &DownloadTask) -> Result<PathBuf> {
        // The cache lock is released before any network I/O
        let client = self.client_for(task.proxy.as_deref())?;

        debug!("Downloading {}", task.url);
        let response = client
            .get(&task.url)
            .send()
            .await
            .with_context(|| format!("GET {}", task.url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("GET {} returned {}", task.url, status);
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("reading body of {}", task.url))?;
        let path = task.target_path();
        write_file(&path, &bytes).await?;
        Ok(path)
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))
}
