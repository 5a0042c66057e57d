use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::services::SessionState;
use crate::error::ChatCacheError;

/// File-backed conversation state, stored as JSON
/// (`{"vqd": ..., "tokens": ..., "messages": [...]}`).
#[derive(Debug, Clone)]
pub struct ChatCache {
    path: PathBuf,
}

impl ChatCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Load the last persisted state; `None` when no cache file exists yet
    pub fn load(&self) -> Result<Option<SessionState>, ChatCacheError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ChatCacheError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let state = serde_json::from_str(&content).map_err(|source| ChatCacheError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        debug!("Loaded chat cache from {}", self.path.display());
        Ok(Some(state))
    }

    /// Replace the cache contents with `state`.
    ///
    /// The new contents go to a sibling `.tmp` file first and are renamed
    /// over the cache, so an interrupted write leaves the old file readable.
    pub fn save(&self, state: &SessionState) -> Result<(), ChatCacheError> {
        let content = serde_json::to_string_pretty(state)?;
        let write_err = |source| ChatCacheError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        write_synced(&tmp_path, content.as_bytes()).map_err(write_err)?;
        fs::rename(&tmp_path, &self.path).map_err(write_err)?;
        debug!("Saved chat cache to {}", self.path.display());
        Ok(())
    }
}

/// Create `path` and write `content`, synced to disk before returning
fn write_synced(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}
