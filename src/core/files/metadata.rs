use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::core::files::dedup::regular_files;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScrubReport {
    /// The metadata tool could not be run at all
    pub skipped: bool,
    pub scrubbed: Vec<PathBuf>,
    /// Files deleted because the tool failed on them
    pub removed: Vec<PathBuf>,
    /// Files the tool failed on that were left in place
    pub kept_unscrubbed: Vec<PathBuf>,
}

/// Strips embedded metadata with an external exiftool-compatible program
pub struct MetadataScrubber {
    program: String,
    delete_on_failure: bool,
}

impl MetadataScrubber {
    pub fn new(program: &str, delete_on_failure: bool) -> Self {
        Self {
            program: program.to_string(),
            delete_on_failure,
        }
    }

    /// Probe the tool with a bare invocation; only a missing binary counts
    /// as unavailable
    pub async fn is_available(&self) -> bool {
        match Command::new(&self.program)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
        {
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                warn!("Could not run {}: {}", self.program, e);
                false
            }
        }
    }

    async fn scrub_file(&self, path: &Path) -> Result<bool> {
        let status = Command::new(&self.program)
            .args(["-all=", "-overwrite_original", "-ext", "*"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .with_context(|| format!("running {} on {}", self.program, path.display()))?;
        Ok(status.success())
    }

    /// Strip metadata from every regular file in `dir`, one file at a time
    pub async fn scrub_directory(&self, dir: &Path) -> Result<ScrubReport> {
        let mut report = ScrubReport::default();

        if !self.is_available().await {
            warn!("{} is not installed, cannot remove metadata", self.program);
            report.skipped = true;
            return Ok(report);
        }

        info!("Removing metadata with {}...", self.program);
        for path in regular_files(dir)? {
            if self.scrub_file(&path).await? {
                debug!("Scrubbed {}", path.display());
                report.scrubbed.push(path);
            } else if self.delete_on_failure {
                warn!("Could not scrub {}, deleting it", path.display());
                tokio::fs::remove_file(&path)
                    .await
                    .with_context(|| format!("removing {}", path.display()))?;
                report.removed.push(path);
            } else {
                warn!("Could not scrub {}, keeping it", path.display());
                report.kept_unscrubbed.push(path);
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn populate(dir: &Path) -> Vec<PathBuf> {
        let files = vec![dir.join("1.jpg"), dir.join("2.jpg")];
        for file in &files {
            fs::write(file, b"jpeg").unwrap();
        }
        files
    }

    #[tokio::test]
    async fn test_missing_tool_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let files = populate(dir.path());

        let scrubber = MetadataScrubber::new("ddgs-test-no-such-exiftool", true);
        assert!(!scrubber.is_available().await);

        let report = scrubber.scrub_directory(dir.path()).await.unwrap();
        assert!(report.skipped);
        assert!(files.iter().all(|f| f.exists()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_tool_keeps_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = populate(dir.path());

        let report = MetadataScrubber::new("true", true)
            .scrub_directory(dir.path())
            .await
            .unwrap();

        assert!(!report.skipped);
        assert_eq!(report.scrubbed, files);
        assert!(files.iter().all(|f| f.exists()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_tool_deletes_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = populate(dir.path());

        let report = MetadataScrubber::new("false", true)
            .scrub_directory(dir.path())
            .await
            .unwrap();

        assert_eq!(report.removed, files);
        assert!(files.iter().all(|f| !f.exists()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_tool_keeps_files_when_deletion_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let files = populate(dir.path());

        let report = MetadataScrubber::new("false", false)
            .scrub_directory(dir.path())
            .await
            .unwrap();

        assert_eq!(report.kept_unscrubbed, files);
        assert!(files.iter().all(|f| f.exists()));
    }
}
