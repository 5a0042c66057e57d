//! Concurrent image acquisition
//!
//! A run moves through `Querying -> Downloading -> MetadataScrub? ->
//! DedupScan? -> Done`. Results are consumed lazily and each one becomes a
//! [`DownloadTask`] on a bounded worker pool. The two clean-up passes are
//! sequential and only start once every download has been awaited.

pub mod naming;

use chrono::Local;
use futures::StreamExt;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::core::files::{remove_duplicates, DuplicateRemoval, MetadataScrubber, ScrubReport};
use crate::core::services::{DownloadTask, Downloader, ImageStream};
use crate::error::{DdgsError, PipelineError, Result};
use crate::utils::progress::ProgressUtils;

use naming::image_filename;

pub const DEFAULT_THREADS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Querying,
    Downloading,
    MetadataScrub,
    DedupScan,
    Done,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub destination: PathBuf,
    pub threads: usize,
    pub proxy: Option<String>,
    pub remove_metadata: bool,
    pub delete_duplicates: bool,
    pub exiftool: String,
    pub delete_unscrubbed: bool,
    pub show_progress: bool,
}

impl PipelineOptions {
    pub fn new(destination: PathBuf) -> Self {
        Self {
            destination,
            threads: DEFAULT_THREADS,
            proxy: None,
            remove_metadata: false,
            delete_duplicates: false,
            exiftool: "exiftool".to_string(),
            delete_unscrubbed: true,
            show_progress: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct PipelineReport {
    pub submitted: usize,
    /// Ticks the progress indicator received
    pub progress_ticks: u64,
    pub downloaded: Vec<PathBuf>,
    pub scrub: Option<ScrubReport>,
    pub duplicates: Option<Vec<DuplicateRemoval>>,
}

pub struct ImagePipeline {
    downloader: Arc<dyn Downloader>,
    options: PipelineOptions,
}

impl ImagePipeline {
    pub fn new(downloader: Arc<dyn Downloader>, options: PipelineOptions) -> Self {
        Self { downloader, options }
    }

    fn enter(&self, stage: PipelineStage) {
        debug!("Image pipeline stage: {:?}", stage);
    }

    fn submit(&self, workers: &mut JoinSet<anyhow::Result<PathBuf>>, semaphore: &Arc<Semaphore>, index: usize, url: String) {
        let task = DownloadTask {
            filename: image_filename(index, &url, Local::now()),
            url,
            destination: self.options.destination.clone(),
            proxy: self.options.proxy.clone(),
        };

        let downloader = self.downloader.clone();
        let semaphore = semaphore.clone();
        workers.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| anyhow::anyhow!("worker pool closed: {}", e))?;
            downloader
                .download(&task)
                .await
                .map_err(|e| e.context(format!("download of {} failed", task.url)))
        });
    }

    pub async fn run(&self, mut results: ImageStream<'_>) -> Result<PipelineReport> {
        let threads = self.options.threads.max(1);
        let semaphore = Arc::new(Semaphore::new(threads));
        let mut workers = JoinSet::new();
        let mut report = PipelineReport::default();
        let mut failures = Vec::new();
        let mut query_error = None;
        let mut exhausted = false;

        let progress = if self.options.show_progress {
            ProgressUtils::create_download_progress(0)
        } else {
            ProgressBar::hidden()
        };

        self.enter(PipelineStage::Querying);
        info!("Downloading images with {} workers", threads);

        // Results are submitted while earlier downloads complete; the bar
        // grows with each submission and ticks once per finished task
        loop {
            tokio::select! {
                next = results.next(), if !exhausted => match next {
                    Some(Ok(result)) => {
                        if report.submitted == 0 {
                            self.enter(PipelineStage::Downloading);
                        }
                        report.submitted += 1;
                        progress.inc_length(1);
                        self.submit(&mut workers, &semaphore, report.submitted, result.image);
                    }
                    Some(Err(e)) => {
                        error!("Image search failed after {} results: {:#}", report.submitted, e);
                        query_error = Some(e);
                        exhausted = true;
                    }
                    None => exhausted = true,
                },
                Some(joined) = workers.join_next(), if !workers.is_empty() => {
                    progress.inc(1);
                    match joined {
                        Ok(Ok(path)) => report.downloaded.push(path),
                        Ok(Err(e)) => {
                            error!("{:#}", e);
                            failures.push(format!("{:#}", e));
                        }
                        Err(e) => {
                            error!("Download worker failed: {}", e);
                            failures.push(e.to_string());
                        }
                    }
                },
                else => break,
            }
        }
        drop(results);
        report.progress_ticks = progress.position();
        progress.finish_and_clear();

        if let Some(e) = query_error {
            return Err(DdgsError::Internal(e));
        }
        if !failures.is_empty() {
            return Err(PipelineError::DownloadsFailed {
                failed: failures.len(),
                total: report.submitted,
                first_error: failures.swap_remove(0),
                progress_ticks: report.progress_ticks,
            }
            .into());
        }
        info!("Downloaded {} images to {}", report.downloaded.len(), self.options.destination.display());

        if self.options.remove_metadata {
            self.enter(PipelineStage::MetadataScrub);
            let scrubber = MetadataScrubber::new(&self.options.exiftool, self.options.delete_unscrubbed);
            report.scrub = Some(scrubber.scrub_directory(&self.options.destination).await?);
        }

        if self.options.delete_duplicates {
            self.enter(PipelineStage::DedupScan);
            info!("Checking for duplicates...");
            report.duplicates = Some(remove_duplicates(&self.options.destination)?);
        }

        self.enter(PipelineStage::Done);
        Ok(report)
    }
}
