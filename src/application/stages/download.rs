//! Discovery + download stage
//!
//! Discovery covers the 10-50 band of the progress bar, per-file downloads
//! the 50-100 band. Per-file failures are absorbed; only a discovery outage
//! fails the stage.

use futures_util::StreamExt;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::application::errors::AppError;
use crate::config::DiscoveryConfig;
use crate::domain::{Department, Job, JobPatch, JobStage, JobStatus, NewJob};
use crate::infrastructure::discovery::{PdfDiscovery, PdfLink};
use crate::infrastructure::downloader::{PdfFetcher, filename_for};
use crate::infrastructure::job_store::JobStore;

pub struct DownloadStage {
    store: Arc<dyn JobStore>,
    discovery: Arc<dyn PdfDiscovery>,
    fetcher: Arc<dyn PdfFetcher>,
    downloads_dir: PathBuf,
    max_downloads: usize,
    max_concurrent: usize,
}

impl DownloadStage {
    pub fn new(
        store: Arc<dyn JobStore>,
        discovery: Arc<dyn PdfDiscovery>,
        fetcher: Arc<dyn PdfFetcher>,
        downloads_dir: PathBuf,
        config: &DiscoveryConfig,
    ) -> Self {
        Self {
            store,
            discovery,
            fetcher,
            downloads_dir,
            max_downloads: config.max_downloads,
            max_concurrent: config.max_concurrent_downloads,
        }
    }

    /// Create the job record and kick off discovery in the background.
    /// Returns the pending job snapshot for the client to poll.
    pub async fn start(self: &Arc<Self>, new: NewJob) -> Result<Job, AppError> {
        let base_url = Url::parse(&new.url)
            .map_err(|e| AppError::InvalidRequest(format!("Invalid source URL: {}", e)))?;

        let job = self.store.create(new).await;
        info!(job_id = %job.id, url = %job.url, "Download job submitted");

        let stage = Arc::clone(self);
        let job_id = job.id;
        let department = job.department;
        tokio::spawn(async move {
            stage.run(job_id, base_url, department).await;
        });

        Ok(job)
    }

    async fn run(&self, job_id: Uuid, base_url: Url, department: Department) {
        if let Err(e) = self.execute(job_id, base_url, department).await {
            error!(job_id = %job_id, error = %e, "Download stage failed");
            let _ = self
                .store
                .update(
                    job_id,
                    JobPatch::new()
                        .status(JobStatus::Error)
                        .message(format!("Error: {}", e)),
                )
                .await;
        }
    }

    async fn execute(
        &self,
        job_id: Uuid,
        base_url: Url,
        department: Department,
    ) -> Result<(), AppError> {
        self.store
            .update(
                job_id,
                JobPatch::new()
                    .status(JobStatus::Downloading)
                    .progress(10)
                    .message("Scanning page for PDF links..."),
            )
            .await?;

        let links = self
            .discovery
            .discover(&base_url, department)
            .await
            .map_err(|e| AppError::CollaboratorUnavailable(e.to_string()))?;

        let total_found = links.len();
        if total_found == 0 {
            self.store
                .update(
                    job_id,
                    JobPatch::new()
                        .status(JobStatus::Completed)
                        .progress(100)
                        .files_found(0)
                        .files_downloaded(0)
                        .message("No PDF files found on the page"),
                )
                .await?;
            return Ok(());
        }

        // Same filename means same document; keep the first occurrence.
        let links = dedup_by_filename(links);
        let capped = links.len().min(self.max_downloads);
        let limit_note = if total_found > capped {
            format!(" (limited from {} found)", total_found)
        } else {
            String::new()
        };

        self.store
            .update(
                job_id,
                JobPatch::new()
                    .stage(JobStage::Download)
                    .progress(50)
                    .files_found(total_found)
                    .message(format!(
                        "Found {} PDF files{}. Starting downloads...",
                        capped, limit_note
                    )),
            )
            .await?;

        let dest_dir = self.downloads_dir.join(job_id.to_string());
        tokio::fs::create_dir_all(&dest_dir).await?;

        let done = AtomicUsize::new(0);
        let downloaded = AtomicUsize::new(0);
        let store = &self.store;
        let fetcher = &self.fetcher;
        let dest_dir = &dest_dir;

        futures_util::stream::iter(links.into_iter().take(capped))
            .for_each_concurrent(self.max_concurrent, |link| {
                let done = &done;
                let downloaded = &downloaded;
                async move {
                    match fetcher.fetch(&link, dest_dir).await {
                        Ok(path) => {
                            downloaded.fetch_add(1, Ordering::SeqCst);
                            info!(job_id = %job_id, path = %path.display(), "PDF downloaded");
                        }
                        Err(e) => {
                            warn!(job_id = %job_id, url = %link.url, error = %e, "PDF download failed");
                        }
                    }
                    let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                    let progress = 50 + (50 * finished / capped) as u8;
                    let _ = store
                        .update(
                            job_id,
                            JobPatch::new()
                                .progress(progress)
                                .files_downloaded(downloaded.load(Ordering::SeqCst))
                                .message(format!(
                                    "Downloading PDFs ({}/{})...",
                                    finished, capped
                                )),
                        )
                        .await;
                }
            })
            .await;

        let downloaded = downloaded.load(Ordering::SeqCst);
        self.store
            .update(
                job_id,
                JobPatch::new()
                    .status(JobStatus::Completed)
                    .progress(100)
                    .files_downloaded(downloaded)
                    .message(format!(
                        "Download complete! Downloaded {} of {} files{}",
                        downloaded, capped, limit_note
                    )),
            )
            .await?;

        info!(job_id = %job_id, downloaded, capped, "Download stage finished");
        Ok(())
    }
}

fn dedup_by_filename(links: Vec<PdfLink>) -> Vec<PdfLink> {
    let mut seen: HashSet<String> = HashSet::new();
    links
        .into_iter()
        .filter(|link| seen.insert(filename_for(link)))
        .collect()
}
