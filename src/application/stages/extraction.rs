//! Metadata extraction stage
//!
//! Walks the job's downloaded PDFs in filename order. A single document the
//! extractor rejects falls back to the offline heuristic; a fatal collaborator
//! error (auth, network, timeout) aborts the whole stage.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::errors::AppError;
use crate::domain::{
    ExtractedMetadata, JobPatch, JobStage, JobStatus, MetadataField, SyllabusMetadata,
};
use crate::infrastructure::extraction::{MetadataExtractor, read_pdf_text};
use crate::infrastructure::job_store::{JobStore, JobStoreError};
use crate::infrastructure::results::ResultsRepository;

pub struct ExtractionStage {
    store: Arc<dyn JobStore>,
    extractor: Arc<dyn MetadataExtractor>,
    fallback: Arc<dyn MetadataExtractor>,
    results: Arc<ResultsRepository>,
    downloads_dir: PathBuf,
}

impl ExtractionStage {
    pub fn new(
        store: Arc<dyn JobStore>,
        extractor: Arc<dyn MetadataExtractor>,
        fallback: Arc<dyn MetadataExtractor>,
        results: Arc<ResultsRepository>,
        downloads_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            extractor,
            fallback,
            results,
            downloads_dir,
        }
    }

    /// Validate preconditions, move the job into `processing`, and spawn the
    /// extraction work.
    pub async fn start(
        self: &Arc<Self>,
        job_id: Uuid,
        selected_fields: Vec<MetadataField>,
    ) -> Result<(), AppError> {
        if selected_fields.is_empty() {
            return Err(AppError::InvalidRequest(
                "At least one metadata field must be selected".to_string(),
            ));
        }

        let job = self.store.get(job_id).await?;
        if job.files_downloaded.unwrap_or(0) == 0 {
            return Err(AppError::Precondition(
                "Job has no downloaded files to extract from".to_string(),
            ));
        }

        // Guarded entry: the store validates the transition under its write
        // lock, so concurrent triggers race for a single success.
        let transition = self
            .store
            .try_transition(
                job_id,
                JobStatus::Processing,
                JobPatch::new()
                    .stage(JobStage::Extraction)
                    .progress(0)
                    .files_processed(0)
                    .selected_fields(selected_fields.clone())
                    .message("Starting metadata extraction..."),
            )
            .await;
        match transition {
            Ok(_) => {}
            Err(JobStoreError::InvalidTransition {
                from: JobStatus::Processing,
                ..
            }) => {
                return Err(AppError::Precondition(
                    "A processing stage is already running for this job".to_string(),
                ));
            }
            Err(JobStoreError::InvalidTransition { from, .. }) => {
                return Err(AppError::Precondition(format!(
                    "Job is {} and cannot start extraction; downloads must complete first",
                    from
                )));
            }
            Err(e) => return Err(e.into()),
        }

        let stage = Arc::clone(self);
        tokio::spawn(async move {
            stage.run(job_id, selected_fields).await;
        });
        Ok(())
    }

    async fn run(&self, job_id: Uuid, selected_fields: Vec<MetadataField>) {
        if let Err(e) = self.execute(job_id, &selected_fields).await {
            error!(job_id = %job_id, error = %e, "Extraction stage failed");
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
        selected_fields: &[MetadataField],
    ) -> Result<(), AppError> {
        let pdfs = self.list_pdfs(job_id).await?;
        if pdfs.is_empty() {
            return Err(AppError::Precondition(
                "No PDF files found in the job's download directory".to_string(),
            ));
        }

        let total = pdfs.len();
        let mut extracted = Vec::with_capacity(total);

        for (i, path) in pdfs.iter().enumerate() {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("file_{}", i));

            self.store
                .update(
                    job_id,
                    JobPatch::new()
                        .progress((i * 90 / total) as u8)
                        .message(format!(
                            "Processing {} ({}/{}) - extracting text...",
                            filename,
                            i + 1,
                            total
                        )),
                )
                .await?;

            let metadata = match self.extract_one(job_id, path, &filename, total, i).await? {
                Some(mut metadata) => {
                    metadata.retain_fields(selected_fields);
                    metadata
                }
                None => SyllabusMetadata::error_marker("Could not read text from this PDF"),
            };

            extracted.push(ExtractedMetadata {
                filename,
                metadata,
                library_matches: Vec::new(),
            });
            self.store
                .update(job_id, JobPatch::new().files_processed(extracted.len()))
                .await?;
        }

        let results_file = self.results.save_metadata(job_id, &extracted).await?;

        self.store
            .update(
                job_id,
                JobPatch::new()
                    .status(JobStatus::Completed)
                    .progress(100)
                    .results_file(results_file)
                    .message(format!(
                        "Metadata extraction complete! Processed {} files",
                        total
                    )),
            )
            .await?;

        info!(job_id = %job_id, total, "Extraction stage finished");
        Ok(())
    }

    /// Extract one document. `Ok(None)` means the PDF itself was unreadable;
    /// the record becomes an error marker instead of failing the stage.
    async fn extract_one(
        &self,
        job_id: Uuid,
        path: &PathBuf,
        filename: &str,
        total: usize,
        i: usize,
    ) -> Result<Option<SyllabusMetadata>, AppError> {
        let text = match read_pdf_text(path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(job_id = %job_id, %filename, error = %e, "PDF text extraction failed");
                return Ok(None);
            }
        };

        match self.extractor.extract(&text).await {
            Ok(metadata) => Ok(Some(metadata)),
            Err(e) if e.is_fatal() => Err(AppError::CollaboratorUnavailable(e.to_string())),
            Err(e) => {
                warn!(job_id = %job_id, %filename, error = %e, "Extractor rejected document, using fallback");
                self.store
                    .update(
                        job_id,
                        JobPatch::new().message(format!(
                            "Processing {} ({}/{}) - using fallback extraction...",
                            filename,
                            i + 1,
                            total
                        )),
                    )
                    .await?;
                match self.fallback.extract(&text).await {
                    Ok(metadata) => Ok(Some(metadata)),
                    Err(fallback_err) => {
                        warn!(job_id = %job_id, %filename, error = %fallback_err, "Fallback extraction also failed");
                        Ok(Some(SyllabusMetadata::error_marker(format!(
                            "Extraction failed: {}",
                            e
                        ))))
                    }
                }
            }
        }
    }

    /// PDFs in the job's download directory, sorted by filename so processing
    /// order is deterministic.
    async fn list_pdfs(&self, job_id: Uuid) -> Result<Vec<PathBuf>, AppError> {
        let dir = self.downloads_dir.join(job_id.to_string());
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(|_| {
            AppError::Precondition("Job has no download directory; run discovery first".to_string())
        })?;

        let mut pdfs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
            {
                pdfs.push(path);
            }
        }
        pdfs.sort();
        Ok(pdfs)
    }
}
