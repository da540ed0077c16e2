//! Persisted result files
//!
//! Extraction writes `{job_id}_metadata.json`; the library-match stage writes
//! the enriched `{job_id}_primo_results.json` next to it. Readers always
//! prefer the enriched file when both exist.

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::domain::ExtractedMetadata;

#[derive(Debug, thiserror::Error)]
pub enum ResultsError {
    #[error("No results found for job {0}")]
    NotFound(Uuid),

    #[error("Failed to read or write results file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Results file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Filesystem repository for per-job result documents
pub struct ResultsRepository {
    results_dir: PathBuf,
}

impl ResultsRepository {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn metadata_path(&self, job_id: Uuid) -> PathBuf {
        self.results_dir.join(format!("{}_metadata.json", job_id))
    }

    pub fn primo_path(&self, job_id: Uuid) -> PathBuf {
        self.results_dir
            .join(format!("{}_primo_results.json", job_id))
    }

    pub async fn save_metadata(
        &self,
        job_id: Uuid,
        results: &[ExtractedMetadata],
    ) -> Result<PathBuf, ResultsError> {
        let path = self.metadata_path(job_id);
        self.write(&path, results).await?;
        Ok(path)
    }

    pub async fn save_primo(
        &self,
        job_id: Uuid,
        results: &[ExtractedMetadata],
    ) -> Result<PathBuf, ResultsError> {
        let path = self.primo_path(job_id);
        self.write(&path, results).await?;
        Ok(path)
    }

    /// Load the job's results, preferring the library-enriched document.
    pub async fn load(&self, job_id: Uuid) -> Result<Vec<ExtractedMetadata>, ResultsError> {
        for path in [self.primo_path(job_id), self.metadata_path(job_id)] {
            match tokio::fs::read(&path).await {
                Ok(bytes) => return Ok(serde_json::from_slice(&bytes)?),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(ResultsError::NotFound(job_id))
    }

    /// Load the extraction-only document, ignoring any enriched file.
    pub async fn load_metadata(
        &self,
        job_id: Uuid,
    ) -> Result<Vec<ExtractedMetadata>, ResultsError> {
        match tokio::fs::read(self.metadata_path(job_id)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ResultsError::NotFound(job_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn has_metadata(&self, job_id: Uuid) -> bool {
        tokio::fs::try_exists(self.metadata_path(job_id))
            .await
            .unwrap_or(false)
    }

    async fn write(&self, path: &Path, results: &[ExtractedMetadata]) -> Result<(), ResultsError> {
        tokio::fs::create_dir_all(&self.results_dir).await?;
        let bytes = serde_json::to_vec_pretty(results)?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}
