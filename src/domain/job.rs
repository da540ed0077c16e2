//! Job lifecycle entities and the status/stage state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;
use uuid::Uuid;

use super::metadata::MetadataField;

/// Department selecting which discovery configuration drives the scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    #[default]
    Arts,
    Polisci,
}

impl std::fmt::Display for Department {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Arts => write!(f, "arts"),
            Self::Polisci => write!(f, "polisci"),
        }
    }
}

/// Pipeline phase a job is currently working through.
///
/// Clients must branch on this field rather than sniffing `message` text;
/// `message` is purely for human display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    #[default]
    Discovery,
    Download,
    Extraction,
    LibraryMatch,
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discovery => write!(f, "discovery"),
            Self::Download => write!(f, "download"),
            Self::Extraction => write!(f, "extraction"),
            Self::LibraryMatch => write!(f, "library_match"),
        }
    }
}

/// Job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job record created, no stage running yet
    #[default]
    Pending,
    /// Discovery + download stage in flight
    Downloading,
    /// Extraction or library-match stage in flight (see `JobStage`)
    Processing,
    /// Most recently triggered stage finished successfully
    Completed,
    /// A stage failed; `message` carries the cause
    Error,
    /// Unrecoverable failure
    Failed,
}

impl JobStatus {
    /// Returns the set of valid target states from the current state.
    ///
    /// ```text
    /// Pending ──► Downloading ──► Completed ──► Processing ──► Completed
    ///    │             │              ▲             │
    ///    └──► Error ◄──┘──────────────┼─────────────┘──► Error
    ///              (retrigger) ───────┘
    /// ```
    ///
    /// `Completed` is re-entrant between stages: the client triggers the
    /// next stage explicitly, moving the job back into `Processing`.
    /// `Error` allows retriggering the failed stage from scratch.
    pub fn valid_transitions(&self) -> &[JobStatus] {
        match self {
            Self::Pending => &[Self::Downloading, Self::Error, Self::Failed],
            Self::Downloading => &[Self::Completed, Self::Error, Self::Failed],
            Self::Processing => &[Self::Completed, Self::Error, Self::Failed],
            Self::Completed => &[Self::Processing],
            Self::Error => &[Self::Downloading, Self::Processing],
            Self::Failed => &[],
        }
    }

    /// Check whether transitioning to `target` is allowed from the current state.
    pub fn can_transition_to(&self, target: &JobStatus) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Whether a polling client should stop waiting on this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Downloading => write!(f, "downloading"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Fields supplied at job submission
#[derive(Debug, Clone)]
pub struct NewJob {
    pub url: String,
    pub job_name: Option<String>,
    pub department: Department,
}

/// One end-to-end syllabus analysis run
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub stage: JobStage,
    /// 0-100, meaningful within the currently active stage only
    pub progress: u8,
    /// Human-readable description of current activity; last write wins
    pub message: String,
    pub url: String,
    pub department: Department,
    pub job_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_found: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_downloaded: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_processed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_fields: Option<Vec<MetadataField>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub results_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub primo_results_file: Option<PathBuf>,
}

impl Job {
    pub fn new(new: NewJob) -> Self {
        let created_at = Utc::now();
        let job_name = new
            .job_name
            .unwrap_or_else(|| format!("Job_{}", created_at.format("%Y%m%d_%H%M%S")));
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Pending,
            stage: JobStage::Discovery,
            progress: 0,
            message: "Starting PDF discovery...".to_string(),
            url: new.url,
            department: new.department,
            job_name,
            created_at,
            files_found: None,
            files_downloaded: None,
            files_processed: None,
            selected_fields: None,
            results_file: None,
            primo_results_file: None,
        }
    }

    /// Merge a partial update into the record.
    ///
    /// Guards the observable invariants: `progress` never decreases while the
    /// status and stage are unchanged and non-terminal, and the file counters
    /// never decrease. `message` is overwritten unconditionally.
    pub fn apply(&mut self, patch: JobPatch) {
        let stage_boundary = patch.status.is_some_and(|s| s != self.status)
            || patch.stage.is_some_and(|s| s != self.stage);

        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(stage) = patch.stage {
            self.stage = stage;
        }
        if let Some(progress) = patch.progress {
            self.progress = if stage_boundary {
                progress.min(100)
            } else {
                self.progress.max(progress.min(100))
            };
        }
        if let Some(message) = patch.message {
            self.message = message;
        }
        if let Some(found) = patch.files_found {
            self.files_found = Some(self.files_found.unwrap_or(0).max(found));
        }
        if let Some(downloaded) = patch.files_downloaded {
            self.files_downloaded = Some(self.files_downloaded.unwrap_or(0).max(downloaded));
        }
        if let Some(processed) = patch.files_processed {
            self.files_processed = Some(self.files_processed.unwrap_or(0).max(processed));
        }
        if let Some(fields) = patch.selected_fields {
            self.selected_fields = Some(fields);
        }
        if let Some(path) = patch.results_file {
            self.results_file = Some(path);
        }
        if let Some(path) = patch.primo_results_file {
            self.primo_results_file = Some(path);
        }
    }
}

/// Partial update merged into a job record by [`Job::apply`]
#[derive(Debug, Clone, Default)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub stage: Option<JobStage>,
    pub progress: Option<u8>,
    pub message: Option<String>,
    pub files_found: Option<usize>,
    pub files_downloaded: Option<usize>,
    pub files_processed: Option<usize>,
    pub selected_fields: Option<Vec<MetadataField>>,
    pub results_file: Option<PathBuf>,
    pub primo_results_file: Option<PathBuf>,
}

impl JobPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn stage(mut self, stage: JobStage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn files_found(mut self, count: usize) -> Self {
        self.files_found = Some(count);
        self
    }

    pub fn files_downloaded(mut self, count: usize) -> Self {
        self.files_downloaded = Some(count);
        self
    }

    pub fn files_processed(mut self, count: usize) -> Self {
        self.files_processed = Some(count);
        self
    }

    pub fn selected_fields(mut self, fields: Vec<MetadataField>) -> Self {
        self.selected_fields = Some(fields);
        self
    }

    pub fn results_file(mut self, path: PathBuf) -> Self {
        self.results_file = Some(path);
        self
    }

    pub fn primo_results_file(mut self, path: PathBuf) -> Self {
        self.primo_results_file = Some(path);
        self
    }
}
