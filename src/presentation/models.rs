//! API request and response models

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::AppError;
use crate::domain::{
    Department, ExtractedMetadata, Job, JobStage, JobStatus, MetadataField,
};

/// Submit a syllabus discovery job
#[derive(Debug, Deserialize, ToSchema)]
pub struct DiscoverRequest {
    /// Institutional page to scan for syllabus PDFs.
    pub url: String,
    /// Optional display name; a timestamped one is generated when absent.
    #[serde(default)]
    pub job_name: Option<String>,
    #[serde(default)]
    pub department: Department,
}

/// Acknowledgement that a job or stage was accepted
#[derive(Debug, Serialize, ToSchema)]
pub struct JobSubmittedResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub message: String,
}

impl From<Job> for JobSubmittedResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            message: job.message,
        }
    }
}

/// Poll snapshot of a job
#[derive(Debug, Serialize, ToSchema)]
pub struct JobStatusResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub stage: JobStage,
    pub progress: u8,
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
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            stage: job.stage,
            progress: job.progress,
            message: job.message,
            url: job.url,
            department: job.department,
            job_name: job.job_name,
            created_at: job.created_at,
            files_found: job.files_found,
            files_downloaded: job.files_downloaded,
            files_processed: job.files_processed,
            selected_fields: job.selected_fields,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobListResponse {
    pub jobs: Vec<JobStatusResponse>,
    pub total: usize,
}

/// One selectable metadata field, as presented to the client
#[derive(Debug, Serialize, ToSchema)]
pub struct MetadataFieldDto {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

impl From<MetadataField> for MetadataFieldDto {
    fn from(field: MetadataField) -> Self {
        Self {
            id: field.id(),
            label: field.label(),
            description: field.description(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MetadataFieldsResponse {
    pub fields: Vec<MetadataFieldDto>,
}

/// Trigger metadata extraction on a completed download job
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExtractRequest {
    pub job_id: Uuid,
    pub selected_fields: Vec<MetadataField>,
}

/// Acknowledgement for an asynchronous stage trigger
#[derive(Debug, Serialize, ToSchema)]
pub struct StageAcceptedResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub message: String,
}

/// Inline results payload
#[derive(Debug, Serialize, ToSchema)]
pub struct ResultsResponse {
    pub job_id: Uuid,
    pub total: usize,
    pub results: Vec<ExtractedMetadata>,
}

/// Error body returned by every non-2xx response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Precondition(_) => (StatusCode::CONFLICT, "precondition_failed"),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::CollaboratorUnavailable(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
            AppError::Io(_) | AppError::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: error.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewJob;

    #[test]
    fn status_response_mirrors_job() {
        let job = Job::new(NewJob {
            url: "https://arts.example.edu/syllabi/".to_string(),
            job_name: Some("fall-check".to_string()),
            department: Department::Arts,
        });
        let id = job.id;
        let response = JobStatusResponse::from(job);
        assert_eq!(response.job_id, id);
        assert_eq!(response.status, JobStatus::Pending);
        assert_eq!(response.job_name, "fall-check");
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = AppError::NotFound(Uuid::new_v4()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn precondition_maps_to_409() {
        let response = AppError::Precondition("downloads not finished".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
