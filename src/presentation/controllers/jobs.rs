//! Job submission, polling, and stage triggers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use crate::application::AppError;
use crate::application::stages::Ack;
use crate::domain::{MetadataField, NewJob};
use crate::presentation::AppState;
use crate::presentation::models::{
    DiscoverRequest, ErrorResponse, ExtractRequest, JobListResponse, JobStatusResponse,
    JobSubmittedResponse, MetadataFieldDto, MetadataFieldsResponse, StageAcceptedResponse,
};

/// Submit a new syllabus discovery job
#[utoipa::path(
    post,
    path = "/api/discover-syllabi",
    request_body = DiscoverRequest,
    responses(
        (status = 202, description = "Job accepted, poll job-status for progress", body = JobSubmittedResponse),
        (status = 400, description = "Invalid source URL", body = ErrorResponse)
    ),
    tag = "jobs"
)]
pub async fn discover_syllabi(
    State(state): State<AppState>,
    Json(request): Json<DiscoverRequest>,
) -> Result<(StatusCode, Json<JobSubmittedResponse>), AppError> {
    let job = state
        .download
        .start(NewJob {
            url: request.url,
            job_name: request.job_name,
            department: request.department,
        })
        .await?;
    Ok((StatusCode::ACCEPTED, Json(job.into())))
}

/// Poll the status of a job
#[utoipa::path(
    get,
    path = "/api/job-status/{id}",
    params(("id" = Uuid, Path, description = "Job identifier")),
    responses(
        (status = 200, description = "Current job snapshot", body = JobStatusResponse),
        (status = 404, description = "Unknown job id", body = ErrorResponse)
    ),
    tag = "jobs"
)]
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobStatusResponse>, AppError> {
    let job = state.store.get(id).await?;
    Ok(Json(job.into()))
}

/// List all known jobs in creation order
#[utoipa::path(
    get,
    path = "/api/jobs",
    responses((status = 200, description = "All jobs", body = JobListResponse)),
    tag = "jobs"
)]
pub async fn list_jobs(State(state): State<AppState>) -> Json<JobListResponse> {
    let jobs: Vec<JobStatusResponse> = state
        .store
        .list()
        .await
        .into_iter()
        .map(JobStatusResponse::from)
        .collect();
    let total = jobs.len();
    Json(JobListResponse { jobs, total })
}

/// Catalog of selectable metadata fields
#[utoipa::path(
    get,
    path = "/api/metadata-fields",
    responses((status = 200, description = "Selectable fields", body = MetadataFieldsResponse)),
    tag = "metadata"
)]
pub async fn metadata_fields() -> Json<MetadataFieldsResponse> {
    Json(MetadataFieldsResponse {
        fields: MetadataField::ALL
            .into_iter()
            .map(MetadataFieldDto::from)
            .collect(),
    })
}

/// Trigger metadata extraction on a completed download job
#[utoipa::path(
    post,
    path = "/api/extract-metadata",
    request_body = ExtractRequest,
    responses(
        (status = 202, description = "Extraction started", body = StageAcceptedResponse),
        (status = 404, description = "Unknown job id", body = ErrorResponse),
        (status = 409, description = "Downloads not finished or already processing", body = ErrorResponse)
    ),
    tag = "metadata"
)]
pub async fn extract_metadata(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<(StatusCode, Json<StageAcceptedResponse>), AppError> {
    state
        .extraction
        .start(request.job_id, request.selected_fields)
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(StageAcceptedResponse {
            job_id: request.job_id,
            status: crate::domain::JobStatus::Processing,
            message: "Metadata extraction started".to_string(),
        }),
    ))
}

/// Trigger library catalog matching on extracted results
#[utoipa::path(
    post,
    path = "/api/check-primo/{id}",
    params(("id" = Uuid, Path, description = "Job identifier")),
    responses(
        (status = 202, description = "Matching started, or already in flight", body = StageAcceptedResponse),
        (status = 404, description = "Unknown job id", body = ErrorResponse),
        (status = 409, description = "Extraction results missing or reading materials not selected", body = ErrorResponse)
    ),
    tag = "metadata"
)]
pub async fn check_primo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<StageAcceptedResponse>), AppError> {
    let ack = state.library.start(id).await?;
    let (job, message) = match ack {
        Ack::Started(job) => (job, "Library matching started".to_string()),
        Ack::AlreadyRunning(job) => (job, "Library matching already running".to_string()),
    };
    Ok((
        StatusCode::ACCEPTED,
        Json(StageAcceptedResponse {
            job_id: job.id,
            status: job.status,
            message,
        }),
    ))
}
