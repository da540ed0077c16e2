//! Result retrieval and export downloads

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::application::AppError;
use crate::application::export::ExportFormat;
use crate::presentation::AppState;
use crate::presentation::models::{ErrorResponse, ResultsResponse};

/// Fetch a job's results inline
#[utoipa::path(
    get,
    path = "/api/results/{id}",
    params(("id" = Uuid, Path, description = "Job identifier")),
    responses(
        (status = 200, description = "Extraction results, library-enriched when available", body = ResultsResponse),
        (status = 404, description = "Unknown job or no results yet", body = ErrorResponse)
    ),
    tag = "results"
)]
pub async fn get_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResultsResponse>, AppError> {
    let results = state.export.load(id).await?;
    Ok(Json(ResultsResponse {
        job_id: id,
        total: results.len(),
        results,
    }))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DownloadQuery {
    /// Export format; defaults to JSON.
    pub format: Option<ExportFormat>,
}

/// Download a job's results as an attachment
#[utoipa::path(
    get,
    path = "/api/download-results/{id}",
    params(
        ("id" = Uuid, Path, description = "Job identifier"),
        DownloadQuery
    ),
    responses(
        (status = 200, description = "Result file attachment"),
        (status = 404, description = "Unknown job or no results yet", body = ErrorResponse)
    ),
    tag = "results"
)]
pub async fn download_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    let format = query.format.unwrap_or(ExportFormat::Json);
    let doc = state.export.export(id, format).await?;
    Ok((
        [
            (header::CONTENT_TYPE, doc.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", doc.filename),
            ),
        ],
        doc.bytes,
    )
        .into_response())
}

/// Download a job's results as CSV
#[utoipa::path(
    get,
    path = "/api/download-csv/{id}",
    params(("id" = Uuid, Path, description = "Job identifier")),
    responses(
        (status = 200, description = "CSV attachment"),
        (status = 404, description = "Unknown job or no results yet", body = ErrorResponse)
    ),
    tag = "results"
)]
pub async fn download_csv(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let doc = state.export.export(id, ExportFormat::Csv).await?;
    Ok((
        [
            (header::CONTENT_TYPE, doc.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", doc.filename),
            ),
        ],
        doc.bytes,
    )
        .into_response())
}
