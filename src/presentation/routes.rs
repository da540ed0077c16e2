//! Route definitions and router assembly

use axum::{
    Json, Router,
    routing::{get, post},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::Config;
use crate::presentation::AppState;
use crate::presentation::controllers::{
    jobs::{check_primo, discover_syllabi, extract_metadata, get_job_status, list_jobs, metadata_fields},
    results::{download_csv, download_results, get_results},
};
use crate::presentation::models::*;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::controllers::jobs::discover_syllabi,
        crate::presentation::controllers::jobs::get_job_status,
        crate::presentation::controllers::jobs::list_jobs,
        crate::presentation::controllers::jobs::metadata_fields,
        crate::presentation::controllers::jobs::extract_metadata,
        crate::presentation::controllers::jobs::check_primo,
        crate::presentation::controllers::results::get_results,
        crate::presentation::controllers::results::download_results,
        crate::presentation::controllers::results::download_csv,
    ),
    components(
        schemas(
            DiscoverRequest,
            JobSubmittedResponse,
            JobStatusResponse,
            JobListResponse,
            MetadataFieldDto,
            MetadataFieldsResponse,
            ExtractRequest,
            StageAcceptedResponse,
            ResultsResponse,
            ErrorResponse,
            crate::domain::Department,
            crate::domain::JobStatus,
            crate::domain::JobStage,
            crate::domain::MetadataField,
            crate::domain::SyllabusMetadata,
            crate::domain::ReadingMaterial,
            crate::domain::MaterialType,
            crate::domain::Requirement,
            crate::domain::Availability,
            crate::domain::LibraryResource,
            crate::domain::LibraryMatch,
            crate::domain::ExtractedMetadata,
        )
    ),
    tags(
        (name = "jobs", description = "Syllabus discovery job submission and polling"),
        (name = "metadata", description = "Metadata field catalog, extraction, and library matching"),
        (name = "results", description = "Result retrieval and export")
    ),
    info(
        title = "Syllabus Analyzer API",
        version = "0.1.0",
        description = "Discovers syllabus PDFs on institutional pages, extracts course metadata, and cross-references reading materials against the library catalog."
    )
)]
pub struct ApiDoc;

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Create the application router with the full middleware stack
pub fn create_router(app_state: AppState, config: &Config) -> Router {
    let api_routes = Router::new()
        .route("/discover-syllabi", post(discover_syllabi))
        .route("/job-status/{id}", get(get_job_status))
        .route("/jobs", get(list_jobs))
        .route("/metadata-fields", get(metadata_fields))
        .route("/extract-metadata", post(extract_metadata))
        .route("/check-primo/{id}", post(check_primo))
        .route("/results/{id}", get(get_results))
        .route("/download-results/{id}", get(download_results))
        .route("/download-csv/{id}", get(download_csv));

    let cors_layer = build_cors_layer(config);

    let mut router = Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_check));

    // Keep interactive docs out of production deployments.
    if config.server.enable_docs {
        router =
            router.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_seconds,
        )));

    router.layer(service_builder).with_state(app_state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    let mut layer = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .max_age(Duration::from_secs(3600));

    if config.server.allowed_origins.len() == 1 && config.server.allowed_origins[0] == "*" {
        layer = layer.allow_origin(tower_http::cors::AllowOrigin::mirror_request());
    } else {
        let origins: Vec<axum::http::HeaderValue> = config
            .server
            .allowed_origins
            .iter()
            .filter_map(|origin| match axum::http::HeaderValue::from_str(origin) {
                Ok(header) => Some(header),
                Err(_) => {
                    tracing::warn!(origin, "Invalid CORS origin in config; skipping");
                    None
                }
            })
            .collect();
        layer = layer.allow_origin(origins);
    }
    layer
}
