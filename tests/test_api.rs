//! HTTP surface tests: routing, status codes, and response shapes

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

use syllabus_analyzer::Config;
use syllabus_analyzer::application::export::ExportService;
use syllabus_analyzer::application::stages::{DownloadStage, ExtractionStage, LibraryMatchStage};
use syllabus_analyzer::domain::Department;
use syllabus_analyzer::infrastructure::discovery::{DiscoveryError, PdfDiscovery, PdfLink};
use syllabus_analyzer::infrastructure::downloader::{FetchError, PdfFetcher};
use syllabus_analyzer::infrastructure::extraction::{ExtractError, MetadataExtractor};
use syllabus_analyzer::infrastructure::job_store::{InMemoryJobStore, JobStore};
use syllabus_analyzer::infrastructure::library::{CatalogError, LibraryCatalog};
use syllabus_analyzer::infrastructure::results::ResultsRepository;
use syllabus_analyzer::presentation::{AppState, create_router};

struct EmptyDiscovery;

#[async_trait]
impl PdfDiscovery for EmptyDiscovery {
    async fn discover(
        &self,
        _base_url: &Url,
        _department: Department,
    ) -> Result<Vec<PdfLink>, DiscoveryError> {
        Ok(Vec::new())
    }
}

struct NoopFetcher;

#[async_trait]
impl PdfFetcher for NoopFetcher {
    async fn fetch(&self, _link: &PdfLink, _dest_dir: &Path) -> Result<PathBuf, FetchError> {
        Err(FetchError::EmptyBody)
    }
}

struct NoopExtractor;

#[async_trait]
impl MetadataExtractor for NoopExtractor {
    async fn extract(
        &self,
        _text: &str,
    ) -> Result<syllabus_analyzer::domain::SyllabusMetadata, ExtractError> {
        Ok(Default::default())
    }
}

struct NoopCatalog;

#[async_trait]
impl LibraryCatalog for NoopCatalog {
    async fn search(
        &self,
        _title: &str,
        _creator: Option<&str>,
    ) -> Result<Vec<syllabus_analyzer::domain::LibraryResource>, CatalogError> {
        Ok(Vec::new())
    }
}

fn test_router(tmp: &tempfile::TempDir) -> Router {
    let config = Config::default();
    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let downloads_dir = tmp.path().join("downloads");
    let results = Arc::new(ResultsRepository::new(tmp.path().join("results")));

    let download = Arc::new(DownloadStage::new(
        store.clone(),
        Arc::new(EmptyDiscovery),
        Arc::new(NoopFetcher),
        downloads_dir.clone(),
        &config.discovery,
    ));
    let extraction = Arc::new(ExtractionStage::new(
        store.clone(),
        Arc::new(NoopExtractor),
        Arc::new(NoopExtractor),
        results.clone(),
        downloads_dir,
    ));
    let library = Arc::new(LibraryMatchStage::new(
        store.clone(),
        Arc::new(NoopCatalog),
        results.clone(),
    ));
    let export = Arc::new(ExportService::new(results));

    let state = AppState {
        store,
        download,
        extraction,
        library,
        export,
    };
    create_router(state, &config)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let tmp = tempfile::tempdir().unwrap();
    let response = test_router(&tmp)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn discover_returns_202_with_job_id() {
    let tmp = tempfile::tempdir().unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/api/discover-syllabi")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "url": "https://arts.example.edu/syllabi/",
                "job_name": "fall-check",
                "department": "arts"
            })
            .to_string(),
        ))
        .unwrap();

    let response = test_router(&tmp).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = body_json(response).await;
    assert!(body["job_id"].as_str().is_some());
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn discover_rejects_bad_url() {
    let tmp = tempfile::tempdir().unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/api/discover-syllabi")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "url": "not a url" }).to_string()))
        .unwrap();

    let response = test_router(&tmp).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn job_status_unknown_id_is_404() {
    let tmp = tempfile::tempdir().unwrap();
    let response = test_router(&tmp)
        .oneshot(
            Request::builder()
                .uri(format!("/api/job-status/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn jobs_list_starts_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let response = test_router(&tmp)
        .oneshot(
            Request::builder()
                .uri("/api/jobs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 0);
    assert_eq!(body["jobs"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn metadata_fields_lists_the_full_catalog() {
    let tmp = tempfile::tempdir().unwrap();
    let response = test_router(&tmp)
        .oneshot(
            Request::builder()
                .uri("/api/metadata-fields")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let fields = body["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 8);
    assert!(fields.iter().any(|f| f["id"] == "reading_materials"));
    assert!(fields.iter().all(|f| f["label"].as_str().is_some()));
}

#[tokio::test]
async fn extract_metadata_unknown_job_is_404() {
    let tmp = tempfile::tempdir().unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/api/extract-metadata")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "job_id": Uuid::new_v4(),
                "selected_fields": ["instructor"]
            })
            .to_string(),
        ))
        .unwrap();

    let response = test_router(&tmp).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn check_primo_unknown_job_is_404() {
    let tmp = tempfile::tempdir().unwrap();
    let response = test_router(&tmp)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/check-primo/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn results_unknown_job_is_404() {
    let tmp = tempfile::tempdir().unwrap();
    let response = test_router(&tmp)
        .oneshot(
            Request::builder()
                .uri(format!("/api/results/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn download_results_sets_attachment_headers() {
    let tmp = tempfile::tempdir().unwrap();
    let results = ResultsRepository::new(tmp.path().join("results"));
    let job_id = Uuid::new_v4();
    results.save_metadata(job_id, &[]).await.unwrap();

    let response = test_router(&tmp)
        .oneshot(
            Request::builder()
                .uri(format!("/api/download-results/{}?format=csv", job_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "text/csv"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename="));
    assert!(disposition.contains(&job_id.to_string()));
}

#[tokio::test]
async fn download_csv_route_matches_query_variant() {
    let tmp = tempfile::tempdir().unwrap();
    let results = ResultsRepository::new(tmp.path().join("results"));
    let job_id = Uuid::new_v4();
    results.save_metadata(job_id, &[]).await.unwrap();

    let response = test_router(&tmp)
        .oneshot(
            Request::builder()
                .uri(format!("/api/download-csv/{}", job_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("filename,year,semester"));
}
