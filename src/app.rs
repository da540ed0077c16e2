//! Application setup and wiring

use std::sync::Arc;

use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::application::export::ExportService;
use crate::application::stages::{DownloadStage, ExtractionStage, LibraryMatchStage};
use crate::config::Config;
use crate::infrastructure::discovery::HtmlPdfDiscovery;
use crate::infrastructure::downloader::HttpPdfFetcher;
use crate::infrastructure::extraction::heuristic::HeuristicExtractor;
use crate::infrastructure::extraction::openai::OpenAiExtractor;
use crate::infrastructure::job_store::{InMemoryJobStore, JobStore};
use crate::infrastructure::library::PrimoClient;
use crate::infrastructure::results::ResultsRepository;
use crate::presentation::{AppState, create_router};

/// Handle returned from create_app for graceful shutdown coordination
pub struct AppHandle {
    pub router: Router,
    pub shutdown_token: CancellationToken,
}

/// Build every collaborator and assemble the router.
pub async fn create_app(config: Config) -> Result<AppHandle, Box<dyn std::error::Error>> {
    tokio::fs::create_dir_all(&config.storage.downloads_dir).await?;
    tokio::fs::create_dir_all(&config.storage.results_dir).await?;

    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let discovery = Arc::new(HtmlPdfDiscovery::new(&config.discovery));
    let fetcher = Arc::new(HttpPdfFetcher::new(&config.discovery));
    let extractor = Arc::new(OpenAiExtractor::new(&config.extraction));
    let fallback = Arc::new(HeuristicExtractor::new());
    let catalog = Arc::new(PrimoClient::new(&config.library));
    let results = Arc::new(ResultsRepository::new(config.storage.results_dir.clone()));

    let download = Arc::new(DownloadStage::new(
        store.clone(),
        discovery,
        fetcher,
        config.storage.downloads_dir.clone(),
        &config.discovery,
    ));
    let extraction = Arc::new(ExtractionStage::new(
        store.clone(),
        extractor,
        fallback,
        results.clone(),
        config.storage.downloads_dir.clone(),
    ));
    let library = Arc::new(LibraryMatchStage::new(
        store.clone(),
        catalog,
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

    let router = create_router(state, &config);

    Ok(AppHandle {
        router,
        shutdown_token: CancellationToken::new(),
    })
}
