//! HTTP layer: request/response models, controllers, and router assembly

pub mod controllers;
pub mod models;
pub mod routes;

use std::sync::Arc;

use crate::application::export::ExportService;
use crate::application::stages::{DownloadStage, ExtractionStage, LibraryMatchStage};
use crate::infrastructure::job_store::JobStore;

/// Shared handler state. Every collaborator is behind an `Arc` so the state
/// clones cheaply per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JobStore>,
    pub download: Arc<DownloadStage>,
    pub extraction: Arc<ExtractionStage>,
    pub library: Arc<LibraryMatchStage>,
    pub export: Arc<ExportService>,
}

pub use routes::create_router;
