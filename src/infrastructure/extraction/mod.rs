//! Syllabus metadata extraction
//!
//! The extraction collaborator turns syllabus text into a
//! [`SyllabusMetadata`] record. The primary implementation calls an
//! OpenAI-compatible chat endpoint; [`heuristic::HeuristicExtractor`] is the
//! offline fallback used when the LLM rejects a single document.

pub mod heuristic;
pub mod openai;

use async_trait::async_trait;
use std::path::Path;

use crate::domain::SyllabusMetadata;

/// Extraction error
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Extraction service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid extraction response: {0}")]
    InvalidResponse(String),

    #[error("Failed to read PDF text: {0}")]
    PdfText(String),
}

impl ExtractError {
    /// Errors that indicate the collaborator as a whole is unreachable.
    /// These abort the extraction stage instead of being absorbed per file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Authentication(_) | Self::Network(_) | Self::Timeout { .. } | Self::Unavailable(_)
        )
    }
}

impl From<reqwest::Error> for ExtractError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { seconds: 0 }
        } else if err.is_connect() {
            Self::Network(format!("Connection failed: {}", err))
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Extraction collaborator interface
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<SyllabusMetadata, ExtractError>;
}

/// Read the text layer of a PDF on a blocking worker thread.
pub async fn read_pdf_text(path: &Path) -> Result<String, ExtractError> {
    let path = path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
        .await
        .map_err(|e| ExtractError::PdfText(format!("Extraction task panicked: {}", e)))?
        .map_err(|e| ExtractError::PdfText(e.to_string()))?;

    if text.trim().is_empty() {
        return Err(ExtractError::PdfText("PDF has no extractable text".to_string()));
    }
    Ok(text)
}
