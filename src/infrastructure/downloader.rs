//! Per-file PDF download with filename sanitization

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::DiscoveryConfig;

use super::discovery::PdfLink;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Download request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Download returned an empty body")]
    EmptyBody,

    #[error("Failed to write file: {0}")]
    Io(#[from] std::io::Error),
}

/// Download collaborator interface: fetch one PDF into `dest_dir`, returning
/// the path it was written to.
#[async_trait]
pub trait PdfFetcher: Send + Sync {
    async fn fetch(&self, link: &PdfLink, dest_dir: &Path) -> Result<PathBuf, FetchError>;
}

/// reqwest-backed fetcher
pub struct HttpPdfFetcher {
    client: reqwest::Client,
}

impl HttpPdfFetcher {
    pub fn new(config: &DiscoveryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to build download HTTP client, using default");
                reqwest::Client::new()
            });
        Self { client }
    }
}

#[async_trait]
impl PdfFetcher for HttpPdfFetcher {
    async fn fetch(&self, link: &PdfLink, dest_dir: &Path) -> Result<PathBuf, FetchError> {
        let response = self.client.get(link.url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        let filename = filename_for(link);
        let dest = dest_dir.join(&filename);
        tokio::fs::write(&dest, &bytes).await?;

        tracing::debug!(url = %link.url, path = %dest.display(), size = bytes.len(), "PDF downloaded");
        Ok(dest)
    }
}

/// Filename a link will be stored under, derived from the URL path and
/// sanitized for the local filesystem. Used by the download stage for
/// duplicate detection before fetching.
pub fn filename_for(link: &PdfLink) -> String {
    let raw = link
        .url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .unwrap_or("syllabus.pdf");
    let mut name = sanitize_filename(raw);
    if !name.to_ascii_lowercase().ends_with(".pdf") {
        name.push_str(".pdf");
    }
    name
}

/// Replace filesystem-hostile characters and cap the length.
fn sanitize_filename(raw: &str) -> String {
    const MAX_LEN: usize = 150;
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim_matches(['.', ' ']);
    let name = if trimmed.is_empty() { "syllabus" } else { trimmed };
    name.chars().take(MAX_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn link(url: &str) -> PdfLink {
        PdfLink {
            url: Url::parse(url).unwrap(),
            title: "test".to_string(),
        }
    }

    #[test]
    fn filename_taken_from_url_path() {
        let name = filename_for(&link("https://example.edu/files/PHIL%20101.pdf"));
        assert_eq!(name, "PHIL%20101.pdf");
    }

    #[test]
    fn missing_extension_is_added() {
        let name = filename_for(&link("https://example.edu/download/42"));
        assert_eq!(name, "42.pdf");
    }

    #[test]
    fn hostile_characters_are_replaced() {
        assert_eq!(sanitize_filename("a:b?c*d.pdf"), "a_b_c_d.pdf");
    }

    #[test]
    fn empty_path_falls_back() {
        let name = filename_for(&link("https://example.edu/"));
        assert_eq!(name, "syllabus.pdf");
    }
}
