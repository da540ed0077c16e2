//! PDF link discovery
//!
//! Scans an institutional syllabus page and returns the ordered,
//! URL-deduplicated list of candidate PDF links. Selector strategy covers
//! plain anchors, links inside course tables, and embedded iframes.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

use crate::config::DiscoveryConfig;
use crate::domain::Department;

/// A candidate PDF discovered on a source page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfLink {
    pub url: Url,
    pub title: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Failed to fetch source page: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Source page returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

/// Discovery collaborator interface
#[async_trait]
pub trait PdfDiscovery: Send + Sync {
    async fn discover(
        &self,
        base_url: &Url,
        department: Department,
    ) -> Result<Vec<PdfLink>, DiscoveryError>;
}

/// HTML-scraping discovery backed by reqwest + CSS selectors
pub struct HtmlPdfDiscovery {
    client: reqwest::Client,
    polisci_url: Option<Url>,
}

impl HtmlPdfDiscovery {
    pub fn new(config: &DiscoveryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to build discovery HTTP client, using default");
                reqwest::Client::new()
            });
        let polisci_url = config
            .polisci_url
            .as_deref()
            .and_then(|s| Url::parse(s).ok());
        Self {
            client,
            polisci_url,
        }
    }
}

#[async_trait]
impl PdfDiscovery for HtmlPdfDiscovery {
    async fn discover(
        &self,
        base_url: &Url,
        department: Department,
    ) -> Result<Vec<PdfLink>, DiscoveryError> {
        // The political science department publishes on one fixed page.
        let page_url = match department {
            Department::Polisci => self.polisci_url.as_ref().unwrap_or(base_url),
            Department::Arts => base_url,
        };

        tracing::info!(url = %page_url, %department, "Scanning source page for PDF links");

        let response = self.client.get(page_url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(DiscoveryError::Status(response.status()));
        }
        let body = response.text().await?;

        let links = extract_pdf_links(&body, page_url);
        tracing::info!(count = links.len(), url = %page_url, "PDF discovery finished");
        Ok(links)
    }
}

/// Extract deduplicated PDF links from a page body.
///
/// Parsing is kept synchronous and self-contained: `scraper::Html` is not
/// `Send` and must not be held across an await point.
fn extract_pdf_links(body: &str, page_url: &Url) -> Vec<PdfLink> {
    static ANCHOR_SELECTOR: OnceLock<Selector> = OnceLock::new();
    static IFRAME_SELECTOR: OnceLock<Selector> = OnceLock::new();

    let anchors = ANCHOR_SELECTOR
        .get_or_init(|| Selector::parse("a[href]").expect("static 'a[href]' CSS selector is valid"));
    let iframes = IFRAME_SELECTOR.get_or_init(|| {
        Selector::parse("iframe[src]").expect("static 'iframe[src]' CSS selector is valid")
    });

    let document = Html::parse_document(body);
    let mut seen: HashSet<Url> = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(anchors) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !is_pdf_href(href) {
            continue;
        }
        let Ok(url) = page_url.join(href) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }
        let text = anchor.text().collect::<String>();
        let title = text.trim();
        links.push(PdfLink {
            url,
            title: if title.is_empty() {
                "Untitled".to_string()
            } else {
                title.to_string()
            },
        });
    }

    for iframe in document.select(iframes) {
        let Some(src) = iframe.value().attr("src") else {
            continue;
        };
        if !is_pdf_href(src) {
            continue;
        }
        let Ok(url) = page_url.join(src) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }
        let title = iframe
            .value()
            .attr("title")
            .unwrap_or("Embedded PDF")
            .to_string();
        links.push(PdfLink { url, title });
    }

    links
}

fn is_pdf_href(href: &str) -> bool {
    // Strip query/fragment before checking the extension.
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.to_ascii_lowercase().ends_with(".pdf")
}
