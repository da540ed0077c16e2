//! Library catalog lookup (Primo-style REST API)
//!
//! One collaborator call per reading-material title. Per-query failures are
//! absorbed by the caller; only total collaborator unavailability aborts the
//! matching stage.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::LibraryConfig;
use crate::domain::{Availability, LibraryResource};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Transport(String),

    #[error("Catalog request timed out")]
    Timeout,

    #[error("Catalog returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("Malformed catalog response: {0}")]
    Malformed(String),
}

impl CatalogError {
    /// Transport-level failures count towards the "catalog entirely
    /// unreachable" verdict; malformed payloads do not.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout | Self::Status(_))
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Catalog collaborator interface
#[async_trait]
pub trait LibraryCatalog: Send + Sync {
    /// Search the catalog by title (and creator when known), returning up to
    /// the configured number of resources. An empty vec is a valid outcome.
    async fn search(
        &self,
        title: &str,
        creator: Option<&str>,
    ) -> Result<Vec<LibraryResource>, CatalogError>;
}

/// Ex Libris Primo search client
pub struct PrimoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_results: usize,
}

impl PrimoClient {
    pub fn new(config: &LibraryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to build catalog HTTP client, using default");
                reqwest::Client::new()
            });
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            max_results: config.max_results,
        }
    }

    fn search_url(&self) -> String {
        format!("{}/primo/v1/search", self.base_url)
    }
}

#[async_trait]
impl LibraryCatalog for PrimoClient {
    async fn search(
        &self,
        title: &str,
        creator: Option<&str>,
    ) -> Result<Vec<LibraryResource>, CatalogError> {
        let mut query = format!("title,contains,{}", title);
        if let Some(creator) = creator {
            query.push_str(&format!(";creator,contains,{}", creator));
        }

        debug!(%title, "Querying library catalog");
        let response = self
            .client
            .get(self.search_url())
            .query(&[
                ("q", query.as_str()),
                ("limit", &self.max_results.to_string()),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, %title, "Catalog query rejected");
            return Err(CatalogError::Status(status));
        }

        let body: PrimoResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Malformed(e.to_string()))?;

        Ok(body
            .docs
            .into_iter()
            .take(self.max_results)
            .map(LibraryResource::from)
            .collect())
    }
}

#[derive(Deserialize, Default)]
struct PrimoResponse {
    #[serde(default)]
    docs: Vec<PrimoDoc>,
}

#[derive(Deserialize, Default)]
struct PrimoDoc {
    #[serde(default)]
    pnx: Pnx,
}

#[derive(Deserialize, Default)]
struct Pnx {
    #[serde(default)]
    display: PnxDisplay,
    #[serde(default)]
    delivery: PnxDelivery,
}

#[derive(Deserialize, Default)]
struct PnxDisplay {
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    creator: Vec<String>,
}

#[derive(Deserialize, Default)]
struct PnxDelivery {
    #[serde(default, rename = "availability")]
    availability: Vec<String>,
    #[serde(default, rename = "availabilityLinkUrl")]
    availability_link_url: Vec<String>,
}

impl From<PrimoDoc> for LibraryResource {
    fn from(doc: PrimoDoc) -> Self {
        let title = doc
            .pnx
            .display
            .title
            .into_iter()
            .next()
            .unwrap_or_else(|| "Untitled".to_string());
        let creator = doc.pnx.display.creator.into_iter().next();
        let availability = doc
            .pnx
            .delivery
            .availability
            .first()
            .map(|s| parse_availability(s))
            .unwrap_or_default();
        let link = doc
            .pnx
            .delivery
            .availability_link_url
            .into_iter()
            .next()
            .and_then(|s| Url::parse(&s).ok());

        Self {
            title,
            creator,
            availability,
            link,
        }
    }
}

/// Primo availability strings vary by institution; match loosely.
fn parse_availability(raw: &str) -> Availability {
    let lowered = raw.to_ascii_lowercase();
    if lowered.contains("available") && !lowered.contains("unavailable") {
        Availability::Available
    } else if lowered.contains("checked") || lowered.contains("loan") {
        Availability::CheckedOut
    } else {
        Availability::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_strings_match_loosely() {
        assert_eq!(parse_availability("available"), Availability::Available);
        assert_eq!(
            parse_availability("available_in_library"),
            Availability::Available
        );
        assert_eq!(parse_availability("checked_out"), Availability::CheckedOut);
        assert_eq!(parse_availability("on loan"), Availability::CheckedOut);
        assert_eq!(parse_availability("unavailable"), Availability::Unavailable);
        assert_eq!(parse_availability("lost"), Availability::Unavailable);
    }

    #[test]
    fn doc_maps_to_resource() {
        let json = r#"{
            "pnx": {
                "display": {"title": ["Politics Among Nations"], "creator": ["Morgenthau, Hans"]},
                "delivery": {"availability": ["available"], "availabilityLinkUrl": ["https://library.example.edu/record/1"]}
            }
        }"#;
        let doc: PrimoDoc = serde_json::from_str(json).unwrap();
        let resource = LibraryResource::from(doc);
        assert_eq!(resource.title, "Politics Among Nations");
        assert_eq!(resource.creator.as_deref(), Some("Morgenthau, Hans"));
        assert_eq!(resource.availability, Availability::Available);
        assert!(resource.link.is_some());
    }

    #[test]
    fn empty_doc_is_tolerated() {
        let doc: PrimoDoc = serde_json::from_str("{}").unwrap();
        let resource = LibraryResource::from(doc);
        assert_eq!(resource.title, "Untitled");
        assert_eq!(resource.availability, Availability::Unavailable);
    }

    #[test]
    fn transport_classification() {
        assert!(CatalogError::Timeout.is_transport());
        assert!(CatalogError::Status(reqwest::StatusCode::BAD_GATEWAY).is_transport());
        assert!(!CatalogError::Malformed("bad json".into()).is_transport());
    }
}
