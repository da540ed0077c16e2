//! OpenAI-compatible metadata extractor
//!
//! Works with OpenAI, Azure OpenAI, and local OpenAI-compatible servers.
//! The model is prompted for a single JSON object matching the
//! [`SyllabusMetadata`] schema.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::config::ExtractionConfig;
use crate::domain::SyllabusMetadata;

use super::{ExtractError, MetadataExtractor};

const SYSTEM_PROMPT: &str = "You extract structured metadata from university course syllabi. \
Respond with a single JSON object and nothing else. Fields: year, semester, class_name, \
class_number, instructor, university, main_topic (strings; omit a field when the syllabus \
does not state it) and reading_materials (array of objects with title, creator, type \
[book|journal_article|book_chapter|website|video|software|hardware|equipment], requirement \
[required|recommended|optional|equipment], and url when the syllabus gives one).";

/// OpenAI-compatible extraction provider
pub struct OpenAiExtractor {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout_seconds: u64,
    max_text_chars: usize,
}

impl OpenAiExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        let timeout_seconds = config.timeout_seconds;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to build LLM HTTP client with custom timeout, using default");
                reqwest::Client::new()
            });

        Self {
            client,
            api_key: config.api_key.clone().unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout_seconds,
            max_text_chars: config.max_text_chars,
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Truncate on a char boundary; syllabi front-load the metadata we need.
    fn clip<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.max_text_chars) {
            Some((idx, _)) => &text[..idx],
            None => text,
        }
    }
}

#[async_trait]
impl MetadataExtractor for OpenAiExtractor {
    async fn extract(&self, text: &str) -> Result<SyllabusMetadata, ExtractError> {
        if self.api_key.is_empty() {
            return Err(ExtractError::Authentication(
                "No extraction API key configured".to_string(),
            ));
        }

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: self.clip(text).to_string(),
                },
            ],
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractError::Timeout {
                        seconds: self.timeout_seconds,
                    }
                } else {
                    ExtractError::from(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => ExtractError::Authentication(body),
                429 => ExtractError::RateLimited(body),
                500..=599 => ExtractError::Unavailable(format!("HTTP {}: {}", status, body)),
                _ => ExtractError::InvalidResponse(format!("HTTP {}: {}", status, body)),
            });
        }

        let completion: ChatResponse = response.json().await.map_err(|e| {
            ExtractError::InvalidResponse(format!("Malformed completion body: {}", e))
        })?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ExtractError::InvalidResponse("Completion has no choices".to_string()))?;

        debug!(model = %self.model, bytes = content.len(), "LLM extraction response received");
        parse_metadata_json(&content)
    }
}

/// Parse the model output, tolerating markdown code fences around the JSON.
fn parse_metadata_json(content: &str) -> Result<SyllabusMetadata, ExtractError> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body)
        .map_err(|e| ExtractError::InvalidResponse(format!("Model returned invalid JSON: {}", e)))
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MaterialType, Requirement};

    #[test]
    fn parses_plain_json() {
        let content = r#"{"class_name": "World Politics", "instructor": "Dr. Vance",
            "reading_materials": [{"title": "Politics Among Nations", "creator": "Morgenthau",
            "type": "book", "requirement": "required", "url": "Unknown"}]}"#;
        let metadata = parse_metadata_json(content).unwrap();
        assert_eq!(metadata.class_name.as_deref(), Some("World Politics"));
        let materials = metadata.reading_materials.unwrap();
        assert_eq!(materials[0].material_type, MaterialType::Book);
        assert_eq!(materials[0].requirement, Requirement::Required);
        assert_eq!(materials[0].url, None);
    }

    #[test]
    fn parses_fenced_json() {
        let content = "```json\n{\"year\": \"2025\"}\n```";
        let metadata = parse_metadata_json(content).unwrap();
        assert_eq!(metadata.year.as_deref(), Some("2025"));
    }

    #[test]
    fn rejects_non_json() {
        let err = parse_metadata_json("I could not find any metadata.").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidResponse(_)));
        assert!(!err.is_fatal());
    }
}
