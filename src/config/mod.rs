//! Configuration management
//!
//! Strongly-typed configuration loaded from layered TOML files plus
//! `SYLLABUS__*` environment variables (double underscore separator).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub discovery: DiscoveryConfig,
    pub extraction: ExtractionConfig,
    pub library: LibraryConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Whether to expose interactive API docs (Swagger UI).
    pub enable_docs: bool,
    /// Global request timeout in seconds applied at the HTTP layer.
    pub request_timeout_seconds: u64,
    /// Allowed CORS origins. Use ["*"] to allow any (development only).
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_docs: true,
            request_timeout_seconds: 30,
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Filesystem layout for downloaded PDFs and persisted results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for per-job PDF download folders.
    pub downloads_dir: PathBuf,
    /// Directory for persisted extraction / library-match result files.
    pub results_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            downloads_dir: PathBuf::from("downloads"),
            results_dir: PathBuf::from("results"),
        }
    }
}

/// PDF discovery and download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Cap on how many discovered PDFs are downloaded per job.
    pub max_downloads: usize,
    /// Bounded concurrency for per-file downloads.
    pub max_concurrent_downloads: usize,
    /// Timeout for discovery page fetches and PDF downloads (seconds).
    pub request_timeout_seconds: u64,
    /// Fixed source page for the political science department.
    pub polisci_url: Option<String>,
    /// User-Agent header sent to the institutional source.
    pub user_agent: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_downloads: 5,
            max_concurrent_downloads: 3,
            request_timeout_seconds: 30,
            polisci_url: None,
            user_agent: "Mozilla/5.0 (compatible; syllabus-analyzer/0.1)".to_string(),
        }
    }
}

/// LLM metadata extraction configuration (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// API key; falls back to OPENAI_API_KEY at load time.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Bounded wait for a single completion call (seconds).
    pub timeout_seconds: u64,
    /// Syllabus text is truncated to this many characters before prompting.
    pub max_text_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "o4-mini".to_string(),
            timeout_seconds: 120,
            max_text_chars: 48_000,
        }
    }
}

/// Library catalog (Primo-style) API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Timeout for a single catalog query (seconds).
    pub timeout_seconds: u64,
    /// Maximum catalog records kept per query.
    pub max_results: usize,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api-na.hosted.exlibrisgroup.com".to_string(),
            api_key: None,
            timeout_seconds: 30,
            max_results: 3,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is not set.
    pub level: String,
    /// "pretty" or "json".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
#[error("Invalid configuration: {0}")]
pub struct ValidationError(pub String);

/// Validation hook implemented by each configuration section
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError("server.port must be non-zero".into()));
        }
        if self.request_timeout_seconds == 0 {
            return Err(ValidationError(
                "server.request_timeout_seconds must be > 0".into(),
            ));
        }
        Ok(())
    }
}

impl Validate for DiscoveryConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.max_downloads == 0 {
            return Err(ValidationError("discovery.max_downloads must be > 0".into()));
        }
        if self.max_concurrent_downloads == 0 {
            return Err(ValidationError(
                "discovery.max_concurrent_downloads must be > 0".into(),
            ));
        }
        Ok(())
    }
}

impl Validate for ExtractionConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_seconds == 0 {
            return Err(ValidationError("extraction.timeout_seconds must be > 0".into()));
        }
        if self.model.trim().is_empty() {
            return Err(ValidationError("extraction.model must be set".into()));
        }
        Ok(())
    }
}

impl Validate for LibraryConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_seconds == 0 {
            return Err(ValidationError("library.timeout_seconds must be > 0".into()));
        }
        if self.max_results == 0 {
            return Err(ValidationError("library.max_results must be > 0".into()));
        }
        Ok(())
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.discovery.validate()?;
        self.extraction.validate()?;
        self.library.validate()?;
        Ok(())
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        // Add environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        // Local config and environment variables last (highest priority)
        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("SYLLABUS").separator("__"));

        let mut config: Config = builder.build()?.try_deserialize()?;

        // Conventional env var fallback for the LLM key
        if config.extraction.api_key.is_none()
            && let Ok(key) = std::env::var("OPENAI_API_KEY")
        {
            config.extraction.api_key = Some(key);
        }

        config.validate()?;

        Ok(config)
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),
}
