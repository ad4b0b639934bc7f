//! Server configuration, read from an optional `eduvoice.toml`.
use std::fmt;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::utils::paths::DOCUMENTS_DIR;

/// Environment variable overriding [`Config::database_url`].
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Environment variable overriding [`GeminiConfig::api_key`].
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Top-level configuration. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address to bind the HTTP server to.
    pub bind: String,
    /// Port to serve on.
    pub port: u16,
    /// sqlx connection URL, SQLite only.
    pub database_url: String,
    /// Directory uploaded files are stored under.
    pub media_root: PathBuf,
    /// Documents per page in listings.
    pub page_size: u64,
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: u64,
    /// Queue an audio conversion as soon as a document becomes ready.
    pub auto_convert: bool,
    /// Also write logs to daily files in this directory.
    pub log_dir: Option<PathBuf>,
    /// Generative AI settings.
    pub gemini: GeminiConfig,
}

/// Settings of the generative AI collaborator.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Server-side API key. AI reading is unavailable without one.
    pub api_key: Option<String>,
    /// Model name.
    pub model: String,
    /// Base URL of the REST API.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8080,
            database_url: "sqlite://eduvoice.sqlite3?mode=rwc".into(),
            media_root: PathBuf::from("media"),
            page_size: 20,
            max_upload_bytes: 10 * 1024 * 1024,
            auto_convert: true,
            log_dir: None,
            gemini: GeminiConfig::default(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            timeout_secs: 60,
        }
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter
            .debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Config {
    /// Load the configuration file at `path`, or the defaults when no path is
    /// given, then apply environment overrides.
    ///
    /// # Errors
    /// Will error if the file cannot be read or is not valid TOML.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let conf = match path {
            Some(config_path) => Self::parse(&read_to_string(config_path)?)?,
            None => Self::default(),
        };
        Ok(conf.with_overrides(
            std::env::var(DATABASE_URL_ENV).ok(),
            std::env::var(GEMINI_API_KEY_ENV).ok(),
        ))
    }

    /// Parse a TOML document.
    ///
    /// # Errors
    /// Will error if the document is not valid TOML or has mistyped fields.
    pub fn parse(config_str: &str) -> anyhow::Result<Self> {
        let conf: Self = toml::from_str(config_str)?;
        Ok(conf)
    }

    /// Replace the database URL and Gemini key with the given values, if any.
    #[must_use]
    pub fn with_overrides(mut self, database_url: Option<String>, api_key: Option<String>) -> Self {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        if let Some(key) = api_key {
            self.gemini.api_key = Some(key);
        }
        self
    }

    /// The configured Gemini key, ignoring blank values.
    #[must_use]
    pub fn gemini_api_key(&self) -> Option<&str> {
        self.gemini
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    /// Directory uploaded documents are written to.
    #[must_use]
    pub fn documents_dir(&self) -> PathBuf {
        self.media_root.join(DOCUMENTS_DIR)
    }
}
