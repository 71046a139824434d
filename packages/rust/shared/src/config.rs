//! Application configuration for sitechat.
//!
//! User config lives at `~/.sitechat/sitechat.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SiteChatError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sitechat.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".sitechat";

// ---------------------------------------------------------------------------
// Config structs (matching sitechat.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Crawl policies.
    #[serde(default)]
    pub crawl: CrawlSection,

    /// OpenAI-compatible engine settings.
    #[serde(default)]
    pub openai: OpenAiSection,

    /// Chunking parameters.
    #[serde(default)]
    pub chunking: ChunkSection,

    /// Question-answering parameters.
    #[serde(default)]
    pub qa: QaSection,
}

/// `[crawl]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSection {
    /// Maximum number of pages fetched per crawl.
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Politeness delay between fetches, in milliseconds.
    #[serde(default = "default_politeness_delay")]
    pub politeness_delay_ms: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum redirects followed per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Treat subdomains of the start host as in scope.
    #[serde(default)]
    pub allow_subdomains: bool,
}

impl Default for CrawlSection {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
            request_timeout_secs: default_request_timeout(),
            politeness_delay_ms: default_politeness_delay(),
            user_agent: default_user_agent(),
            max_redirects: default_max_redirects(),
            allow_subdomains: false,
        }
    }
}

fn default_page_limit() -> usize {
    30
}
fn default_request_timeout() -> u64 {
    10
}
fn default_politeness_delay() -> u64 {
    500
}
fn default_user_agent() -> String {
    concat!("sitechat/", env!("CARGO_PKG_VERSION")).into()
}
fn default_max_redirects() -> usize {
    5
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiSection {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Embedding model identifier.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Chat model identifier.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Sampling temperature for answer generation.
    #[serde(default)]
    pub temperature: f32,
}

impl Default for OpenAiSection {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            api_base: default_api_base(),
            embedding_model: default_embedding_model(),
            chat_model: default_chat_model(),
            temperature: 0.0,
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_chat_model() -> String {
    "gpt-4o-mini".into()
}

/// `[chunking]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSection {
    /// Target maximum chunk size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters of overlap carried between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkSection {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    150
}

/// `[qa]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaSection {
    /// Number of chunks retrieved per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Number of most recent conversation turns rendered into prompts.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl Default for QaSection {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            history_window: default_history_window(),
        }
    }
}

fn default_top_k() -> usize {
    4
}
fn default_history_window() -> usize {
    5
}

// ---------------------------------------------------------------------------
// Runtime configs (narrow structs handed to components)
// ---------------------------------------------------------------------------

/// Runtime crawl configuration.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum pages fetched per crawl.
    pub page_limit: usize,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Politeness delay between fetches, in milliseconds.
    pub politeness_delay_ms: u64,
    /// User-Agent header.
    pub user_agent: String,
    /// Maximum redirects followed per request.
    pub max_redirects: usize,
    /// Treat subdomains of the start host as in scope.
    pub allow_subdomains: bool,
}

impl From<&AppConfig> for CrawlConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            page_limit: config.crawl.page_limit,
            request_timeout_secs: config.crawl.request_timeout_secs,
            politeness_delay_ms: config.crawl.politeness_delay_ms,
            user_agent: config.crawl.user_agent.clone(),
            max_redirects: config.crawl.max_redirects,
            allow_subdomains: config.crawl.allow_subdomains,
        }
    }
}

/// Runtime chunking configuration.
#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    /// Target maximum chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
}

impl From<&AppConfig> for ChunkConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            chunk_size: config.chunking.chunk_size,
            chunk_overlap: config.chunking.chunk_overlap,
        }
    }
}

/// Runtime QA configuration.
#[derive(Debug, Clone, Copy)]
pub struct QaConfig {
    /// Chunks retrieved per query.
    pub top_k: usize,
    /// Conversation turns rendered into prompts.
    pub history_window: usize,
}

impl From<&AppConfig> for QaConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            top_k: config.qa.top_k,
            history_window: config.qa.history_window,
        }
    }
}

/// Runtime configuration for the embedding and language-model engines.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// API key resolved from the configured env var.
    pub api_key: String,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Chat model identifier.
    pub chat_model: String,
    /// Sampling temperature for generation.
    pub temperature: f32,
    /// Per-call timeout in seconds.
    pub request_timeout_secs: u64,
}

impl EngineConfig {
    /// Build an engine config from the app config, resolving the API key.
    /// Fails with a config error when the key env var is unset or empty.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        validate_api_key(config)?;
        let api_key = std::env::var(&config.openai.api_key_env).unwrap_or_default();
        Ok(Self {
            api_base: config.openai.api_base.clone(),
            api_key,
            embedding_model: config.openai.embedding_model.clone(),
            chat_model: config.openai.chat_model.clone(),
            temperature: config.openai.temperature,
            request_timeout_secs: config.crawl.request_timeout_secs.max(30),
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.sitechat/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SiteChatError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.sitechat/sitechat.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SiteChatError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SiteChatError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SiteChatError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SiteChatError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SiteChatError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the API key env var is set and non-empty.
///
/// Missing credentials must block startup with an operator-facing message,
/// not fail silently mid-pipeline.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    let var_name = &config.openai.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(SiteChatError::config(format!(
            "API key not found. Set the {var_name} environment variable before running sitechat."
        ))),
    }
}
