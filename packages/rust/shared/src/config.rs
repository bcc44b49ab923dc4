//! Application configuration for Lectern.
//!
//! User config lives at `~/.lectern/lectern.toml`. The file stores the
//! *names* of the env vars holding API keys, never the keys themselves.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LecternError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "lectern.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".lectern";

// ---------------------------------------------------------------------------
// Config structs (matching lectern.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Generative-language API settings.
    #[serde(default)]
    pub genai: GenAiConfig,

    /// Web/image search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Note-generation pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory for uploaded audio/slide files.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,

    /// Path to the server database file.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Name of the env var holding the JWT signing secret.
    #[serde(default = "default_jwt_secret_env")]
    pub jwt_secret_env: String,

    /// Access token lifetime in hours.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            uploads_dir: default_uploads_dir(),
            db_path: default_db_path(),
            jwt_secret_env: default_jwt_secret_env(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}
fn default_uploads_dir() -> String {
    "uploads".into()
}
fn default_db_path() -> String {
    "lectern.db".into()
}
fn default_jwt_secret_env() -> String {
    "LECTERN_JWT_SECRET".into()
}
fn default_token_ttl_hours() -> u64 {
    24
}

/// `[genai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenAiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_genai_key_env")]
    pub api_key_env: String,

    /// Model for the initial outline pass.
    #[serde(default = "default_outline_model")]
    pub outline_model: String,

    /// Model for timestamping, notes, key terms, and research passes.
    #[serde(default = "default_notes_model")]
    pub notes_model: String,
}

impl Default for GenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_genai_key_env(),
            outline_model: default_outline_model(),
            notes_model: default_notes_model(),
        }
    }
}

fn default_genai_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_outline_model() -> String {
    "gemini-2.5-flash-preview-04-17".into()
}
fn default_notes_model() -> String {
    "gemini-2.0-flash".into()
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Name of the env var holding the search API key.
    #[serde(default = "default_genai_key_env")]
    pub api_key_env: String,

    /// Name of the env var holding the custom search engine ID.
    #[serde(default = "default_engine_id_env")]
    pub engine_id_env: String,

    /// How many scraped sites feed each key-term summary.
    #[serde(default = "default_num_results")]
    pub num_results: usize,

    /// Search attempts before giving up.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Randomized backoff window between attempts, in milliseconds.
    #[serde(default = "default_backoff_min_ms")]
    pub backoff_min_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_genai_key_env(),
            engine_id_env: default_engine_id_env(),
            num_results: default_num_results(),
            retries: default_retries(),
            backoff_min_ms: default_backoff_min_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

fn default_engine_id_env() -> String {
    "SEARCH_ENGINE_ID".into()
}
fn default_num_results() -> usize {
    3
}
fn default_retries() -> u32 {
    3
}
fn default_backoff_min_ms() -> u64 {
    2000
}
fn default_backoff_max_ms() -> u64 {
    5000
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Working directory holding transcripts and stage artifacts.
    #[serde(default = "default_workdir")]
    pub workdir: String,

    /// Maximum characters per chunk fed to the summarization model.
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workdir: default_workdir(),
            max_chunk_chars: default_max_chunk_chars(),
        }
    }
}

fn default_workdir() -> String {
    "text_files".into()
}
fn default_max_chunk_chars() -> usize {
    500_000
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.lectern/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LecternError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.lectern/lectern.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| LecternError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| LecternError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LecternError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LecternError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LecternError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a required secret from the env var a config field names.
pub fn secret_from_env(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(LecternError::config(format!(
            "required secret not found: set the {var_name} environment variable"
        ))),
    }
}

/// Check that the generative API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    secret_from_env(&config.genai.api_key_env).map(|_| ())
}
