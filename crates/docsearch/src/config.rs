//! Configuration handling for docsearch.
//!
//! Settings come from a TOML file (default location under the XDG config
//! directory) with serde defaults on every field, so a missing or partial
//! file still yields a working configuration. The provider API key is
//! deliberately not a file setting; it is read from the environment.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use docsearch_core::{ChunkConfig, ModelConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Query configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// A missing file is not an error; defaults apply.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from an explicit path, or the default location.
    ///
    /// An explicit path must exist and parse; the default location falls
    /// back to defaults when absent.
    pub fn load_from(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => match Self::config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Default config file location.
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Sample configuration with every default spelled out.
    pub fn sample_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Check cross-field constraints a config file can violate.
    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimension == 0 {
            anyhow::bail!("[embedding] dimension must be positive");
        }
        if self.chunking.chunk_size == 0 {
            anyhow::bail!("[chunking] chunk_size must be positive");
        }
        if self.chunking.overlap >= self.chunking.chunk_size {
            anyhow::bail!(
                "[chunking] overlap {} must be smaller than chunk_size {}",
                self.chunking.overlap,
                self.chunking.chunk_size
            );
        }
        Ok(())
    }

    /// Directory holding the index snapshot and chunk catalog.
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.storage.data_dir {
            return Ok(dir.clone());
        }
        data_dir().context("Could not determine a data directory; set [storage] data_dir")
    }

    /// Chunking parameters in pipeline form.
    pub fn chunk_config(&self) -> ChunkConfig {
        ChunkConfig {
            chunk_size: self.chunking.chunk_size,
            overlap: self.chunking.overlap,
        }
    }

    /// Embedding model description in pipeline form.
    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            model_name: self.embedding.model.clone(),
            dimension: self.embedding.dimension,
        }
    }
}

/// Storage-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Data directory override (default: XDG data dir)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Embedding-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model to request
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector dimension the model must return
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Texts per provider request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// HTTP timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per batch before a transient failure surfaces
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimension() -> usize {
    1536
}

fn default_batch_size() -> usize {
    64
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// Chunking-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Chunk size (characters)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks (characters)
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_chunk_size() -> usize {
    500
}

fn default_overlap() -> usize {
    50
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

/// Query-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Default result limit
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Over-fetch multiplier compensating for ownership filtering
    #[serde(default = "default_fan_out")]
    pub fan_out: usize,
}

fn default_limit() -> usize {
    5
}

fn default_fan_out() -> usize {
    4
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            fan_out: default_fan_out(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level when no verbosity flag is given
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Get the XDG data directory for docsearch.
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("DOCSEARCH_DATA_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "docsearch").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Get the XDG config directory for docsearch.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("DOCSEARCH_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "docsearch").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Embedding provider API key from the environment.
pub fn api_key() -> Option<String> {
    std::env::var("DOCSEARCH_API_KEY")
        .or_else(|_| std::env::var("OPENAI_API_KEY"))
        .ok()
        .filter(|key| !key.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.embedding.dimension, 1536);
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.overlap, 50);
        assert_eq!(config.query.default_limit, 5);
        assert_eq!(config.query.fan_out, 4);
        assert_eq!(config.logging.level, "info");
        assert!(config.storage.data_dir.is_none());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [chunking]
            chunk_size = 200

            [embedding]
            model = "custom-model"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunking.chunk_size, 200);
        assert_eq!(config.chunking.overlap, 50);
        assert_eq!(config.embedding.model, "custom-model");
        assert_eq!(config.embedding.dimension, 1536);
        assert_eq!(config.query.default_limit, 5);
    }

    #[test]
    fn sample_toml_parses_back_to_defaults() {
        let sample = Config::sample_toml();
        let parsed: Config = toml::from_str(&sample).unwrap();

        assert_eq!(parsed.embedding.batch_size, Config::default().embedding.batch_size);
        assert_eq!(parsed.chunking.chunk_size, Config::default().chunking.chunk_size);
        assert_eq!(parsed.query.fan_out, Config::default().query.fan_out);
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[query]\ndefault_limit = 12\n").unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.query.default_limit, 12);
        assert_eq!(config.query.fan_out, 4);
    }

    #[test]
    fn load_from_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");

        assert!(Config::load_from(Some(path)).is_err());
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_dimension() {
        let config: Config = toml::from_str("[embedding]\ndimension = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_overlap_at_chunk_size() {
        let config: Config =
            toml::from_str("[chunking]\nchunk_size = 100\noverlap = 100\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_data_dir_wins() {
        let config = Config {
            storage: StorageConfig {
                data_dir: Some(PathBuf::from("/tmp/docsearch-test")),
            },
            ..Config::default()
        };

        let resolved = config.resolved_data_dir().unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/docsearch-test"));
    }

    #[test]
    fn pipeline_conversions_carry_values() {
        let config: Config = toml::from_str(
            r#"
            [chunking]
            chunk_size = 300
            overlap = 30

            [embedding]
            dimension = 768
            "#,
        )
        .unwrap();

        let chunking = config.chunk_config();
        assert_eq!(chunking.chunk_size, 300);
        assert_eq!(chunking.overlap, 30);

        let model = config.model_config();
        assert_eq!(model.dimension, 768);
        assert_eq!(model.model_name, "text-embedding-3-small");
    }
}
