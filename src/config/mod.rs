//! Pipeline Configuration
//!
//! One explicit `KbConfig` struct passed to constructors, with no process-wide
//! mutable defaults. Loaded from a TOML file when present, otherwise
//! built-in defaults; CLI flags override individual fields at the binary
//! boundary.
//!
//! ## Loading order
//!
//! 1. Explicit `--config <path>` flag
//! 2. `engine_kb.toml` in the current working directory
//! 3. Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default config file name searched in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "engine_kb.toml";

/// Errors loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Knowledge-pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KbConfig {
    /// Embedding dimension for the vector store and fallback embedder
    pub embedding_dim: usize,
    /// Base path for the persisted index pair (`.index` / `.meta.json`)
    pub index_path: PathBuf,
    /// Specification document to segment and embed
    pub spec_path: PathBuf,
    /// Sensor CSV for window ingestion
    pub sensor_csv: PathBuf,
    /// HTTP listen address for the status API
    pub api_addr: String,
    /// Sliding-window length in readings
    pub window_size: usize,
    /// Window start offset increment
    pub stride: usize,
    /// Graph upsert batch size
    pub batch_size: usize,
}

impl Default for KbConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 128,
            index_path: PathBuf::from("data/spec_store"),
            spec_path: PathBuf::from("data_sources/engine_spec_data.doc"),
            sensor_csv: PathBuf::from("data_sources/synthetic_engine_data.csv"),
            api_addr: "0.0.0.0:8000".to_string(),
            window_size: 200,
            stride: 50,
            batch_size: 500,
        }
    }
}

impl KbConfig {
    /// Load from an explicit path, or `engine_kb.toml` in the working
    /// directory, or defaults. Only an explicitly named file is required to
    /// exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Self::from_file(default_path);
        }

        debug!("No config file found; using built-in defaults");
        Ok(Self::default())
    }

    /// Parse a specific TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = KbConfig::default();
        assert_eq!(config.embedding_dim, 128);
        assert_eq!(config.window_size, 200);
        assert_eq!(config.stride, 50);
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "embedding_dim = 64\nwindow_size = 10").unwrap();

        let config = KbConfig::from_file(file.path()).unwrap();
        assert_eq!(config.embedding_dim, 64);
        assert_eq!(config.window_size, 10);
        // Unspecified fields keep defaults.
        assert_eq!(config.stride, 50);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = KbConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "embedding_dim = \"not a number\"").unwrap();
        assert!(matches!(
            KbConfig::from_file(file.path()).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }
}
