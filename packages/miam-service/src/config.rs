//! Service configuration
//!
//! Loaded from a versioned YAML file:
//!
//! ```yaml
//! version: 1
//! database:
//!   path: ./miam.db
//! index:
//!   dir: ./miam-index      # omit to keep the index in RAM
//!   language: french
//! search:
//!   max_results: 10
//!   random_sample_size: 10
//! service:
//!   request_timeout_ms: 15000
//! logging:
//!   filter: info
//! ```
//!
//! Every section is optional and falls back to its defaults; unknown keys are
//! rejected.

use std::path::{Path, PathBuf};
use std::time::Duration;

use miam_search::{AnalyzerLanguage, IndexOptions, DEFAULT_WRITER_HEAP_BYTES};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_VERSION: u32 = 1;

/// Database path that selects a private in-memory database
pub const IN_MEMORY_DATABASE: &str = ":memory:";

/// Smallest writer heap Tantivy accepts
pub const MIN_WRITER_HEAP_BYTES: usize = 15_000_000;
const MAX_WRITER_HEAP_BYTES: usize = 4_000_000_000;

const MAX_PAGE_SIZE: usize = 1_000;
const MAX_REQUEST_TIMEOUT_MS: u64 = 600_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Range validation error
    #[error("Invalid range for field '{field}': {value} not in {min}..={max}. {hint}")]
    Range {
        field: String,
        value: String,
        min: String,
        max: String,
        hint: String,
    },

    #[error("Missing 'version' field in configuration file. Add 'version: 1' to the top of your YAML file.")]
    MissingVersion,

    #[error("Unsupported configuration version {found}. Supported versions: {}", supported.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "))]
    UnsupportedVersion { found: u32, supported: Vec<u32> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub fn range_with_hint(
        field: impl Into<String>,
        value: impl std::fmt::Display,
        min: impl std::fmt::Display,
        max: impl std::fmt::Display,
        hint: impl Into<String>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
            hint: hint.into(),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MiamConfig {
    /// Required in files; `None` only while parsing
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite file, or `:memory:`
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./miam.db"),
        }
    }
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY_DATABASE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// `None` keeps the index in RAM
    pub dir: Option<PathBuf>,
    pub language: AnalyzerLanguage,
    pub writer_heap_bytes: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: None,
            language: AnalyzerLanguage::default(),
            writer_heap_bytes: DEFAULT_WRITER_HEAP_BYTES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Recipes hydrated per search
    pub max_results: usize,
    /// Recipes returned for a search without any criteria
    pub random_sample_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 10,
            random_sample_size: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Deadline applied to calls whose context carries none
    pub request_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` wins when set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Default for MiamConfig {
    fn default() -> Self {
        Self {
            version: Some(CONFIG_VERSION),
            database: DatabaseConfig::default(),
            index: IndexConfig::default(),
            search: SearchConfig::default(),
            service: ServiceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MiamConfig {
    /// Load and validate a YAML configuration file.
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let config: MiamConfig = serde_yaml::from_str(content)?;

        match config.version {
            None => return Err(ConfigError::MissingVersion),
            Some(CONFIG_VERSION) => {}
            Some(found) => {
                return Err(ConfigError::UnsupportedVersion {
                    found,
                    supported: vec![CONFIG_VERSION],
                })
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        check_range(
            "search.max_results",
            self.search.max_results,
            1,
            MAX_PAGE_SIZE,
            "At least one recipe must be returned per search.",
        )?;
        check_range(
            "search.random_sample_size",
            self.search.random_sample_size,
            1,
            MAX_PAGE_SIZE,
            "Searches without criteria return this many random recipes.",
        )?;
        check_range(
            "index.writer_heap_bytes",
            self.index.writer_heap_bytes,
            MIN_WRITER_HEAP_BYTES,
            MAX_WRITER_HEAP_BYTES,
            "Tantivy needs at least 15MB of writer heap.",
        )?;
        check_range(
            "service.request_timeout_ms",
            self.service.request_timeout_ms,
            1,
            MAX_REQUEST_TIMEOUT_MS,
            "Use a timeout between 1ms and 10 minutes.",
        )?;
        Ok(())
    }

    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            index_dir: self.index.dir.clone(),
            language: self.index.language,
            writer_heap_bytes: self.index.writer_heap_bytes,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.service.request_timeout_ms)
    }

    /// Fully in-memory setup (database and index), handy for tests.
    pub fn in_memory() -> Self {
        Self {
            database: DatabaseConfig {
                path: PathBuf::from(IN_MEMORY_DATABASE),
            },
            ..Self::default()
        }
    }
}

fn check_range<T>(field: &str, value: T, min: T, max: T, hint: &str) -> ConfigResult<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(ConfigError::range_with_hint(field, value, min, max, hint));
    }
    Ok(())
}
