use crate::error::ConfigError;
use crate::logging::{LogFormat, LogLevel};
use serde::Deserialize;

/// Blob-storage container that hosts the assessment databases.
pub const DEFAULT_BASE_URL: &str =
    "https://techassessment.blob.core.windows.net/aiap18-assessment-data";

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub data_source: DataSourceConfig,
}

/// Contains parameters for the process-wide logger.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Minimum severity written to both console and file. `RUST_LOG` wins if set.
    pub level: LogLevel,
    /// Line layout shared by both outputs.
    pub format: LogFormat,
    /// Directory holding the log file. Created on demand.
    pub directory: String,
    /// Name of the (non-rotating) log file inside `directory`.
    pub file_name: String,
}

/// Where the SQLite database is fetched from and where the local copy lives.
#[derive(Debug, Clone, Deserialize)]
pub struct DataSourceConfig {
    /// The database name is appended to this URL verbatim, after a `/`.
    pub base_url: String,
    /// Local directory the database is downloaded into.
    pub db_dir: String,
    /// Database file name, e.g. `calls.db`. May also be given on the command line.
    #[serde(default)]
    pub db_name: Option<String>,
}

impl Config {
    /// Checks the invariants `serde` cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_source.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "data_source.base_url must not be empty".to_string(),
            ));
        }
        if self.logging.file_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "logging.file_name must not be empty".to_string(),
            ));
        }
        if matches!(&self.data_source.db_name, Some(name) if name.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "data_source.db_name must not be empty when set".to_string(),
            ));
        }
        Ok(())
    }
}

// --- Default Implementations ---

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Full,
            directory: "logs".to_string(),
            file_name: "app.log".to_string(),
        }
    }
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            db_dir: "data".to_string(),
            db_name: None,
        }
    }
}
