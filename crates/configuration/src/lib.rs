//! # Pipeline Configuration Crate
//!
//! Everything the pipeline needs to know before it touches the network: where
//! the assessment database lives, where it is copied to, and how logs are
//! written.
//!
//! ## Public API
//!
//! - `load_config`: Layers defaults, an optional `config.toml` and `PIPELINE_*`
//!   environment variables into a validated `Config`.
//! - `setup_logging`: Installs the process-wide console + file subscriber, once.
//! - `ConfigError`: The specific error types that can be returned from this crate.

use crate::error::ConfigError;
use crate::settings::Config;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::{LogFormat, LogLevel, setup_logging};
pub use settings::{DEFAULT_BASE_URL, DataSourceConfig, LoggingConfig};

/// Loads the application configuration.
///
/// Built-in defaults come first, then the (optional) TOML file at `path`, then
/// environment variables prefixed with `PIPELINE_`, using `__` for nesting
/// (e.g. `PIPELINE_DATA_SOURCE__DB_NAME`).
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let defaults = Config::default();
    let builder = config::Config::builder()
        .set_default("logging.level", defaults.logging.level.as_str())?
        .set_default("logging.format", defaults.logging.format.as_str())?
        .set_default("logging.directory", defaults.logging.directory.clone())?
        .set_default("logging.file_name", defaults.logging.file_name.clone())?
        .set_default("data_source.base_url", defaults.data_source.base_url.clone())?
        .set_default("data_source.db_dir", defaults.data_source.db_dir.clone())?
        // A missing file is fine; the defaults and environment still apply.
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("PIPELINE")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config(path.to_str().unwrap()).unwrap();

        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.file_name, "app.log");
        assert_eq!(config.data_source.base_url, DEFAULT_BASE_URL);
        assert!(config.data_source.db_name.is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[logging]
level = "debug"
format = "compact"

[data_source]
db_dir = "scratch"
db_name = "calls.db"
"#
        )
        .unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.directory, "logs");
        assert_eq!(config.data_source.db_dir, "scratch");
        assert_eq!(config.data_source.db_name.as_deref(), Some("calls.db"));
    }

    #[test]
    fn empty_base_url_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[data_source]\nbase_url = \"\"").unwrap();

        let err = load_config(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
