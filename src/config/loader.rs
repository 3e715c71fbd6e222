//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::AdapterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AdapterConfig, ConfigError> {
    let config: AdapterConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AdapterConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/lambda-net.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("mode = 42").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_message() {
        let err = parse_config("binary_media_types = [\"png\"]").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: binary_media_types[0]: \"png\" is not a type/subtype media type"
        );
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("lambda-net-{}.toml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            "binary_media_types = [\"image/*\"]\n[observability]\nlog_level = \"debug\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert!(config.binary_media_types().contains("image/gif"));
        assert_eq!(config.observability.log_level, "debug");
    }
}
