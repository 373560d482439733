//! Configuration file loading for the CLI
//!
//! Finds and loads the TOML configuration from an explicit path, the
//! working directory or the platform config directory, then applies the
//! command-line overrides.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use tidyxls::{TidyxlsError, config::AppConfig};

/// Separators the tidy layout accepts.
const SEPARATORS: [char; 2] = [',', ';'];

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for TidyxlsError {
    fn from(err: ConfigError) -> Self {
        TidyxlsError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (tidyxls/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or is invalid
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, TidyxlsError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("tidyxls/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "tidyxls", "tidyxls") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Replace the configured separator with `separator` when one is given.
///
/// # Errors
///
/// Returns a validation error if the separator is not `,` or `;`.
pub fn apply_separator(config: &mut AppConfig, separator: Option<char>) -> Result<(), TidyxlsError> {
    if let Some(separator) = separator {
        debug!(separator:?; "Separator overridden from the command line");
        config.format_mut().set_separator(separator);
    }
    validate(config)?;
    Ok(())
}

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let separator = config.format().separator();
    if !SEPARATORS.contains(&separator) {
        return Err(ConfigError::Validation(format!(
            "unsupported separator {separator:?}, expected ',' or ';'"
        )));
    }
    Ok(())
}

fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, TidyxlsError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_explicit_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[format]\nseparator = \";\"\nstructuring_functions = [\"IF\"]\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.format().separator(), ';');
        assert!(config.format().is_structuring("IF"));
        assert!(!config.format().is_structuring("AND"));
    }

    #[test]
    fn test_missing_explicit_path() {
        let dir = tempdir().unwrap();
        let err = load_config(Some(dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, TidyxlsError::Config(msg) if msg.starts_with("Missing configuration file")));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[format\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, TidyxlsError::Config(msg) if msg.starts_with("Failed to parse")));
    }

    #[test]
    fn test_separator_override() {
        let mut config = AppConfig::default();
        apply_separator(&mut config, Some(';')).unwrap();
        assert_eq!(config.format().separator(), ';');

        apply_separator(&mut config, None).unwrap();
        assert_eq!(config.format().separator(), ';');

        let err = apply_separator(&mut config, Some('|')).unwrap_err();
        assert!(matches!(err, TidyxlsError::Config(msg) if msg.contains("'|'")));
    }
}
