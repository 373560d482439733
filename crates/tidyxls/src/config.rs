//! Configuration types for formula formatting.
//!
//! All types implement [`serde::Deserialize`], so a configuration can be
//! loaded from TOML (or any other serde format).
//!
//! # Example
//!
//! ```
//! # use tidyxls::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.format().separator(), ',');
//! assert!(config.format().is_structuring("IF"));
//! ```

use serde::Deserialize;

/// Functions laid out one argument per line by the tidy renderer.
pub const STRUCTURING_FUNCTIONS: [&str; 5] = ["IF", "IFERROR", "AND", "OR", "NOT"];

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Formatting configuration section.
    #[serde(default)]
    format: FormatConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified formatting configuration.
    pub fn new(format: FormatConfig) -> Self {
        Self { format }
    }

    /// Returns the formatting configuration.
    pub fn format(&self) -> &FormatConfig {
        &self.format
    }

    /// Returns a mutable reference to the formatting configuration.
    pub fn format_mut(&mut self) -> &mut FormatConfig {
        &mut self.format
    }
}

/// Settings for the structural rebuild and the tidy renderer.
#[derive(Debug, Clone, Deserialize)]
pub struct FormatConfig {
    /// Argument separator written between function arguments.
    ///
    /// `,` by default; `;` for locales that use `,` as decimal separator.
    #[serde(default = "default_separator")]
    separator: char,

    /// Function names that get multi-line layout. Matched case-sensitively.
    #[serde(default = "default_structuring_functions")]
    structuring_functions: Vec<String>,
}

fn default_separator() -> char {
    ','
}

fn default_structuring_functions() -> Vec<String> {
    STRUCTURING_FUNCTIONS.iter().map(|name| name.to_string()).collect()
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            structuring_functions: default_structuring_functions(),
        }
    }
}

impl FormatConfig {
    /// Creates a new [`FormatConfig`].
    ///
    /// # Arguments
    ///
    /// * `separator` - Argument separator character.
    /// * `structuring_functions` - Function names given multi-line layout.
    pub fn new(separator: char, structuring_functions: Vec<String>) -> Self {
        Self {
            separator,
            structuring_functions,
        }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn set_separator(&mut self, separator: char) {
        self.separator = separator;
    }

    pub fn structuring_functions(&self) -> &[String] {
        &self.structuring_functions
    }

    /// Returns `true` if `name` is a structuring function.
    pub fn is_structuring(&self, name: &str) -> bool {
        self.structuring_functions.iter().any(|f| f == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let format = FormatConfig::default();
        assert_eq!(format.separator(), ',');
        assert_eq!(format.structuring_functions(), STRUCTURING_FUNCTIONS);
        assert!(!format.is_structuring("SUM"));
        assert!(!format.is_structuring("if"));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: AppConfig = toml::from_str("[format]\nseparator = \";\"\n").unwrap();
        assert_eq!(config.format().separator(), ';');
        assert!(config.format().is_structuring("IFERROR"));
    }

    #[test]
    fn test_deserialize_empty() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.format().separator(), ',');
    }

    #[test]
    fn test_deserialize_custom_functions() {
        let config: AppConfig =
            toml::from_str("[format]\nstructuring_functions = [\"IF\", \"SWITCH\"]\n").unwrap();
        assert!(config.format().is_structuring("SWITCH"));
        assert!(!config.format().is_structuring("AND"));
    }
}
