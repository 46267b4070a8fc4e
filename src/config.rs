//! Binder configuration (YAML)
//!
//! ```yaml
//! selector:
//!   delimiter: "/"
//! coercion:
//!   standard_converters: true
//! template:
//!   implicit_view: true
//! ```
//!
//! Every key is optional; an empty document yields [`Config::default`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BinderyError, Result};
use crate::selector::DEFAULT_DELIMITER;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub selector: SelectorConfig,
    pub coercion: CoercionConfig,
    pub template: TemplateConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Segment delimiter used when parsing selector text
    pub delimiter: char,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CoercionConfig {
    /// Pre-register the built-in numeric/parse/format converters
    pub standard_converters: bool,
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self {
            standard_converters: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Attach a plain View to prefab roots that were built without one
    pub implicit_view: bool,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self { implicit_view: true }
    }
}

impl Config {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let delimiter = self.selector.delimiter;
        if delimiter.is_whitespace() {
            return Err(BinderyError::InvalidDelimiter { delimiter });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.selector.delimiter, '.');
        assert!(config.coercion.standard_converters);
        assert!(config.template.implicit_view);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(Config::from_yaml_str("  \n").unwrap(), Config::default());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = Config::from_yaml_str("selector:\n  delimiter: \"/\"\n").unwrap();
        assert_eq!(config.selector.delimiter, '/');
        assert!(config.template.implicit_view);
    }

    #[test]
    fn whitespace_delimiter_is_rejected() {
        let err = Config::from_yaml_str("selector:\n  delimiter: \" \"\n").unwrap_err();
        assert!(matches!(err, BinderyError::InvalidDelimiter { delimiter: ' ' }));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = Config::from_yaml_str("selector: [").unwrap_err();
        assert!(err.to_string().starts_with("BIND-003"));
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "template:\n  implicit_view: false").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert!(!config.template.implicit_view);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Config::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, BinderyError::Io(_)));
    }
}
