//! Rendering configuration.
//!
//! Parsed from TOML, e.g.:
//!
//! ```toml
//! nested_boolean = "mixed_only"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// When a boolean node nested inside another boolean node is parenthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestedBooleanStyle {
    /// Always wrap a nested boolean node in parentheses
    #[default]
    Always,
    /// Wrap only when the nested operator differs from its parent's
    MixedOnly,
    /// Never wrap; children are flattened as written
    Never,
}

/// Options that affect the generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub nested_boolean: NestedBooleanStyle,
}

impl RenderConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Returns a copy with a different nested-boolean policy.
    pub fn with_nested_boolean(mut self, style: NestedBooleanStyle) -> Self {
        self.nested_boolean = style;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_parenthesizes_nested_booleans() {
        assert_eq!(RenderConfig::default().nested_boolean, NestedBooleanStyle::Always);
    }

    #[test]
    fn test_from_toml_str() {
        let config = RenderConfig::from_toml_str("nested_boolean = \"mixed_only\"").unwrap();
        assert_eq!(config.nested_boolean, NestedBooleanStyle::MixedOnly);

        let config = RenderConfig::from_toml_str("").unwrap();
        assert_eq!(config, RenderConfig::default());
    }

    #[test]
    fn test_from_toml_str_rejects_unknown_style() {
        assert!(RenderConfig::from_toml_str("nested_boolean = \"sometimes\"").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "nested_boolean = \"never\"").unwrap();
        let config = RenderConfig::from_file(file.path()).unwrap();
        assert_eq!(config.nested_boolean, NestedBooleanStyle::Never);
    }
}
