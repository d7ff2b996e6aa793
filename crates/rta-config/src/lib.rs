use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerializeError(#[from] toml::ser::Error),

    #[error("Invalid element name {0:?} in config")]
    InvalidElementName(String),
}

/// Elements selected as a unit when no config overrides them.
pub const DEFAULT_ATOMIC_ELEMENTS: &[&str] = &[
    "img", "embed", "object", "iframe", "video", "audio", "canvas", "hr",
];

/// Settings for the selection preserver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreserverConfig {
    /// Re-join text nodes that were split to make room for a marker
    pub merge_split_text: bool,
}

impl Default for PreserverConfig {
    fn default() -> Self {
        Self {
            merge_split_text: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Tag names treated as atomic (no selectable content, selected whole)
    pub atomic_elements: Vec<String>,
    /// Maximum number of undo entries kept
    pub history_limit: usize,
    pub selection: PreserverConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            atomic_elements: DEFAULT_ATOMIC_ELEMENTS
                .iter()
                .map(|tag| tag.to_string())
                .collect(),
            history_limit: 100,
            selection: PreserverConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a TOML document. Missing keys take their defaults and element
    /// names are lowercased.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: EditorConfig = toml::from_str(content)?;
        config.atomic_elements = Self::normalize_element_names(&config.atomic_elements)
            .map_err(ConfigError::InvalidElementName)?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Lowercase every name, returning the first one that is not a valid tag name.
    fn normalize_element_names(names: &[String]) -> Result<Vec<String>, String> {
        static NAME_REGEX: OnceLock<Regex> = OnceLock::new();
        let name_regex = NAME_REGEX
            .get_or_init(|| Regex::new(r"^[a-z][a-z0-9-]*$").expect("Invalid element name regex"));

        names
            .iter()
            .map(|name| {
                let lowered = name.trim().to_ascii_lowercase();
                if name_regex.is_match(&lowered) {
                    Ok(lowered)
                } else {
                    Err(name.clone())
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();

        assert!(config.atomic_elements.iter().any(|tag| tag == "img"));
        assert!(config.atomic_elements.iter().any(|tag| tag == "iframe"));
        assert!(!config.atomic_elements.iter().any(|tag| tag == "em"));
        assert_eq!(config.history_limit, 100);
        assert!(config.selection.merge_split_text);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = EditorConfig {
            atomic_elements: vec!["img".to_string(), "math".to_string()],
            history_limit: 7,
            selection: PreserverConfig {
                merge_split_text: false,
            },
        };

        let toml_str = original.to_toml().unwrap();
        let parsed = EditorConfig::from_toml(&toml_str).unwrap();

        assert_eq!(original, parsed);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = EditorConfig::from_toml("history_limit = 5\n").unwrap();

        assert_eq!(config.history_limit, 5);
        assert_eq!(config.atomic_elements, EditorConfig::default().atomic_elements);
        assert!(config.selection.merge_split_text);
    }

    #[test]
    fn test_selection_table() {
        let config = EditorConfig::from_toml("[selection]\nmerge_split_text = false\n").unwrap();

        assert!(!config.selection.merge_split_text);
    }

    #[test]
    fn test_element_names_are_lowercased() {
        let config = EditorConfig::from_toml("atomic_elements = [\"IMG\", \" Video \"]\n").unwrap();

        assert_eq!(config.atomic_elements, vec!["img", "video"]);
    }

    #[test]
    fn test_invalid_element_name_is_rejected() {
        let err = EditorConfig::from_toml("atomic_elements = [\"img\", \"<script>\"]\n").unwrap_err();

        match err {
            ConfigError::InvalidElementName(name) => assert_eq!(name, "<script>"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let err = EditorConfig::from_toml("history_limit = \"lots\"\n").unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError(_)));
    }
}
