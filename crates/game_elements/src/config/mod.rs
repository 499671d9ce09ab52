//! Configuration system

pub use serde::{Deserialize, Serialize};

/// Configuration trait for types loadable from TOML or RON files.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Settings for one scene context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Scene name used in logs and diagnostics.
    pub name: String,

    /// Whether the node layer adopts the descendants of every registered
    /// node (evaluated once, at context construction).
    pub register_child_nodes: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            name: "scene".to_string(),
            register_child_nodes: false,
        }
    }
}

impl Config for ContextConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ContextConfig::default();
        assert_eq!(config.name, "scene");
        assert!(!config.register_child_nodes);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ContextConfig = toml::from_str("name = \"arena\"").unwrap();
        assert_eq!(config.name, "arena");
        assert!(!config.register_child_nodes);
    }

    #[test]
    fn test_full_toml() {
        let config: ContextConfig =
            toml::from_str("name = \"arena\"\nregister_child_nodes = true").unwrap();
        assert!(config.register_child_nodes);
    }
}
