//! vfe Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all vfe crates.
//! Every structure deserializes from JSON with missing fields falling back
//! to their defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Error raised while loading a configuration document
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log levels per component
    pub log: LogConfig,
    /// Directory iteration defaults
    pub iteration: IterationConfig,
    /// In-memory store defaults
    pub memory: MemoryStoreConfig,
    /// Archive mounting
    pub archive: ArchiveConfig,
    /// Path normalization
    pub paths: PathConfig,
}

impl Config {
    /// Parse a configuration from a JSON string
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }
}

/// Log level names per component.
///
/// Levels are plain names ("trace", "debug", "info", "warn", "error") so
/// this crate stays free of any logging dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level for every target
    pub global: String,
    pub engine: Option<String>,
    pub registry: Option<String>,
    pub iterator: Option<String>,
    pub path: Option<String>,
}

impl LogConfig {
    /// Level name for a component, falling back to the global level
    pub fn level_for(&self, component: Component) -> &str {
        let specific = match component {
            Component::Engine => &self.engine,
            Component::Registry => &self.registry,
            Component::Iterator => &self.iterator,
            Component::Path => &self.path,
        };
        specific.as_deref().unwrap_or(&self.global)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: String::from("info"),
            engine: None,
            registry: None,
            iterator: None,
            path: None,
        }
    }
}

/// Defaults applied to iterators built from configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IterationConfig {
    /// Descend through symbolic links to directories
    pub follow_symlinks: bool,
    /// Deepest level descended into (0 = only the root's children)
    pub max_depth: Option<usize>,
}

/// Defaults for records created by the in-memory store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryStoreConfig {
    pub default_user_id: u32,
    pub default_group_id: u32,
    /// Permission bits in file-flag layout (owner/user/group/other)
    pub default_permissions: u32,
    /// User id → user name
    pub users: BTreeMap<u32, String>,
    /// Group id → group name
    pub groups: BTreeMap<u32, String>,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            default_user_id: 0,
            default_group_id: 0,
            // read/write for owner and user, read for group and other
            default_permissions: 0x6644,
            users: BTreeMap::new(),
            groups: BTreeMap::new(),
        }
    }
}

/// Archive mounting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// File suffixes mounted as directories
    pub suffixes: Vec<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            suffixes: vec![String::from(".tar")],
        }
    }
}

/// Path normalization switches; `None` selects the platform default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub unc_paths: Option<bool>,
    pub drive_letters: Option<bool>,
    pub backslash_separators: Option<bool>,
}

/// Component enum for component-specific log configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    Engine,
    Registry,
    Iterator,
    Path,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::Engine,
        Component::Registry,
        Component::Iterator,
        Component::Path,
    ];

    /// Get the string name of the component
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Engine => "engine",
            Component::Registry => "registry",
            Component::Iterator => "iterator",
            Component::Path => "path",
        }
    }

    /// Get the log target name for this component
    pub fn target(&self) -> &'static str {
        match self {
            Component::Engine => "vfe::engine",
            Component::Registry => "vfe::registry",
            Component::Iterator => "vfe::iterator",
            Component::Path => "vfe::path",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.log.global, "info");
        assert!(!cfg.iteration.follow_symlinks);
        assert_eq!(cfg.archive.suffixes, vec![".tar".to_string()]);
        assert_eq!(cfg.memory.default_permissions, 0x6644);
    }

    #[test]
    fn test_level_for_falls_back_to_global() {
        let cfg = LogConfig {
            global: "warn".into(),
            iterator: Some("trace".into()),
            ..Default::default()
        };
        assert_eq!(cfg.level_for(Component::Iterator), "trace");
        assert_eq!(cfg.level_for(Component::Engine), "warn");
    }

    #[test]
    fn test_component_target() {
        assert_eq!(Component::Registry.as_str(), "registry");
        assert_eq!(Component::Engine.target(), "vfe::engine");
        assert_eq!(Component::ALL.len(), 4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = Config::from_json_str(
            r#"{ "iteration": { "follow_symlinks": true }, "memory": { "users": { "1000": "alice" } } }"#,
        )
        .unwrap();
        assert!(cfg.iteration.follow_symlinks);
        assert_eq!(cfg.iteration.max_depth, None);
        assert_eq!(cfg.memory.users.get(&1000).map(String::as_str), Some("alice"));
        assert_eq!(cfg.log, LogConfig::default());
    }

    #[test]
    fn test_invalid_json() {
        let err = Config::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("invalid config"));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
