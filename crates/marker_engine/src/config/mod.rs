//! Configuration system
//!
//! Config structs are plain serde types; the [`Config`] trait loads and saves
//! them as TOML or RON depending on the file extension.

use std::fmt;
use std::path::Path;

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = Format::of(path)?;
        let contents = std::fs::read_to_string(path)?;

        match format {
            Format::Toml => Self::from_toml_str(&contents),
            Format::Ron => Self::from_ron_str(&contents),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match Format::of(path)? {
            Format::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Format::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Parse configuration from TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse configuration from RON text
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

enum Format {
    Toml,
    Ron,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
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

    /// Values parsed but out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which spatial index layout to build over each mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Eight-way subdivision at the cell center
    #[default]
    Octree,
    /// Binary subdivision along the longest axis
    KdTree,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Octree => write!(f, "octree"),
            Self::KdTree => write!(f, "kd-tree"),
        }
    }
}

/// Spatial index build parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Index layout
    pub kind: IndexKind,

    /// Leaf capacity before a split is attempted
    pub max_triangles_per_node: usize,

    /// Depth past which triangles are appended without splitting
    pub max_depth: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            kind: IndexKind::Octree,
            max_triangles_per_node: 10,
            max_depth: 32,
        }
    }
}

impl IndexConfig {
    /// Reject values that would make the index degenerate
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_triangles_per_node == 0 {
            return Err(ConfigError::Invalid(
                "max_triangles_per_node must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration for the intersection marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Index parameters, shared by both meshes
    pub index: IndexConfig,

    /// Distance highlight triangles are pushed along their face normal
    pub highlight_offset: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            index: IndexConfig::default(),
            highlight_offset: 0.001,
        }
    }
}

impl Config for MarkerConfig {}

impl MarkerConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.index.validate()?;
        if !self.highlight_offset.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "highlight_offset must be finite, got {}",
                self.highlight_offset
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MarkerConfig::default();
        assert_eq!(config.index.kind, IndexKind::Octree);
        assert_eq!(config.index.max_triangles_per_node, 10);
        assert_eq!(config.index.max_depth, 32);
        assert_eq!(config.highlight_offset, 0.001);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = MarkerConfig::from_toml_str(
            r#"
            [index]
            kind = "kd_tree"
            max_depth = 12
            "#,
        )
        .unwrap();
        assert_eq!(config.index.kind, IndexKind::KdTree);
        assert_eq!(config.index.max_depth, 12);
        assert_eq!(config.index.max_triangles_per_node, 10);
        assert_eq!(config.highlight_offset, 0.001);
    }

    #[test]
    fn test_ron_parsing() {
        let config = MarkerConfig::from_ron_str(
            "(index: (kind: octree, max_triangles_per_node: 4), highlight_offset: 0.01)",
        )
        .unwrap();
        assert_eq!(config.index.max_triangles_per_node, 4);
        assert_eq!(config.index.max_depth, 32);
        assert_eq!(config.highlight_offset, 0.01);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = MarkerConfig::default();
        config.index.max_triangles_per_node = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_extension() {
        let err = MarkerConfig::load_from_file("marker.json").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_save_and_load_toml() {
        let path = std::env::temp_dir().join(format!("marker_config_{}.toml", std::process::id()));
        let mut config = MarkerConfig::default();
        config.index.kind = IndexKind::KdTree;
        config.save_to_file(&path).unwrap();

        let loaded = MarkerConfig::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
