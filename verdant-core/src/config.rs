//! Configuration loading for leaf types and hand drops.

use std::collections::BTreeMap;
use std::{fs, path::Path};

use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../package-content/verdant_config.json5");

/// Error produced when the configuration file cannot be loaded at all.
///
/// Per-entry problems (bad distance id, bad color, bad drop rule) are not
/// errors: registry and drop-table construction skip those entries with a
/// warning.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or created.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON5.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json5::Error),
}

/// One leaf type as declared in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LeafTypeConfig {
    /// Presentation name; rich-text markup is passed through untouched.
    pub display_name: Option<String>,
    /// Texture file reference (PNG name without extension), resolved by the
    /// asset-packaging collaborator.
    pub texture: Option<String>,
    /// Value 1..=7 used as the leaves `distance` block state. Unique per type.
    #[serde(default = "default_distance_id")]
    pub distance_id: u8,
    /// Item model override id; 0 means none.
    #[serde(default)]
    pub custom_model_data: u32,
    /// Particle color spec, `#RRGGBB` or `r,g,b`.
    #[serde(default)]
    pub particle_color: Option<String>,
    /// Particles emitted per sampling of this type.
    #[serde(default = "default_particle_amount")]
    pub particle_amount: u32,
}

const fn default_distance_id() -> u8 {
    2
}

const fn default_particle_amount() -> u32 {
    1
}

/// One hand-drop rule: rolled independently on every no-shears break.
#[derive(Debug, Clone, Deserialize)]
pub struct HandDropConfig {
    /// Material of the dropped item.
    pub material: String,
    /// Minimum dropped count.
    #[serde(default = "default_min")]
    pub min: u32,
    /// Maximum dropped count; defaults to `min` when absent.
    pub max: Option<u32>,
    /// Success probability in (0, 1].
    #[serde(default)]
    pub chance: f64,
}

const fn default_min() -> u32 {
    1
}

/// The whole configuration file.
///
/// `leaves` is a map so configs stay mergeable by key; a `BTreeMap` keeps
/// load order deterministic, which matters because the first registered type
/// is the detection fallback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeafConfig {
    /// Declared leaf types, keyed by id.
    #[serde(default)]
    pub leaves: BTreeMap<String, LeafTypeConfig>,
    /// Hand-drop rules.
    #[serde(default)]
    pub hand_drops: Vec<HandDropConfig>,
}

impl LeafConfig {
    /// Loads the configuration from `path`, writing the embedded default
    /// config there first if the file does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, DEFAULT_CONFIG)?;
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json5::from_str(&raw)?)
    }

    /// Parses a configuration from a string.
    pub fn load_from_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json5::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = LeafConfig::load_from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.leaves.len(), 3);
        assert_eq!(config.hand_drops.len(), 2);
        assert_eq!(config.leaves["amber"].distance_id, 3);
    }

    #[test]
    fn missing_sections_default_empty() {
        let config = LeafConfig::load_from_str("{}").unwrap();
        assert!(config.leaves.is_empty());
        assert!(config.hand_drops.is_empty());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            LeafConfig::load_from_str("leaves: ["),
            Err(ConfigError::Parse(_))
        ));
    }
}
