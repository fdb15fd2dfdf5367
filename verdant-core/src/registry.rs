//! The leaf type registry.
//!
//! Built once per configuration load and never mutated afterwards; a reload
//! builds a fresh registry and swaps the `Arc`, so readers always see a
//! complete set.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use verdant_utils::Rgb;

use crate::config::LeafConfig;
use crate::world::LeafState;

/// The range of valid leaves `distance` values.
pub const DISTANCE_RANGE: std::ops::RangeInclusive<u8> = 1..=7;

/// One custom leaf type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafType {
    /// Unique lowercase identifier.
    pub id: String,
    /// Presentation name, markup passed through to callers.
    pub display_name: String,
    /// Leaves `distance` value (1..=7), unique across the registry.
    pub distance_id: u8,
    /// Texture reference for the asset-packaging collaborator.
    pub texture: String,
    /// Item model override id; 0 means none.
    pub custom_model_data: u32,
    /// The full visual block state applied to overlaid blocks.
    pub visual: LeafState,
    /// Dust color for ambient particles.
    pub particle_color: Rgb,
    /// Particles emitted per ambient sampling of this type.
    pub particle_amount: u32,
}

/// Immutable index of all known leaf types.
#[derive(Debug, Default)]
pub struct LeafRegistry {
    ordered: Vec<Arc<LeafType>>,
    by_id: FxHashMap<String, usize>,
    by_distance: FxHashMap<u8, usize>,
}

impl LeafRegistry {
    /// Builds a registry from configuration.
    ///
    /// Entries with a `distance_id` outside 1..=7 or colliding with an
    /// already-registered one are skipped with a warning; a bad particle
    /// color falls back to white.
    #[must_use]
    pub fn load(config: &LeafConfig) -> Self {
        let mut registry = Self::default();

        for (key, leaf) in &config.leaves {
            let id = key.to_lowercase();

            if !DISTANCE_RANGE.contains(&leaf.distance_id) {
                log::warn!(
                    "Invalid distance_id {} for leaf type {id} (expected 1..=7), skipping",
                    leaf.distance_id
                );
                continue;
            }
            if registry.by_distance.contains_key(&leaf.distance_id) {
                log::warn!(
                    "Duplicate distance_id {} for leaf type {id}, skipping",
                    leaf.distance_id
                );
                continue;
            }

            let particle_color = match &leaf.particle_color {
                None => Rgb::WHITE,
                Some(raw) => Rgb::parse(raw).unwrap_or_else(|| {
                    log::warn!("Invalid particle_color {raw:?} for leaf type {id}, using white");
                    Rgb::WHITE
                }),
            };

            let leaf_type = Arc::new(LeafType {
                display_name: leaf.display_name.clone().unwrap_or_else(|| id.clone()),
                texture: leaf.texture.clone().unwrap_or_else(|| id.clone()),
                distance_id: leaf.distance_id,
                custom_model_data: leaf.custom_model_data,
                visual: LeafState {
                    distance: leaf.distance_id,
                    persistent: true,
                    waterlogged: false,
                },
                particle_color,
                particle_amount: leaf.particle_amount,
                id: id.clone(),
            });

            let index = registry.ordered.len();
            registry.by_id.insert(id, index);
            registry.by_distance.insert(leaf.distance_id, index);
            registry.ordered.push(leaf_type);
        }

        log::info!("Loaded {} leaf types", registry.ordered.len());
        registry
    }

    /// Looks up a type by id (case-insensitive).
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Arc<LeafType>> {
        let index = if id.chars().any(char::is_uppercase) {
            *self.by_id.get(&id.to_lowercase())?
        } else {
            *self.by_id.get(id)?
        };
        self.ordered.get(index)
    }

    /// Looks up a type by its leaves `distance` value.
    #[must_use]
    pub fn by_distance(&self, distance: u8) -> Option<&Arc<LeafType>> {
        self.ordered.get(*self.by_distance.get(&distance)?)
    }

    /// The deterministic fallback type used when detection cannot resolve a
    /// distance: the first registered one.
    #[must_use]
    pub fn first(&self) -> Option<&Arc<LeafType>> {
        self.ordered.first()
    }

    /// All registered types, in registration order.
    #[must_use]
    pub fn all(&self) -> &[Arc<LeafType>] {
        &self.ordered
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
