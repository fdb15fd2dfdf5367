//! Leaf item descriptors.
//!
//! Items are opaque to the host: a material, a count, and a metadata slot
//! carrying the leaf type id so a placed item can be recognized again.

use std::sync::Arc;

use crate::registry::{LeafRegistry, LeafType};

/// The single host block kind all leaf types visually replace, and the item
/// material leaf items are made of.
pub const HOST_MATERIAL: &str = "azalea_leaves";

/// An opaque item descriptor handed to and received from the collaborator
/// layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStack {
    /// Item material name.
    pub material: String,
    /// Stack size.
    pub count: u32,
    /// Display name with markup, if customized.
    pub display_name: Option<String>,
    /// Item model override; 0 means none.
    pub custom_model_data: u32,
    /// Item-level metadata: the leaf type id, present only on leaf items.
    pub leaf_id: Option<String>,
}

impl ItemStack {
    /// A plain item with no leaf metadata.
    #[must_use]
    pub fn plain(material: impl Into<String>, count: u32) -> Self {
        Self {
            material: material.into(),
            count,
            display_name: None,
            custom_model_data: 0,
            leaf_id: None,
        }
    }
}

/// Builds the placeable item for a leaf type.
#[must_use]
pub fn create_leaf_item(leaf: &LeafType, count: u32) -> ItemStack {
    ItemStack {
        material: HOST_MATERIAL.to_string(),
        count,
        display_name: Some(leaf.display_name.clone()),
        custom_model_data: leaf.custom_model_data,
        leaf_id: Some(leaf.id.clone()),
    }
}

/// Resolves the leaf type an item carries, if it is a leaf item for a
/// currently registered type.
#[must_use]
pub fn leaf_type_from_item<'a>(
    registry: &'a LeafRegistry,
    item: &ItemStack,
) -> Option<&'a Arc<LeafType>> {
    if item.material != HOST_MATERIAL {
        return None;
    }
    registry.find(item.leaf_id.as_deref()?)
}
