//! Drop resolution for broken leaf blocks.

use rand::Rng;

use crate::config::LeafConfig;
use crate::item::{self, ItemStack};
use crate::registry::LeafType;

/// The tool a leaf block was broken with, reduced to the closed set the drop
/// rules care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakTool {
    /// The precision tool: yields the leaf item itself.
    Shears,
    /// Anything else: rolls the hand-drop table.
    Other,
}

/// One validated hand-drop rule.
#[derive(Debug, Clone, PartialEq)]
pub struct HandDrop {
    /// Material of the dropped item.
    pub material: String,
    /// Minimum dropped count.
    pub min: u32,
    /// Maximum dropped count (>= min).
    pub max: u32,
    /// Success probability in (0, 1].
    pub chance: f64,
}

fn valid_material_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// The hand-drop rules, loaded once per configuration load.
#[derive(Debug, Clone, Default)]
pub struct HandDropTable {
    drops: Vec<HandDrop>,
}

impl HandDropTable {
    /// Builds the table from configuration, skipping invalid rules with a
    /// warning: unknown-looking materials, non-positive chance, zero min, or
    /// max below min.
    #[must_use]
    pub fn load(config: &LeafConfig) -> Self {
        let mut drops = Vec::new();

        for rule in &config.hand_drops {
            if !valid_material_name(&rule.material) {
                log::warn!("Invalid material in hand_drops: {:?}", rule.material);
                continue;
            }
            let max = rule.max.unwrap_or(rule.min);
            if rule.chance <= 0.0 || rule.chance > 1.0 || rule.min == 0 || max < rule.min {
                log::warn!(
                    "Invalid hand-drop rule for {:?} (min {}, max {}, chance {})",
                    rule.material,
                    rule.min,
                    max,
                    rule.chance
                );
                continue;
            }
            drops.push(HandDrop {
                material: rule.material.clone(),
                min: rule.min,
                max,
                chance: rule.chance,
            });
        }

        log::info!("Loaded {} hand-drop rules", drops.len());
        Self { drops }
    }

    /// Number of loaded rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.drops.len()
    }

    /// Whether the table has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drops.is_empty()
    }

    /// Resolves what a break of `leaf` yields.
    ///
    /// Shears yield exactly one leaf item carrying the type id; any other
    /// tool rolls every rule independently. The two outcomes never mix.
    #[must_use]
    pub fn resolve(&self, tool: BreakTool, leaf: &LeafType, rng: &mut impl Rng) -> Vec<ItemStack> {
        match tool {
            BreakTool::Shears => vec![item::create_leaf_item(leaf, 1)],
            BreakTool::Other => {
                let mut yielded = Vec::new();
                for drop in &self.drops {
                    if rng.random::<f64>() <= drop.chance {
                        let count = if drop.min == drop.max {
                            drop.min
                        } else {
                            rng.random_range(drop.min..=drop.max)
                        };
                        yielded.push(ItemStack::plain(drop.material.clone(), count));
                    }
                }
                yielded
            }
        }
    }
}
