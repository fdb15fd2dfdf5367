//! Core of the verdant leaf overlay: a registry of custom visual leaf types
//! layered over one host block kind, kept consistent with a world that
//! mutates underneath it and persisted per region.
//!
//! The host server integrates by implementing [`world::WorldView`] and
//! [`world::RegionStore`], constructing one [`service::LeafService`], and
//! forwarding world events plus a once-per-tick clock to it.

pub mod config;
pub mod drops;
pub mod item;
pub mod ledger;
pub mod particles;
pub mod registry;
pub mod resync;
pub mod scanner;
pub mod service;
pub mod world;

#[cfg(test)]
mod test_world;

pub use config::LeafConfig;
pub use drops::BreakTool;
pub use item::{HOST_MATERIAL, ItemStack};
pub use registry::{LeafRegistry, LeafType};
pub use service::LeafService;
pub use world::{LeafState, MemoryRegionStore, RegionStore, WorldView};
