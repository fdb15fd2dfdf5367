//! Capability traits through which the core reaches the host world, plus the
//! in-memory region store used for tests and ephemeral worlds.

use rustc_hash::FxHashMap;
use verdant_utils::{BlockPos, Rgb, WorldId, math::Vector3, types::RegionPos};

use crate::ledger::RegionKey;

/// The native block state of the host leaves block, as far as this core
/// cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeafState {
    /// The leaves `distance` property (1..=7); doubles as the overlay type's
    /// variant code.
    pub distance: u8,
    /// Whether the block decays; overlaid blocks are always kept persistent.
    pub persistent: bool,
    /// Waterlogged flag; cleared on overlaid blocks.
    pub waterlogged: bool,
}

impl LeafState {
    /// The state a terrain generator leaves behind: decaying, dry, with the
    /// given distance.
    #[must_use]
    pub const fn generated(distance: u8) -> Self {
        Self {
            distance,
            persistent: false,
            waterlogged: false,
        }
    }
}

/// An identifier for one connected observer (player).
pub type ObserverId = uuid::Uuid;

/// A live observer and where it currently stands.
#[derive(Debug, Clone, Copy)]
pub struct Observer {
    /// The observer's identifier.
    pub id: ObserverId,
    /// The world the observer is in.
    pub world: WorldId,
    /// The observer's position.
    pub pos: Vector3<f64>,
}

/// Read/write access to the live world and its observers.
///
/// All block access is by coordinate; the core never holds references into
/// world state, since it may change between enqueue and processing. Visual
/// sends are fire-and-forget.
pub trait WorldView {
    /// The worlds (dimensions) currently live on the host.
    fn worlds(&self) -> Vec<WorldId>;

    /// The vertical extent of a world as `(min_y, max_y)`, max exclusive.
    fn height_range(&self, world: WorldId) -> (i32, i32);

    /// The native leaves state at `pos`, or `None` when the block there is
    /// not the host material.
    fn leaf_state(&self, world: WorldId, pos: BlockPos) -> Option<LeafState>;

    /// Writes the native leaves state at `pos`, without triggering the host
    /// engine's neighbor updates.
    fn set_leaf_state(&mut self, world: WorldId, pos: BlockPos, state: LeafState);

    /// All currently connected observers.
    fn observers(&self) -> Vec<Observer>;

    /// Observers within `radius` blocks of `pos` in `world`.
    fn observers_near(&self, world: WorldId, pos: BlockPos, radius: f64) -> Vec<ObserverId> {
        let center = pos.center();
        let radius_squared = radius * radius;
        self.observers()
            .into_iter()
            .filter(|o| o.world == world && o.pos.distance_squared(&center) <= radius_squared)
            .map(|o| o.id)
            .collect()
    }

    /// Overrides the rendered state of one block for one observer.
    fn send_block_visual(&mut self, observer: ObserverId, pos: BlockPos, state: LeafState);

    /// Emits one dust particle at `point` for one observer.
    fn emit_dust(&mut self, observer: ObserverId, point: Vector3<f64>, color: Rgb, size: f32);

    /// The regions currently loaded in `world`.
    fn loaded_regions(&self, world: WorldId) -> Vec<RegionPos>;
}

/// Durable per-region key/value store.
///
/// One string record per region, last-write-wins; no further transactional
/// guarantee is required of implementations.
pub trait RegionStore {
    /// Reads the record for a region, if any.
    fn get(&self, key: &RegionKey) -> Option<String>;

    /// Writes the record for a region.
    fn set(&mut self, key: &RegionKey, record: String);

    /// Removes the record for a region.
    fn remove(&mut self, key: &RegionKey);
}

/// In-memory region store.
///
/// Nothing survives the process; suitable for tests and worlds that are
/// rebuilt from scratch (the scan path restores detected leaves anyway).
#[derive(Debug, Default)]
pub struct MemoryRegionStore {
    records: FxHashMap<RegionKey, String>,
}

impl MemoryRegionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegionStore for MemoryRegionStore {
    fn get(&self, key: &RegionKey) -> Option<String> {
        self.records.get(key).cloned()
    }

    fn set(&mut self, key: &RegionKey, record: String) {
        self.records.insert(*key, record);
    }

    fn remove(&mut self, key: &RegionKey) {
        self.records.remove(key);
    }
}
