//! In-memory world used by the unit tests.
//!
//! A flat map of host blocks plus recorded visual/particle sends, so tests
//! can assert exactly what reached each observer.

use rustc_hash::FxHashMap;
use verdant_utils::{BlockPos, Rgb, WorldId, math::Vector3, types::RegionPos};

use crate::world::{LeafState, Observer, ObserverId, WorldView};

/// Recorded `send_block_visual` call.
pub type VisualSend = (ObserverId, BlockPos, LeafState);

/// An in-memory [`WorldView`] with a single default world.
pub struct TestWorld {
    /// The default world id; all helpers target it.
    pub world_id: WorldId,
    blocks: FxHashMap<(WorldId, BlockPos), LeafState>,
    observers: Vec<Observer>,
    /// Every visual override sent, in order.
    pub visual_sends: Vec<VisualSend>,
    /// Every dust particle emitted, in order.
    pub dust_emits: Vec<(ObserverId, Vector3<f64>, Rgb)>,
    height: (i32, i32),
}

impl TestWorld {
    /// Creates an empty world with a small vertical range to keep scans fast.
    pub fn new() -> Self {
        Self {
            world_id: uuid::Uuid::new_v4(),
            blocks: FxHashMap::default(),
            observers: Vec::new(),
            visual_sends: Vec::new(),
            dust_emits: Vec::new(),
            height: (0, 128),
        }
    }

    /// Places a host block in the default world.
    pub fn place_host(&mut self, pos: BlockPos, state: LeafState) {
        self.blocks.insert((self.world_id, pos), state);
    }

    /// Removes whatever is at `pos` in the default world.
    pub fn break_block(&mut self, pos: BlockPos) {
        self.blocks.remove(&(self.world_id, pos));
    }

    /// Adds an observer at `pos` in the default world.
    pub fn add_observer(&mut self, pos: Vector3<f64>) -> ObserverId {
        let id = uuid::Uuid::new_v4();
        self.observers.push(Observer {
            id,
            world: self.world_id,
            pos,
        });
        id
    }

    /// Visual sends received by one observer.
    pub fn sends_to(&self, observer: ObserverId) -> usize {
        self.visual_sends.iter().filter(|s| s.0 == observer).count()
    }
}

impl WorldView for TestWorld {
    fn worlds(&self) -> Vec<WorldId> {
        vec![self.world_id]
    }

    fn height_range(&self, _world: WorldId) -> (i32, i32) {
        self.height
    }

    fn leaf_state(&self, world: WorldId, pos: BlockPos) -> Option<LeafState> {
        self.blocks.get(&(world, pos)).copied()
    }

    fn set_leaf_state(&mut self, world: WorldId, pos: BlockPos, state: LeafState) {
        self.blocks.insert((world, pos), state);
    }

    fn observers(&self) -> Vec<Observer> {
        self.observers.clone()
    }

    fn send_block_visual(&mut self, observer: ObserverId, pos: BlockPos, state: LeafState) {
        self.visual_sends.push((observer, pos, state));
    }

    fn emit_dust(&mut self, observer: ObserverId, point: Vector3<f64>, color: Rgb, _size: f32) {
        self.dust_emits.push((observer, point, color));
    }

    fn loaded_regions(&self, world: WorldId) -> Vec<RegionPos> {
        let mut regions: Vec<RegionPos> = self
            .blocks
            .keys()
            .filter(|(w, _)| *w == world)
            .map(|(_, pos)| pos.region())
            .collect();
        regions.sort_by_key(|r| (r.0.x, r.0.z));
        regions.dedup();
        regions
    }
}
