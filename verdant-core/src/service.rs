//! The service facade wiring the components together.
//!
//! One `LeafService` is constructed at startup and owns all mutable state:
//! the registry snapshot, the ledger, the durable store, and the resync
//! queue. Every world event and the tick clock are delivered serially on one
//! logical thread, so nothing here locks.

use std::sync::Arc;

use rand::Rng;
use verdant_utils::{BlockPos, WorldId, types::RegionPos};

use crate::config::LeafConfig;
use crate::drops::{BreakTool, HandDropTable};
use crate::item::{self, ItemStack};
use crate::ledger::{self, LeafLedger, RegionKey};
use crate::particles::{self, PARTICLE_TICK_INTERVAL};
use crate::registry::{LeafRegistry, LeafType};
use crate::resync::{BURST_DURATION_TICKS, BURST_RADIUS, RESYNC_DURATION_TICKS, ResyncQueue};
use crate::scanner;
use crate::world::{ObserverId, RegionStore, WorldView};

/// The top-level leaf overlay service.
pub struct LeafService<S: RegionStore> {
    registry: Arc<LeafRegistry>,
    hand_drops: HandDropTable,
    ledger: LeafLedger,
    store: S,
    resync: ResyncQueue,
    tick_count: u64,
}

impl<S: RegionStore> LeafService<S> {
    /// Creates the service from configuration and a durable store.
    #[must_use]
    pub fn new(config: &LeafConfig, store: S) -> Self {
        Self {
            registry: Arc::new(LeafRegistry::load(config)),
            hand_drops: HandDropTable::load(config),
            ledger: LeafLedger::new(),
            store,
            resync: ResyncQueue::new(),
            tick_count: 0,
        }
    }

    /// The current registry snapshot.
    #[must_use]
    pub fn registry(&self) -> &Arc<LeafRegistry> {
        &self.registry
    }

    /// Looks up a leaf type by id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Arc<LeafType>> {
        self.registry.find(id)
    }

    /// All registered leaf types, in registration order.
    #[must_use]
    pub fn all(&self) -> &[Arc<LeafType>] {
        self.registry.all()
    }

    /// Builds the placeable item for a leaf type.
    #[must_use]
    pub fn create_leaf_item(&self, leaf: &LeafType, count: u32) -> ItemStack {
        item::create_leaf_item(leaf, count)
    }

    /// Resolves the leaf type an item carries, if any.
    #[must_use]
    pub fn leaf_type_from_item(&self, item: &ItemStack) -> Option<&Arc<LeafType>> {
        item::leaf_type_from_item(&self.registry, item)
    }

    /// Registers a deliberate placement of `type_id` at `pos`.
    ///
    /// Returns false when the type id is unknown.
    pub fn register(
        &mut self,
        world: &mut impl WorldView,
        world_id: WorldId,
        pos: BlockPos,
        type_id: &str,
    ) -> bool {
        let Some(leaf) = self.registry.find(type_id).cloned() else {
            return false;
        };
        self.ledger.register(
            world_id,
            pos,
            leaf,
            &self.registry,
            &mut self.store,
            world,
        );
        true
    }

    /// Removes the overlay entry at `pos`, if any, even when its region is
    /// not currently materialized.
    pub fn unregister(&mut self, world: &mut impl WorldView, world_id: WorldId, pos: BlockPos) {
        self.ledger
            .unregister(world_id, pos, &self.registry, &mut self.store, world);
    }

    /// Pure ledger lookup.
    pub fn get(
        &mut self,
        world: &mut impl WorldView,
        world_id: WorldId,
        pos: BlockPos,
    ) -> Option<Arc<LeafType>> {
        self.ledger
            .get(world_id, pos, &self.registry, &self.store, world)
    }

    /// Lookup with host-block detection fallback.
    pub fn get_or_detect(
        &mut self,
        world: &mut impl WorldView,
        world_id: WorldId,
        pos: BlockPos,
    ) -> Option<Arc<LeafType>> {
        self.ledger
            .get_or_detect(world_id, pos, &self.registry, &self.store, world)
    }

    /// Replaces the configuration wholesale: registry and drop table are
    /// rebuilt, the in-memory ledger is cleared, and every loaded region is
    /// re-loaded and re-scanned. Readers holding the previous registry `Arc`
    /// keep a consistent snapshot.
    pub fn reload(&mut self, config: &LeafConfig, world: &mut impl WorldView) {
        self.registry = Arc::new(LeafRegistry::load(config));
        self.hand_drops = HandDropTable::load(config);
        self.ledger.clear();
        self.rebuild_loaded_regions(world);
    }

    /// Re-runs the region-load path for every currently loaded region, e.g.
    /// at startup when regions were activated before this service existed.
    pub fn rebuild_loaded_regions(&mut self, world: &mut impl WorldView) {
        for world_id in world.worlds() {
            for region in world.loaded_regions(world_id) {
                let key = RegionKey::new(world_id, region);
                self.ledger.evict_region(&key);
                self.on_region_load(world, world_id, region);
            }
        }
    }

    /// Handles a block being placed from an item.
    ///
    /// Returns true when the item was a leaf item and the placement was
    /// claimed by the overlay.
    pub fn on_place(
        &mut self,
        world: &mut impl WorldView,
        world_id: WorldId,
        pos: BlockPos,
        item: &ItemStack,
    ) -> bool {
        let Some(leaf) = self.leaf_type_from_item(item).cloned() else {
            return false;
        };
        self.ledger.register(
            world_id,
            pos,
            leaf,
            &self.registry,
            &mut self.store,
            world,
        );
        true
    }

    /// Handles a block break at `pos` with `tool`.
    ///
    /// Returns `None` when the broken block is not an overlaid leaf (the
    /// host engine's own drops apply); otherwise the caller must suppress
    /// those and yield the returned items instead.
    pub fn on_break(
        &mut self,
        world: &mut impl WorldView,
        world_id: WorldId,
        pos: BlockPos,
        tool: BreakTool,
        rng: &mut impl Rng,
    ) -> Option<Vec<ItemStack>> {
        world.leaf_state(world_id, pos)?;
        let leaf = self.get_or_detect(world, world_id, pos)?;

        self.ledger
            .unregister(world_id, pos, &self.registry, &mut self.store, world);
        self.resync.enqueue(world_id, pos, RESYNC_DURATION_TICKS);

        Some(self.hand_drops.resolve(tool, &leaf, rng))
    }

    /// Handles a physics recomputation touching `pos`.
    ///
    /// Returns true when the event concerns an overlaid leaf and must be
    /// cancelled; the native state is re-asserted and a resync window opens.
    pub fn on_physics(
        &mut self,
        world: &mut impl WorldView,
        world_id: WorldId,
        pos: BlockPos,
    ) -> bool {
        if world.leaf_state(world_id, pos).is_none() {
            return false;
        }
        let Some(leaf) = self.get_or_detect(world, world_id, pos) else {
            return false;
        };

        ledger::apply_leaf_state(world, world_id, pos, &leaf);
        self.resync.enqueue(world_id, pos, RESYNC_DURATION_TICKS);
        true
    }

    /// Handles a region activation: loads its durable record and scans it
    /// for generated host blocks.
    pub fn on_region_load(
        &mut self,
        world: &mut impl WorldView,
        world_id: WorldId,
        region: RegionPos,
    ) {
        let key = RegionKey::new(world_id, region);
        self.ledger
            .load_region(key, &self.registry, &self.store, world);
        scanner::scan_region(&mut self.ledger, key, &self.registry, &self.store, world);
    }

    /// Handles a region unload: evicts the in-memory map. The durable record
    /// stays; the next access reloads it.
    pub fn on_region_unload(&mut self, world_id: WorldId, region: RegionPos) {
        self.ledger
            .evict_region(&RegionKey::new(world_id, region));
    }

    /// Handles an outbound block/chunk state packet for an observer: starts
    /// (or restarts) that observer's reassertion burst.
    pub fn on_observer_packet(&mut self, observer: ObserverId) {
        self.resync
            .start_burst(observer, BURST_DURATION_TICKS, BURST_RADIUS);
    }

    /// Advances the service by one world tick: resync queue and bursts every
    /// tick, ambient particles on their own slower clock.
    pub fn tick(&mut self, world: &mut impl WorldView, rng: &mut impl Rng) {
        self.tick_count += 1;
        self.resync
            .tick(&mut self.ledger, &self.registry, &self.store, world);
        if self.tick_count.is_multiple_of(PARTICLE_TICK_INTERVAL) {
            particles::emit_ambient_particles(&self.ledger, world, rng);
        }
    }

    /// The ledger, for inspection.
    #[must_use]
    pub fn ledger(&self) -> &LeafLedger {
        &self.ledger
    }

    /// The resync queue, for inspection.
    #[must_use]
    pub fn resync(&self) -> &ResyncQueue {
        &self.resync
    }

    /// The durable store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }
}
