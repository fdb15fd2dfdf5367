//! The position ledger: which blocks are overlaid, per region.
//!
//! The ledger exclusively owns all entries; every other component looks
//! positions up by coordinate. Regions materialize lazily from the durable
//! store on first access and are written through whenever a persistent entry
//! is inserted or removed.
//!
//! Durable encoding, one string record per region:
//! `x,y,z:typeId;` repeated, empty record meaning no entries. Only
//! persistent (deliberately placed) entries are written; detected ones are
//! rebuilt by the region scan.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use verdant_utils::{BlockPos, WorldId, types::RegionPos};

use crate::registry::{LeafRegistry, LeafType};
use crate::world::{RegionStore, WorldView};

/// Identifies one region of one world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionKey {
    /// The world the region belongs to.
    pub world: WorldId,
    /// The region's horizontal position.
    pub pos: RegionPos,
}

impl RegionKey {
    /// Creates a region key.
    #[must_use]
    pub const fn new(world: WorldId, pos: RegionPos) -> Self {
        Self { world, pos }
    }

    /// The region key containing a block position.
    #[must_use]
    pub const fn containing(world: WorldId, pos: BlockPos) -> Self {
        Self::new(world, pos.region())
    }
}

/// One ledger entry.
#[derive(Debug, Clone)]
pub struct LeafEntry {
    /// The overlay type at this position.
    pub leaf: Arc<LeafType>,
    /// Whether the entry was deliberately placed and must survive restart,
    /// as opposed to auto-detected from a generated host block.
    pub persistent: bool,
}

/// Map of block position to entry within one region.
pub type RegionMap = FxHashMap<BlockPos, LeafEntry>;

/// Re-applies a leaf type's visual template to the live block, if its native
/// state differs. Never notifies observers; the resync path does that.
pub fn apply_leaf_state(
    world: &mut impl WorldView,
    world_id: WorldId,
    pos: BlockPos,
    leaf: &LeafType,
) {
    if world.leaf_state(world_id, pos) != Some(leaf.visual) {
        world.set_leaf_state(world_id, pos, leaf.visual);
    }
}

/// Encodes a region map's persistent entries as a durable record.
///
/// Returns `None` when nothing needs persisting, which callers map to
/// removing the stored record.
#[must_use]
pub fn encode_record(map: &RegionMap) -> Option<String> {
    let mut record = String::new();
    for (pos, entry) in map {
        if !entry.persistent {
            continue;
        }
        record.push_str(&format!(
            "{},{},{}:{};",
            pos.0.x, pos.0.y, pos.0.z, entry.leaf.id
        ));
    }
    if record.is_empty() { None } else { Some(record) }
}

/// Decodes a region record into a map of persistent entries.
///
/// Malformed entries, unknown type ids, and coordinates outside the region's
/// own bounds are all dropped; the dropped count comes back alongside the
/// map so the caller can log it once.
#[must_use]
pub fn decode_record(raw: &str, key: &RegionKey, registry: &LeafRegistry) -> (RegionMap, usize) {
    let mut map = RegionMap::default();
    let mut skipped = 0;

    for part in raw.split(';') {
        if part.is_empty() {
            continue;
        }
        let Some((coords, type_id)) = part.split_once(':') else {
            skipped += 1;
            continue;
        };
        let mut axes = coords.split(',');
        let (Some(x), Some(y), Some(z), None) =
            (axes.next(), axes.next(), axes.next(), axes.next())
        else {
            skipped += 1;
            continue;
        };
        let (Ok(x), Ok(y), Ok(z)) = (x.parse(), y.parse(), z.parse()) else {
            skipped += 1;
            continue;
        };
        let Some(leaf) = registry.find(type_id) else {
            skipped += 1;
            continue;
        };

        let pos = BlockPos::new(x, y, z);
        if !key.pos.contains(&pos) {
            skipped += 1;
            continue;
        }

        map.insert(
            pos,
            LeafEntry {
                leaf: leaf.clone(),
                persistent: true,
            },
        );
    }

    (map, skipped)
}

/// The in-memory, durably backed registry of overlaid positions.
#[derive(Debug, Default)]
pub struct LeafLedger {
    regions: FxHashMap<RegionKey, RegionMap>,
}

impl LeafLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a region's record from the store, replacing any in-memory map,
    /// and eagerly re-applies each surviving entry's visual template to the
    /// live block (self-healing on load).
    pub fn load_region(
        &mut self,
        key: RegionKey,
        registry: &LeafRegistry,
        store: &impl RegionStore,
        world: &mut impl WorldView,
    ) {
        let (map, skipped) = match store.get(&key) {
            Some(raw) => decode_record(&raw, &key, registry),
            None => (RegionMap::default(), 0),
        };
        if skipped > 0 {
            log::warn!(
                "Skipped {skipped} invalid or out-of-region entries in record for region {},{}",
                key.pos.0.x,
                key.pos.0.z
            );
        }
        for (pos, entry) in &map {
            apply_leaf_state(world, key.world, *pos, &entry.leaf);
        }
        self.regions.insert(key, map);
    }

    fn region_map(
        &mut self,
        key: RegionKey,
        registry: &LeafRegistry,
        store: &impl RegionStore,
        world: &mut impl WorldView,
    ) -> &mut RegionMap {
        if !self.regions.contains_key(&key) {
            self.load_region(key, registry, store, world);
        }
        self.regions.entry(key).or_default()
    }

    /// Pure lookup. Lazily materializes the owning region from the store on
    /// first access; never inspects the live block.
    pub fn get(
        &mut self,
        world_id: WorldId,
        pos: BlockPos,
        registry: &LeafRegistry,
        store: &impl RegionStore,
        world: &mut impl WorldView,
    ) -> Option<Arc<LeafType>> {
        let key = RegionKey::containing(world_id, pos);
        self.region_map(key, registry, store, world)
            .get(&pos)
            .map(|entry| entry.leaf.clone())
    }

    /// Lookup with detection fallback: a live host block with no entry is
    /// adopted as a non-persistent entry, resolved by its `distance` state
    /// (or the first registered type), and its native state normalized.
    pub fn get_or_detect(
        &mut self,
        world_id: WorldId,
        pos: BlockPos,
        registry: &LeafRegistry,
        store: &impl RegionStore,
        world: &mut impl WorldView,
    ) -> Option<Arc<LeafType>> {
        if let Some(leaf) = self.get(world_id, pos, registry, store, world) {
            return Some(leaf);
        }

        let state = world.leaf_state(world_id, pos)?;
        let leaf = registry
            .by_distance(state.distance)
            .or_else(|| registry.first())?
            .clone();

        self.adopt(world_id, pos, leaf.clone(), registry, store, world);
        Some(leaf)
    }

    /// Inserts a non-persistent entry and normalizes the live block, without
    /// touching durable storage. Used by detection and the region scanner.
    pub fn adopt(
        &mut self,
        world_id: WorldId,
        pos: BlockPos,
        leaf: Arc<LeafType>,
        registry: &LeafRegistry,
        store: &impl RegionStore,
        world: &mut impl WorldView,
    ) {
        let key = RegionKey::containing(world_id, pos);
        self.region_map(key, registry, store, world).insert(
            pos,
            LeafEntry {
                leaf: leaf.clone(),
                persistent: false,
            },
        );
        apply_leaf_state(world, world_id, pos, &leaf);
    }

    /// Inserts a persistent entry, applies the type's visual template to the
    /// live block, and writes the owning region through to the store.
    pub fn register(
        &mut self,
        world_id: WorldId,
        pos: BlockPos,
        leaf: Arc<LeafType>,
        registry: &LeafRegistry,
        store: &mut impl RegionStore,
        world: &mut impl WorldView,
    ) {
        let key = RegionKey::containing(world_id, pos);
        self.region_map(key, registry, store, world).insert(
            pos,
            LeafEntry {
                leaf: leaf.clone(),
                persistent: true,
            },
        );
        apply_leaf_state(world, world_id, pos, &leaf);
        self.persist_region(key, store);
    }

    /// Removes the entry at a position, if any, writing the region through
    /// when a persistent entry was removed. Lazily materializes the owning
    /// region first, so removal reaches entries whose region was evicted.
    pub fn unregister(
        &mut self,
        world_id: WorldId,
        pos: BlockPos,
        registry: &LeafRegistry,
        store: &mut impl RegionStore,
        world: &mut impl WorldView,
    ) -> Option<LeafEntry> {
        let key = RegionKey::containing(world_id, pos);
        let removed = self.region_map(key, registry, store, world).remove(&pos)?;
        if removed.persistent {
            self.persist_region(key, store);
        }
        Some(removed)
    }

    /// Writes a region's persistent entries to the store, removing the
    /// record entirely when none remain.
    pub fn persist_region(&self, key: RegionKey, store: &mut impl RegionStore) {
        match self.regions.get(&key).and_then(encode_record) {
            Some(record) => store.set(&key, record),
            None => store.remove(&key),
        }
    }

    /// Drops a region's in-memory map. The durable record is untouched; the
    /// next access reloads it.
    pub fn evict_region(&mut self, key: &RegionKey) {
        self.regions.remove(key);
    }

    /// Clears every in-memory region map. Durable storage is untouched.
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// The in-memory entries of a region, if it is materialized.
    #[must_use]
    pub fn region_entries(&self, key: &RegionKey) -> Option<&RegionMap> {
        self.regions.get(key)
    }

    /// Whether a region is currently materialized in memory.
    #[must_use]
    pub fn is_loaded(&self, key: &RegionKey) -> bool {
        self.regions.contains_key(key)
    }

    /// Iterates all materialized regions.
    pub fn regions(&self) -> impl Iterator<Item = (&RegionKey, &RegionMap)> {
        self.regions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LeafConfig;
    use crate::test_world::TestWorld;
    use crate::world::{LeafState, MemoryRegionStore};

    fn registry() -> LeafRegistry {
        LeafRegistry::load(
            &LeafConfig::load_from_str(
                r#"{
                    leaves: {
                        amber: { distance_id: 3 },
                        lavender: { distance_id: 2 },
                    }
                }"#,
            )
            .unwrap(),
        )
    }

    fn entry(registry: &LeafRegistry, id: &str, persistent: bool) -> LeafEntry {
        LeafEntry {
            leaf: registry.find(id).unwrap().clone(),
            persistent,
        }
    }

    #[test]
    fn record_round_trip() {
        let registry = registry();
        let key = RegionKey::new(uuid::Uuid::nil(), RegionPos::new(0, 0));

        let mut map = RegionMap::default();
        map.insert(BlockPos::new(5, 70, 5), entry(&registry, "amber", true));
        map.insert(BlockPos::new(15, -3, 0), entry(&registry, "lavender", true));
        map.insert(BlockPos::new(1, 64, 1), entry(&registry, "amber", false));

        let record = encode_record(&map).unwrap();
        let (decoded, skipped) = decode_record(&record, &key, &registry);

        assert_eq!(skipped, 0);
        // Only the persistent entries survive the trip.
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[&BlockPos::new(5, 70, 5)].leaf.id, "amber");
        assert_eq!(decoded[&BlockPos::new(15, -3, 0)].leaf.id, "lavender");
        assert!(!decoded.contains_key(&BlockPos::new(1, 64, 1)));
    }

    #[test]
    fn empty_map_encodes_to_no_record() {
        let mut map = RegionMap::default();
        assert!(encode_record(&map).is_none());

        let registry = registry();
        map.insert(BlockPos::new(1, 64, 1), entry(&registry, "amber", false));
        assert!(encode_record(&map).is_none());
    }

    #[test]
    fn decode_drops_out_of_region_coordinates() {
        // Scenario: region (0,0) covers x,z in [0,16); the second entry
        // belongs to region (6,6) and must be dropped.
        let registry = registry();
        let key = RegionKey::new(uuid::Uuid::nil(), RegionPos::new(0, 0));

        let (map, skipped) = decode_record("5,70,5:amber;99,70,99:amber;", &key, &registry);
        assert_eq!(map.len(), 1);
        assert_eq!(skipped, 1);
        assert!(map.contains_key(&BlockPos::new(5, 70, 5)));
    }

    #[test]
    fn decode_skips_malformed_and_unknown_entries() {
        let registry = registry();
        let key = RegionKey::new(uuid::Uuid::nil(), RegionPos::new(0, 0));

        let raw = "5,70:amber;a,b,c:amber;1,64,1:departed;2,64,2;3,64,3:amber;";
        let (map, skipped) = decode_record(raw, &key, &registry);
        assert_eq!(map.len(), 1);
        assert_eq!(skipped, 4);
        assert!(map.contains_key(&BlockPos::new(3, 64, 3)));
    }

    #[test]
    fn register_then_unregister_updates_store() {
        // Scenario: register (10,64,10) as amber, look it up, unregister it,
        // and check the durable record no longer mentions the coordinate.
        let registry = registry();
        let mut store = MemoryRegionStore::new();
        let mut world = TestWorld::new();
        let world_id = world.world_id;
        let mut ledger = LeafLedger::new();

        let pos = BlockPos::new(10, 64, 10);
        let amber = registry.find("amber").unwrap().clone();
        ledger.register(world_id, pos, amber, &registry, &mut store, &mut world);

        assert_eq!(
            ledger
                .get(world_id, pos, &registry, &store, &mut world)
                .unwrap()
                .id,
            "amber"
        );
        // The visual template landed on the live block.
        assert_eq!(
            world.leaf_state(world_id, pos),
            Some(registry.find("amber").unwrap().visual)
        );
        let key = RegionKey::containing(world_id, pos);
        assert!(store.get(&key).unwrap().contains("10,64,10:amber"));

        ledger.unregister(world_id, pos, &registry, &mut store, &mut world);
        assert!(
            ledger
                .get(world_id, pos, &registry, &store, &mut world)
                .is_none()
        );
        assert!(store.get(&key).is_none());
    }

    #[test]
    fn unregister_reaches_entries_in_evicted_regions() {
        let registry = registry();
        let mut store = MemoryRegionStore::new();
        let mut world = TestWorld::new();
        let world_id = world.world_id;
        let mut ledger = LeafLedger::new();

        let pos = BlockPos::new(10, 64, 10);
        let amber = registry.find("amber").unwrap().clone();
        ledger.register(world_id, pos, amber, &registry, &mut store, &mut world);

        // The region went out of memory; the durable record must still be
        // rewritten when the entry is removed.
        let key = RegionKey::containing(world_id, pos);
        ledger.evict_region(&key);
        let removed = ledger.unregister(world_id, pos, &registry, &mut store, &mut world);
        assert!(removed.is_some_and(|entry| entry.persistent));
        assert!(store.get(&key).is_none());

        // Nothing resurrects on the next region load.
        ledger.evict_region(&key);
        ledger.load_region(key, &registry, &store, &mut world);
        assert!(ledger.region_entries(&key).unwrap().is_empty());
    }

    #[test]
    fn get_reads_through_from_store() {
        let registry = registry();
        let mut store = MemoryRegionStore::new();
        let mut world = TestWorld::new();
        let world_id = world.world_id;

        let key = RegionKey::new(world_id, RegionPos::new(0, 4));
        store.set(&key, "3,80,70:lavender;".to_string());

        let mut ledger = LeafLedger::new();
        let pos = BlockPos::new(3, 80, 70);
        assert_eq!(
            ledger
                .get(world_id, pos, &registry, &store, &mut world)
                .unwrap()
                .id,
            "lavender"
        );
        // Loading self-healed the live block.
        assert_eq!(
            world.leaf_state(world_id, pos),
            Some(registry.find("lavender").unwrap().visual)
        );
    }

    #[test]
    fn detection_is_idempotent() {
        let registry = registry();
        let store = MemoryRegionStore::new();
        let mut world = TestWorld::new();
        let world_id = world.world_id;
        let pos = BlockPos::new(4, 90, 4);

        // A generated host block with a recognizable distance.
        world.place_host(pos, LeafState::generated(2));

        let mut ledger = LeafLedger::new();
        let first = ledger
            .get_or_detect(world_id, pos, &registry, &store, &mut world)
            .unwrap();
        assert_eq!(first.id, "lavender");
        // Detection normalized the native state without persisting anything.
        assert_eq!(world.leaf_state(world_id, pos), Some(first.visual));
        assert!(store.get(&RegionKey::containing(world_id, pos)).is_none());

        let second = ledger
            .get_or_detect(world_id, pos, &registry, &store, &mut world)
            .unwrap();
        assert_eq!(second.id, "lavender");
        let key = RegionKey::containing(world_id, pos);
        assert_eq!(ledger.region_entries(&key).unwrap().len(), 1);
    }

    #[test]
    fn detection_falls_back_to_first_type() {
        let registry = registry();
        let store = MemoryRegionStore::new();
        let mut world = TestWorld::new();
        let world_id = world.world_id;
        let pos = BlockPos::new(8, 90, 8);

        // Distance 7 maps to no registered type.
        world.place_host(pos, LeafState::generated(7));

        let mut ledger = LeafLedger::new();
        let leaf = ledger
            .get_or_detect(world_id, pos, &registry, &store, &mut world)
            .unwrap();
        assert_eq!(leaf.id, registry.first().unwrap().id);
    }

    #[test]
    fn detection_ignores_non_host_blocks() {
        let registry = registry();
        let store = MemoryRegionStore::new();
        let mut world = TestWorld::new();
        let world_id = world.world_id;

        let mut ledger = LeafLedger::new();
        assert!(
            ledger
                .get_or_detect(world_id, BlockPos::new(0, 64, 0), &registry, &store, &mut world)
                .is_none()
        );
    }
}
