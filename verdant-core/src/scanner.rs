//! Region activation scan.
//!
//! Terrain generators place the host block directly into region data without
//! going through this core, so on every region activation we walk the region
//! once and adopt any host block the ledger does not know about yet.

use verdant_utils::BlockPos;

use crate::ledger::{LeafLedger, RegionKey};
use crate::registry::LeafRegistry;
use crate::world::{RegionStore, WorldView};

/// Scans every column of a region and adopts unregistered host blocks as
/// non-persistent entries.
///
/// Existing entries are never overwritten, so deliberate placements always
/// win over detection, and re-scanning is a per-position no-op. Nothing is
/// written to durable storage.
pub fn scan_region(
    ledger: &mut LeafLedger,
    key: RegionKey,
    registry: &LeafRegistry,
    store: &impl RegionStore,
    world: &mut impl WorldView,
) {
    if !ledger.is_loaded(&key) {
        ledger.load_region(key, registry, store, world);
    }

    let (min_y, max_y) = world.height_range(key.world);
    let base_x = key.pos.0.x << 4;
    let base_z = key.pos.0.z << 4;

    let mut adopted = 0usize;
    for dx in 0..16 {
        for dz in 0..16 {
            for y in min_y..max_y {
                let pos = BlockPos::new(base_x + dx, y, base_z + dz);
                let Some(state) = world.leaf_state(key.world, pos) else {
                    continue;
                };
                if ledger
                    .region_entries(&key)
                    .is_some_and(|map| map.contains_key(&pos))
                {
                    continue;
                }
                let Some(leaf) = registry.by_distance(state.distance).or_else(|| registry.first())
                else {
                    continue;
                };
                ledger.adopt(key.world, pos, leaf.clone(), registry, store, world);
                adopted += 1;
            }
        }
    }

    if adopted > 0 {
        log::debug!(
            "Adopted {adopted} generated leaves in region {},{}",
            key.pos.0.x,
            key.pos.0.z
        );
    }
}

#[cfg(test)]
mod tests {
    use verdant_utils::types::RegionPos;

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

    #[test]
    fn scan_adopts_generated_leaves() {
        let registry = registry();
        let store = MemoryRegionStore::new();
        let mut world = TestWorld::new();
        let world_id = world.world_id;
        let mut ledger = LeafLedger::new();

        world.place_host(BlockPos::new(3, 60, 3), LeafState::generated(2));
        world.place_host(BlockPos::new(9, 100, 12), LeafState::generated(3));
        // Outside the scanned region, must be left alone.
        world.place_host(BlockPos::new(20, 60, 3), LeafState::generated(2));

        let key = RegionKey::new(world_id, RegionPos::new(0, 0));
        scan_region(&mut ledger, key, &registry, &store, &mut world);

        let map = ledger.region_entries(&key).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&BlockPos::new(3, 60, 3)].leaf.id, "lavender");
        assert_eq!(map[&BlockPos::new(9, 100, 12)].leaf.id, "amber");
        assert!(map.values().all(|entry| !entry.persistent));

        // Adoption normalized the live state.
        assert_eq!(
            world.leaf_state(world_id, BlockPos::new(3, 60, 3)),
            Some(registry.find("lavender").unwrap().visual)
        );
    }

    #[test]
    fn scan_never_overwrites_registered_entries() {
        let registry = registry();
        let mut store = MemoryRegionStore::new();
        let mut world = TestWorld::new();
        let world_id = world.world_id;
        let mut ledger = LeafLedger::new();

        // A deliberately placed lavender leaf whose live state was reverted
        // to a distance that detection would map to amber.
        let pos = BlockPos::new(5, 64, 5);
        let lavender = registry.find("lavender").unwrap().clone();
        ledger.register(world_id, pos, lavender, &registry, &mut store, &mut world);
        world.place_host(pos, LeafState::generated(3));

        let key = RegionKey::new(world_id, RegionPos::new(0, 0));
        scan_region(&mut ledger, key, &registry, &store, &mut world);
        scan_region(&mut ledger, key, &registry, &store, &mut world);

        let map = ledger.region_entries(&key).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&pos].leaf.id, "lavender");
        assert!(map[&pos].persistent);
    }
}
