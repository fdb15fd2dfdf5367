//! Ambient falling-leaf particles.
//!
//! A fixed low-frequency clock, independent of world events: every interval
//! it samples a few registered, deliberately placed leaves near each
//! observer and emits a small dust effect, under strict global and
//! per-observer quotas. Runs silently dry when budgets are spent or nothing
//! is nearby.

use rand::Rng;
use verdant_utils::math::Vector3;
use verdant_utils::types::RegionPos;

use crate::ledger::{LeafLedger, RegionKey};
use crate::world::WorldView;

/// Ticks between emitter invocations.
pub const PARTICLE_TICK_INTERVAL: u64 = 10;
/// How far from the observer's region candidate regions are sampled.
pub const PARTICLE_REGION_RADIUS: i32 = 2;
/// Global particle budget per invocation.
pub const MAX_PARTICLES_PER_TICK: u32 = 40;
/// Sampling attempts per observer per invocation.
pub const MAX_PARTICLES_PER_OBSERVER: u32 = 3;
/// Maximum distance from observer to an emitting leaf, in blocks.
pub const PARTICLE_OBSERVER_RADIUS: f64 = 32.0;
/// Rendered dust size.
pub const PARTICLE_SIZE: f32 = 1.0;

/// Runs one emitter invocation.
///
/// Returns the number of particles emitted, mostly for tests.
pub fn emit_ambient_particles(
    ledger: &LeafLedger,
    world: &mut impl WorldView,
    rng: &mut impl Rng,
) -> u32 {
    let observers = world.observers();
    if observers.is_empty() {
        return 0;
    }

    let radius_squared = PARTICLE_OBSERVER_RADIUS * PARTICLE_OBSERVER_RADIUS;
    let mut remaining = MAX_PARTICLES_PER_TICK;

    'observers: for observer in observers {
        if remaining == 0 {
            break;
        }
        let base = RegionPos::containing(observer.pos.x, observer.pos.z);

        let attempts = MAX_PARTICLES_PER_OBSERVER.min(remaining);
        for _ in 0..attempts {
            let region = RegionPos::new(
                base.0.x + rng.random_range(-PARTICLE_REGION_RADIUS..=PARTICLE_REGION_RADIUS),
                base.0.z + rng.random_range(-PARTICLE_REGION_RADIUS..=PARTICLE_REGION_RADIUS),
            );
            let key = RegionKey::new(observer.world, region);
            let Some(map) = ledger.region_entries(&key) else {
                continue;
            };
            if map.is_empty() {
                continue;
            }

            // Uniform pick over the region's entries; no guarantee beyond
            // "roughly near the observer".
            let index = rng.random_range(0..map.len());
            let Some((pos, entry)) = map.iter().nth(index) else {
                continue;
            };
            if !entry.persistent {
                continue;
            }
            if pos.center().distance_squared(&observer.pos) > radius_squared {
                continue;
            }
            // The block may have been broken since registration.
            if world.leaf_state(observer.world, *pos).is_none() {
                continue;
            }

            let amount = entry.leaf.particle_amount.min(remaining);
            if amount == 0 {
                continue;
            }
            for _ in 0..amount {
                let point = Vector3::new(
                    f64::from(pos.0.x) + 0.25 + rng.random::<f64>() * 0.5,
                    f64::from(pos.0.y) + 0.2 + rng.random::<f64>() * 0.6,
                    f64::from(pos.0.z) + 0.25 + rng.random::<f64>() * 0.5,
                );
                world.emit_dust(observer.id, point, entry.leaf.particle_color, PARTICLE_SIZE);
            }
            remaining -= amount;
            if remaining == 0 {
                break 'observers;
            }
        }
    }

    MAX_PARTICLES_PER_TICK - remaining
}
