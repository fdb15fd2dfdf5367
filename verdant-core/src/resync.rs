//! The resync scheduler: time-boxed repeated visual reassertion.
//!
//! After a disruptive event (block break, physics recompute, outbound block
//! or chunk packet), the host engine may recompute derived block state over
//! several of its own ticks and revert the overlay's visual. There is no
//! completion signal to react to, so the repair is a bounded polling loop: a
//! queued position is re-resolved and re-sent every tick until its window
//! expires, with a fixed per-tick budget so a burst of events never turns
//! into unbounded per-tick work.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use verdant_utils::{BlockPos, WorldId, types::RegionPos};

use crate::ledger::{self, LeafLedger, RegionKey};
use crate::registry::LeafRegistry;
use crate::world::{ObserverId, RegionStore, WorldView};

/// Radius within which observers receive reasserted visuals.
pub const RESYNC_VIEW_RADIUS: f64 = 32.0;
/// Shared per-tick budget across queue drains and observer bursts.
pub const MAX_RESENDS_PER_TICK: usize = 800;
/// Default duration of a disruption-triggered resync window, in ticks.
pub const RESYNC_DURATION_TICKS: u32 = 12;
/// Duration of a per-observer reassertion burst, in ticks.
pub const BURST_DURATION_TICKS: u32 = 12;
/// Radius of a per-observer reassertion burst, in blocks.
pub const BURST_RADIUS: f64 = 16.0;

#[derive(Debug, Clone, Copy)]
struct Burst {
    remaining: u32,
    radius: f64,
}

type QueueKey = (WorldId, BlockPos);

/// Priority-free queue of positions to repeatedly reassert, plus the
/// per-observer bursts driven by outbound packets.
#[derive(Debug, Default)]
pub struct ResyncQueue {
    order: VecDeque<QueueKey>,
    remaining: FxHashMap<QueueKey, u32>,
    bursts: FxHashMap<ObserverId, Burst>,
}

impl ResyncQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a position for reassertion over the next `duration` ticks.
    ///
    /// A position already queued keeps the larger of the two windows; an
    /// in-flight window is never shortened.
    pub fn enqueue(&mut self, world: WorldId, pos: BlockPos, duration: u32) {
        if duration == 0 {
            return;
        }
        let key = (world, pos);
        match self.remaining.get_mut(&key) {
            Some(remaining) => *remaining = (*remaining).max(duration),
            None => {
                self.remaining.insert(key, duration);
                self.order.push_back(key);
            }
        }
    }

    /// Starts a reassertion burst for one observer, cancelling and replacing
    /// any burst already running for it.
    pub fn start_burst(&mut self, observer: ObserverId, duration: u32, radius: f64) {
        self.bursts.insert(
            observer,
            Burst {
                remaining: duration,
                radius,
            },
        );
    }

    /// Number of queued positions.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.order.len()
    }

    /// Remaining window of a queued position, if queued.
    #[must_use]
    pub fn remaining(&self, world: WorldId, pos: BlockPos) -> Option<u32> {
        self.remaining.get(&(world, pos)).copied()
    }

    /// Remaining window of an observer's burst, if one is running.
    #[must_use]
    pub fn burst_remaining(&self, observer: ObserverId) -> Option<u32> {
        self.bursts.get(&observer).map(|b| b.remaining)
    }

    /// Advances the scheduler by one tick.
    ///
    /// Runs the observer bursts first, then drains queued positions, both
    /// against the shared [`MAX_RESENDS_PER_TICK`] budget. Returns the
    /// number of visual sends spent.
    pub fn tick(
        &mut self,
        ledger: &mut LeafLedger,
        registry: &LeafRegistry,
        store: &impl RegionStore,
        world: &mut impl WorldView,
    ) -> usize {
        let mut budget = MAX_RESENDS_PER_TICK;
        self.tick_bursts(ledger, world, &mut budget);
        self.drain_queue(ledger, registry, store, world, &mut budget);
        MAX_RESENDS_PER_TICK - budget
    }

    fn tick_bursts(&mut self, ledger: &LeafLedger, world: &mut impl WorldView, budget: &mut usize) {
        if self.bursts.is_empty() {
            return;
        }

        let observers = world.observers();
        let mut finished = Vec::new();

        for (&observer_id, burst) in &mut self.bursts {
            let Some(observer) = observers.iter().find(|o| o.id == observer_id) else {
                finished.push(observer_id);
                continue;
            };

            let radius_squared = burst.radius * burst.radius;
            let min_region = RegionPos::containing(observer.pos.x - burst.radius, observer.pos.z - burst.radius);
            let max_region = RegionPos::containing(observer.pos.x + burst.radius, observer.pos.z + burst.radius);

            'regions: for rx in min_region.0.x..=max_region.0.x {
                for rz in min_region.0.z..=max_region.0.z {
                    let key = RegionKey::new(observer.world, RegionPos::new(rx, rz));
                    let Some(map) = ledger.region_entries(&key) else {
                        continue;
                    };
                    for (pos, entry) in map {
                        if *budget == 0 {
                            break 'regions;
                        }
                        if pos.center().distance_squared(&observer.pos) > radius_squared {
                            continue;
                        }
                        world.send_block_visual(observer_id, *pos, entry.leaf.visual);
                        *budget -= 1;
                    }
                }
            }

            burst.remaining = burst.remaining.saturating_sub(1);
            if burst.remaining == 0 {
                finished.push(observer_id);
            }
        }

        for observer_id in finished {
            self.bursts.remove(&observer_id);
        }
    }

    fn drain_queue(
        &mut self,
        ledger: &mut LeafLedger,
        registry: &LeafRegistry,
        store: &impl RegionStore,
        world: &mut impl WorldView,
        budget: &mut usize,
    ) {
        // Cap at the queue length observed on entry so a requeued position is
        // not processed twice in one tick.
        let mut drains = self.order.len().min(*budget);

        while drains > 0 {
            drains -= 1;
            let Some(key) = self.order.pop_front() else {
                break;
            };
            let Some(window) = self.remaining.remove(&key) else {
                continue;
            };
            let (world_id, pos) = key;

            // The world may have changed since enqueue; re-resolve from
            // scratch and drop tasks that no longer qualify.
            let Some(leaf) = ledger.get_or_detect(world_id, pos, registry, store, world) else {
                continue;
            };
            if world.leaf_state(world_id, pos).is_none() {
                continue;
            }

            ledger::apply_leaf_state(world, world_id, pos, &leaf);
            for observer in world.observers_near(world_id, pos, RESYNC_VIEW_RADIUS) {
                world.send_block_visual(observer, pos, leaf.visual);
            }
            *budget = budget.saturating_sub(1);

            let window = window.saturating_sub(1);
            if window > 0 {
                self.remaining.insert(key, window);
                self.order.push_back(key);
            }
        }
    }
}
