//! The fixed-capacity wave-particle pool.

use std::sync::Mutex;

use crate::config::WaveConfig;
use crate::error::{CoreError, Result};
use crate::particle::{ParticleSeed, WaveParticle};

/// Interior pool state, guarded by a single mutex.
struct PoolState {
    /// Fixed backing arena; allocated once, slots are recycled in place.
    slots: Vec<WaveParticle>,
    /// Indices of currently contributing slots, in activation order.
    alive: Vec<usize>,
    /// Per-slot aliveness flag, mirrors `alive` membership.
    alive_flags: Vec<bool>,
    /// Next slot handed out for reuse; wraps modulo capacity.
    cursor: usize,
}

/// Single source of truth for which wave particles exist and are active.
///
/// The pool never runs out: spawning into a saturated pool forcibly recycles
/// the slot under the cursor, trading per-particle lifetime guarantees for
/// visual continuity. All mutation and snapshot reads go through one lock,
/// so any number of producer threads may spawn concurrently with the render
/// thread taking its per-frame snapshot.
pub struct WaveParticleManager {
    config: WaveConfig,
    state: Mutex<PoolState>,
}

impl WaveParticleManager {
    /// Creates a pool with `config.pool_capacity` dormant slots.
    pub fn new(config: &WaveConfig) -> Result<Self> {
        config.validate()?;
        let capacity = config.pool_capacity;
        log::debug!("wave particle pool created: {capacity} slots");
        Ok(Self {
            config: config.clone(),
            state: Mutex::new(PoolState {
                slots: vec![WaveParticle::dormant(); capacity],
                alive: Vec::with_capacity(capacity),
                alive_flags: vec![false; capacity],
                cursor: 0,
            }),
        })
    }

    /// Number of slots in the backing arena.
    pub fn capacity(&self) -> usize {
        self.config.pool_capacity
    }

    /// The configuration this pool was built with.
    pub fn config(&self) -> &WaveConfig {
        &self.config
    }

    /// Activates the next slot in cursor order and returns its index.
    ///
    /// When the pool is saturated this evicts the longest-unrefreshed slot;
    /// spawning never fails.
    pub fn spawn(&self, seed: ParticleSeed) -> usize {
        let mut state = self.lock();
        let index = state.cursor;
        state.cursor = (state.cursor + 1) % state.slots.len();
        state.slots[index].activate(&seed);
        if !state.alive_flags[index] {
            state.alive_flags[index] = true;
            state.alive.push(index);
        }
        index
    }

    /// Number of currently alive particles.
    pub fn alive_count(&self) -> usize {
        self.lock().alive.len()
    }

    /// Point-in-time copy of the alive particles, in alive-list order.
    pub fn snapshot(&self) -> Vec<WaveParticle> {
        let state = self.lock();
        state.alive.iter().map(|&i| state.slots[i]).collect()
    }

    /// One simulation tick: snapshot pre-update state, then advance.
    ///
    /// Under a single lock acquisition, each alive particle's current state
    /// is copied into the returned snapshot and the particle is then advanced
    /// by `delta_time`. Particles whose termination bound was crossed are
    /// dropped from the alive list afterwards, so they still appear in this
    /// frame's snapshot but not in the next.
    pub fn snapshot_and_advance(&self, delta_time: f32) -> Vec<WaveParticle> {
        let mut state = self.lock();
        let state = &mut *state;

        let mut frame = Vec::with_capacity(state.alive.len());
        for &index in &state.alive {
            frame.push(state.slots[index]);
            state.slots[index].advance(delta_time, &self.config);
        }

        let slots = &state.slots;
        let alive_flags = &mut state.alive_flags;
        let config = &self.config;
        state.alive.retain(|&index| {
            let keep = !slots[index].is_expired(config);
            if !keep {
                alive_flags[index] = false;
            }
            keep
        });

        frame
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PoolState> {
        // A poisoned pool means a panic mid-mutation on another thread; the
        // arena itself is still index-consistent, so keep going.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn test_config(capacity: usize) -> WaveConfig {
        WaveConfig {
            pool_capacity: capacity,
            particle_grid_width: 64,
            particle_grid_height: 64,
            ..WaveConfig::default()
        }
    }

    fn seed(x: f32) -> ParticleSeed {
        ParticleSeed {
            start_point: Vec2::new(x, 0.5),
            direction: Vec2::Y,
            speed: 0.1,
            amplitude: 1.0,
        }
    }

    #[test]
    fn zero_capacity_fails_fast() {
        assert!(WaveParticleManager::new(&test_config(0)).is_err());
    }

    #[test]
    fn cursor_wraps_after_capacity_spawns() {
        let pool = WaveParticleManager::new(&test_config(4)).expect("pool");
        let indices: Vec<usize> = (0..5).map(|i| pool.spawn(seed(i as f32))).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 0]);
        assert_eq!(pool.alive_count(), 4);
    }

    #[test]
    fn saturated_spawn_evicts_slot_zero() {
        let pool = WaveParticleManager::new(&test_config(4)).expect("pool");
        for i in 0..4 {
            pool.spawn(seed(i as f32));
        }
        pool.spawn(ParticleSeed {
            start_point: Vec2::new(0.9, 0.9),
            direction: Vec2::X,
            speed: 0.3,
            amplitude: 2.0,
        });

        // Slot 0 was reactivated with the new parameters; alive set stayed
        // within capacity and gained no duplicate.
        assert_eq!(pool.alive_count(), 4);
        let snapshot = pool.snapshot();
        let evicted = snapshot
            .iter()
            .find(|p| p.start_point == Vec2::new(0.9, 0.9))
            .expect("recycled particle present");
        assert_eq!(evicted.amplitude, 2.0);
        assert_eq!(evicted.time, 0.0);
    }

    #[test]
    fn expired_particles_leave_next_snapshot() {
        let config = WaveConfig {
            max_lifetime: 1.0,
            max_radius: 100.0,
            radius_growth: 0.001,
            ..test_config(4)
        };
        let pool = WaveParticleManager::new(&config).expect("pool");
        for i in 0..3 {
            pool.spawn(seed(i as f32));
        }

        // The expiring frame still packs all three.
        let frame = pool.snapshot_and_advance(2.0);
        assert_eq!(frame.len(), 3);
        // All crossed the lifetime bound, so the next snapshot is empty.
        assert_eq!(pool.snapshot().len(), 0);
        assert_eq!(pool.alive_count(), 0);
    }

    #[test]
    fn snapshot_and_advance_returns_pre_update_state() {
        let pool = WaveParticleManager::new(&test_config(2)).expect("pool");
        pool.spawn(seed(0.5));
        let frame = pool.snapshot_and_advance(1.0);
        assert_eq!(frame[0].time, 0.0);
        let next = pool.snapshot();
        assert!((next[0].time - 1.0).abs() < 1e-6);
    }

    #[test]
    fn snapshot_is_read_consistent() {
        let pool = WaveParticleManager::new(&test_config(8)).expect("pool");
        pool.spawn(seed(0.1));
        let a = pool.snapshot();
        let b = pool.snapshot();
        assert_eq!(a, b);
    }

    #[test]
    fn concurrent_spawns_keep_alive_set_consistent() {
        let pool = Arc::new(WaveParticleManager::new(&test_config(16)).expect("pool"));
        let threads: Vec<_> = (0..8)
            .map(|t| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        pool.spawn(seed((t * 100 + i) as f32 / 1000.0));
                    }
                })
            })
            .collect();
        for handle in threads {
            handle.join().expect("spawner thread");
        }

        assert!(pool.alive_count() <= 16);
        let state = pool.lock();
        let unique: HashSet<usize> = state.alive.iter().copied().collect();
        assert_eq!(unique.len(), state.alive.len(), "duplicate alive slots");
        for &index in &state.alive {
            assert!(state.alive_flags[index]);
        }
    }

    proptest! {
        #[test]
        fn spawn_indices_follow_cursor_order(capacity in 1usize..64, spawns in 0usize..256) {
            let pool = WaveParticleManager::new(&test_config(capacity)).unwrap();
            for i in 0..spawns {
                let index = pool.spawn(seed(0.5));
                prop_assert_eq!(index, i % capacity);
            }
            prop_assert_eq!(pool.alive_count(), spawns.min(capacity));
        }

        #[test]
        fn alive_never_exceeds_capacity(capacity in 1usize..32, spawns in 0usize..128, dt in 0.01f32..0.5) {
            let pool = WaveParticleManager::new(&test_config(capacity)).unwrap();
            for _ in 0..spawns {
                pool.spawn(seed(0.5));
                let _ = pool.snapshot_and_advance(dt);
                prop_assert!(pool.alive_count() <= capacity);
            }
        }
    }
}
