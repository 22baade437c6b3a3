use super::buffer::{RenderBuffer, RenderPoint};
use super::{ParticleConfig, ParticlePolicy, ParticleState, ParticleUpdate};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Fixed-capacity particle pool.
///
/// Slot data is stored as parallel arrays indexed by slot. Retiring a slot
/// only clears its alive flag; stale values are overwritten on the next
/// spawn.
pub struct ParticlePool<P, R = StdRng> {
    config: ParticleConfig,
    policy: P,
    rng: R,

    alive: Vec<bool>,
    ages: Vec<f32>,
    lifespans: Vec<f32>,
    positions: Vec<Vec3>,
    scales: Vec<f32>,
    colors: Option<Vec<Vec3>>,

    buffer: RenderBuffer,
}

impl<P: ParticlePolicy> ParticlePool<P> {
    /// Create a pool with every slot dead, seeded from the OS
    pub fn new(config: ParticleConfig, policy: P) -> Self {
        Self::with_rng(config, policy, StdRng::from_os_rng())
    }
}

impl<P: ParticlePolicy, R: RngCore> ParticlePool<P, R> {
    pub fn with_rng(config: ParticleConfig, policy: P, rng: R) -> Self {
        let capacity = config.capacity;
        let use_color = config.use_color;

        tracing::debug!(
            "Allocating particle pool: capacity={}, birth_rate={}, color={}",
            capacity,
            config.birth_rate,
            use_color
        );

        Self {
            alive: vec![false; capacity],
            ages: vec![0.0; capacity],
            lifespans: vec![0.0; capacity],
            positions: vec![Vec3::ZERO; capacity],
            scales: vec![0.0; capacity],
            colors: use_color.then(|| vec![Vec3::ZERO; capacity]),
            buffer: RenderBuffer::new(capacity, use_color),
            config,
            policy,
            rng,
        }
    }

    /// Advance the simulation by `delta_seconds` and rebuild the render buffer
    pub fn step(&mut self, delta_seconds: f32) {
        let _span = tracing::debug_span!("particles_step").entered();

        let use_color = self.config.use_color;
        // Unspent quota is dropped at the end of the step
        let mut birth_quota = self.birth_quota(self.config.birth_rate * delta_seconds);
        let mut alive_count = 0;

        for slot in 0..self.config.capacity {
            if self.alive[slot] {
                let age = self.ages[slot] + delta_seconds;
                let lifespan = self.lifespans[slot];
                if age <= lifespan {
                    self.ages[slot] = age;

                    let update = ParticleUpdate {
                        age,
                        lifespan,
                        position: self.positions[slot],
                        scale: self.scales[slot],
                        color: self.colors.as_ref().map(|c| c[slot]),
                        delta_seconds,
                    };
                    let state = self.policy.advance(slot, &update, use_color);
                    self.store(slot, alive_count, state);
                    alive_count += 1;
                } else {
                    self.alive[slot] = false;
                }
            } else if birth_quota > 0 {
                birth_quota -= 1;

                self.alive[slot] = true;
                self.ages[slot] = 0.0;
                self.lifespans[slot] = self.draw_lifespan();

                let state = self.policy.spawn(slot, use_color, &mut self.rng);
                self.store(slot, alive_count, state);
                alive_count += 1;
            }
        }

        self.buffer.set_len(alive_count);
        tracing::trace!("Particle step: dt={:.4}, alive={}", delta_seconds, alive_count);
    }

    /// Whole units of budget always spawn; the fraction adds one more with
    /// that probability, rolled once per step.
    fn birth_quota(&mut self, birth_budget: f32) -> usize {
        if !(birth_budget > 0.0) {
            return 0;
        }
        let whole = birth_budget.floor();
        let extra = self.rng.random::<f32>() < birth_budget - whole;
        whole as usize + usize::from(extra)
    }

    fn draw_lifespan(&mut self) -> f32 {
        let spread = self.rng.random_range(-1.0f32..1.0);
        self.config.life_expectancy * (1.0 + spread * self.config.life_variance)
    }

    fn store(&mut self, slot: usize, render_index: usize, state: ParticleState) {
        self.positions[slot] = state.position;
        self.scales[slot] = state.scale;
        if let Some(colors) = self.colors.as_mut() {
            colors[slot] = state.color.unwrap_or(Vec3::ZERO);
        }
        self.buffer
            .write(render_index, state.position, state.scale, state.color);
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    pub fn set_birth_rate(&mut self, birth_rate: f32) {
        self.config.birth_rate = birth_rate;
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Live particles after the latest step
    pub fn alive_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn positions(&self) -> &[f32] {
        self.buffer.positions()
    }

    pub fn scales(&self) -> &[f32] {
        self.buffer.scales()
    }

    pub fn colors(&self) -> Option<&[f32]> {
        self.buffer.colors()
    }

    pub fn iter(&self) -> impl Iterator<Item = RenderPoint> + '_ {
        self.buffer.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::{GridConfig, GridPolicy};

    /// Places each slot at x = slot index and records every call
    #[derive(Default)]
    struct TracePolicy {
        spawned: Vec<usize>,
        advanced: Vec<(usize, f32)>,
    }

    impl ParticlePolicy for TracePolicy {
        fn spawn(&mut self, slot: usize, use_color: bool, _rng: &mut dyn RngCore) -> ParticleState {
            self.spawned.push(slot);
            ParticleState {
                position: Vec3::new(slot as f32, 0.0, 0.0),
                scale: 0.0,
                color: use_color.then_some(Vec3::splat(0.5)),
            }
        }

        fn advance(&mut self, slot: usize, update: &ParticleUpdate, _use_color: bool) -> ParticleState {
            self.advanced.push((slot, update.age));
            ParticleState {
                position: update.position,
                scale: update.age / update.lifespan,
                color: update.color,
            }
        }
    }

    fn pool(config: ParticleConfig) -> ParticlePool<TracePolicy> {
        ParticlePool::with_rng(config, TracePolicy::default(), StdRng::seed_from_u64(7))
    }

    fn live_slots<P: ParticlePolicy>(pool: &ParticlePool<P>) -> Vec<usize> {
        (0..pool.capacity()).filter(|&i| pool.alive[i]).collect()
    }

    #[test]
    fn test_all_slots_start_dead() {
        let pool = pool(ParticleConfig { capacity: 16, ..Default::default() });
        assert_eq!(pool.alive_count(), 0);
        assert!(live_slots(&pool).is_empty());
        assert!(pool.positions().is_empty());
    }

    #[test]
    fn test_zero_birth_rate_never_spawns() {
        let mut pool = pool(ParticleConfig {
            capacity: 32,
            birth_rate: 0.0,
            ..Default::default()
        });

        for _ in 0..200 {
            pool.step(0.016);
            assert_eq!(pool.alive_count(), 0);
        }
        assert!(pool.policy().spawned.is_empty());
    }

    #[test]
    fn test_spawn_and_retire_cycle() {
        let mut pool = pool(ParticleConfig {
            capacity: 100,
            birth_rate: 50.0,
            life_expectancy: 1.0,
            life_variance: 0.0,
            use_color: false,
        });

        // Budget of 50 whole particles fills the first 50 slots
        pool.step(1.0);
        assert_eq!(pool.alive_count(), 50);
        assert_eq!(live_slots(&pool), (0..50).collect::<Vec<_>>());
        assert!(pool.ages[..50].iter().all(|&age| age == 0.0));

        // Age reaches exactly the lifespan and is kept; 50 more spawn
        pool.step(1.0);
        assert_eq!(pool.alive_count(), 100);
        assert!(pool.ages[..50].iter().all(|&age| age == 1.0));

        // First generation exceeds its lifespan; retired slots are not
        // refilled in the same visit
        pool.step(1.0);
        assert_eq!(pool.alive_count(), 50);
        assert_eq!(live_slots(&pool), (50..100).collect::<Vec<_>>());

        // Dead slots 0..50 are refilled while 50..100 retire
        pool.step(1.0);
        assert_eq!(pool.alive_count(), 50);
        assert_eq!(live_slots(&pool), (0..50).collect::<Vec<_>>());
        assert!(pool.colors().is_none());
    }

    #[test]
    fn test_render_buffer_is_compacted_in_slot_order() {
        let mut pool = pool(ParticleConfig {
            capacity: 64,
            birth_rate: 40.0,
            life_expectancy: 0.5,
            life_variance: 0.8,
            use_color: true,
        });

        for _ in 0..120 {
            pool.step(0.05);

            let live = live_slots(&pool);
            assert!(pool.alive_count() <= pool.capacity());
            assert_eq!(pool.alive_count(), live.len());
            assert_eq!(pool.positions().len(), live.len() * 3);
            assert_eq!(pool.scales().len(), live.len());
            assert_eq!(pool.colors().unwrap().len(), live.len() * 3);

            for (point, slot) in pool.iter().zip(&live) {
                assert_eq!(point.position.x, *slot as f32);
                assert_eq!(point.color, Some(Vec3::splat(0.5)));
            }
        }
    }

    #[test]
    fn test_lifespan_respects_variance_and_bound() {
        let config = ParticleConfig {
            capacity: 200,
            birth_rate: 1000.0,
            life_expectancy: 2.0,
            life_variance: 0.5,
            use_color: false,
        };
        let mut pool = pool(config);
        pool.step(0.1);

        for slot in live_slots(&pool) {
            let lifespan = pool.lifespans[slot];
            assert!((1.0..=3.0).contains(&lifespan), "lifespan {lifespan}");
        }

        for _ in 0..50 {
            pool.step(0.1);
            for slot in live_slots(&pool) {
                assert!(pool.ages[slot] <= pool.lifespans[slot]);
            }
        }
    }

    #[test]
    fn test_each_slot_mutated_once_per_step() {
        let mut pool = pool(ParticleConfig {
            capacity: 10,
            birth_rate: 100.0,
            life_expectancy: 10.0,
            ..Default::default()
        });

        pool.step(0.1);
        assert_eq!(pool.policy().spawned, (0..10).collect::<Vec<_>>());
        assert!(pool.policy().advanced.is_empty());

        pool.step(0.1);
        let advanced: Vec<usize> = pool.policy().advanced.iter().map(|&(slot, _)| slot).collect();
        assert_eq!(advanced, (0..10).collect::<Vec<_>>());
        assert_eq!(pool.policy().spawned.len(), 10);
    }

    #[test]
    fn test_fractional_budget_spawns_stochastically() {
        let mut pool = pool(ParticleConfig {
            capacity: 5000,
            birth_rate: 5.0,
            life_expectancy: 1_000_000.0,
            ..Default::default()
        });

        // Budget of 0.5 per step
        for _ in 0..1000 {
            pool.step(0.1);
        }
        let spawned = pool.policy().spawned.len();
        assert!((400..=600).contains(&spawned), "spawned {spawned}");
    }

    /// Always yields the largest value, so a fractional roll never succeeds
    struct MaxRng;

    impl RngCore for MaxRng {
        fn next_u32(&mut self) -> u32 {
            u32::MAX
        }

        fn next_u64(&mut self) -> u64 {
            u64::MAX
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0xff);
        }
    }

    #[test]
    fn test_fractional_remainder_is_not_carried_over() {
        let mut pool = ParticlePool::with_rng(
            ParticleConfig {
                capacity: 8,
                birth_rate: 5.0,
                life_expectancy: 100.0,
                ..Default::default()
            },
            TracePolicy::default(),
            MaxRng,
        );

        // 0.5 per step; accumulating it would spawn every second step
        for _ in 0..20 {
            pool.step(0.1);
            assert_eq!(pool.alive_count(), 0);
        }
        assert!(pool.policy().spawned.is_empty());
    }

    #[test]
    fn test_budget_without_dead_slots_is_dropped() {
        let mut pool = pool(ParticleConfig {
            capacity: 10,
            birth_rate: 100.0,
            life_expectancy: 1.5,
            ..Default::default()
        });

        pool.step(1.0);
        assert_eq!(pool.alive_count(), 10);

        // Pool is full, the 100-particle budget has nowhere to go
        pool.step(1.0);
        assert_eq!(pool.alive_count(), 10);
        assert_eq!(pool.policy().spawned.len(), 10);

        // Every slot retires; retired slots are not refilled in the same step
        pool.step(1.0);
        assert_eq!(pool.alive_count(), 0);
        assert_eq!(pool.policy().spawned.len(), 10);
    }

    #[test]
    fn test_set_birth_rate() {
        let mut pool = pool(ParticleConfig {
            capacity: 10,
            birth_rate: 0.0,
            ..Default::default()
        });
        pool.step(1.0);
        assert_eq!(pool.alive_count(), 0);

        pool.set_birth_rate(3.0);
        pool.step(1.0);
        assert_eq!(pool.alive_count(), 3);
        assert_eq!(pool.config().birth_rate, 3.0);
    }

    #[test]
    fn test_grid_pool_scales_follow_envelope() {
        let config = ParticleConfig {
            capacity: 4,
            birth_rate: 4.0,
            life_expectancy: 1.0,
            life_variance: 0.0,
            use_color: true,
        };
        let policy = GridPolicy::new(GridConfig::default(), config.capacity);
        let mut pool = ParticlePool::with_rng(config, policy, StdRng::seed_from_u64(1));

        pool.step(1.0);
        assert_eq!(pool.alive_count(), 4);
        assert!(pool.scales().iter().all(|&s| s == 0.0));

        pool.step(0.5);
        for &scale in pool.scales() {
            assert!((scale - 1.0).abs() < 1e-6);
        }
    }
}
