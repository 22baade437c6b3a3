use super::sphere::random_in_sphere;
use super::{ParticlePolicy, ParticleState, ParticleUpdate};
use glam::Vec3;
use rand::RngCore;
use std::f32::consts::PI;

/// Velocity multiplier applied to each particle's drift direction
const DRIFT_SPEED: f32 = 2.0;

/// Lattice that newborn particles are laid out on
#[derive(Debug, Clone, PartialEq)]
pub struct GridConfig {
    /// Edge length of the cube, centred on the origin
    pub size: f32,
    /// Cells per edge
    pub division: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 40.0,
            division: 20,
        }
    }
}

/// Spawns particles cell by cell on a cubic lattice and lets them drift in a
/// random direction while their size swells and fades over their lifetime.
pub struct GridPolicy {
    division: u64,
    spacing: f32,
    half_size: f32,
    spawned: u64,
    velocities: Vec<Vec3>,
}

impl GridPolicy {
    pub fn new(config: GridConfig, capacity: usize) -> Self {
        let division = u64::from(config.division.max(1));
        Self {
            division,
            spacing: config.size / division as f32,
            half_size: 0.5 * config.size,
            spawned: 0,
            velocities: vec![Vec3::ZERO; capacity],
        }
    }

    /// Lattice cell of the `n`th spawned particle
    pub fn cell(&self, n: u64) -> (u64, u64, u64) {
        let d = self.division;
        let d2 = d * d;
        (n % d, (n / d2) % d, (n % d2) / d)
    }

    /// Particles spawned so far
    pub fn spawned(&self) -> u64 {
        self.spawned
    }

    pub fn velocity(&self, slot: usize) -> Option<Vec3> {
        self.velocities.get(slot).copied()
    }
}

impl ParticlePolicy for GridPolicy {
    fn spawn(&mut self, slot: usize, use_color: bool, rng: &mut dyn RngCore) -> ParticleState {
        let (x, y, z) = self.cell(self.spawned);
        self.spawned += 1;

        let cell = Vec3::new(x as f32, y as f32, z as f32);
        let position = cell * self.spacing - Vec3::splat(self.half_size);

        let color = use_color.then(|| {
            let max = (self.division - 1).max(1) as f32;
            cell / max
        });

        if slot >= self.velocities.len() {
            self.velocities.resize(slot + 1, Vec3::ZERO);
        }
        self.velocities[slot] = random_in_sphere(rng);

        ParticleState {
            position,
            scale: 0.0,
            color,
        }
    }

    fn advance(&mut self, slot: usize, update: &ParticleUpdate, _use_color: bool) -> ParticleState {
        let velocity = self.velocities[slot];
        ParticleState {
            position: update.position + velocity * DRIFT_SPEED * update.delta_seconds,
            scale: (PI * update.age / update.lifespan).sin(),
            color: update.color,
        }
    }
}
