//! Fixed-capacity particle pool with a pluggable spawn/advance policy.
//!
//! The pool owns every slot and the compacted render buffer. Policies only
//! compute new attribute values for a slot, and may keep their own per-slot
//! data keyed by slot index.

mod buffer;
mod grid;
mod pool;
mod sphere;

pub use buffer::{RenderBuffer, RenderPoint};
pub use grid::{GridConfig, GridPolicy};
pub use pool::ParticlePool;
pub use sphere::random_in_sphere;

use glam::Vec3;
use rand::RngCore;
use thiserror::Error;

/// Pool construction parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleConfig {
    /// Number of slots; fixed for the lifetime of the pool
    pub capacity: usize,
    /// Particles spawned per second
    pub birth_rate: f32,
    /// Mean lifespan in seconds
    pub life_expectancy: f32,
    /// Relative lifespan spread in [0, 1]
    pub life_variance: f32,
    /// Track a per-particle colour
    pub use_color: bool,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            capacity: 8000,
            birth_rate: 100.0,
            life_expectancy: 1.0,
            life_variance: 0.0,
            use_color: false,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("particle capacity must be positive")]
    ZeroCapacity,
    #[error("birth rate must be a finite non-negative number, got {0}")]
    InvalidBirthRate(f32),
    #[error("life expectancy must be positive, got {0}")]
    InvalidLifeExpectancy(f32),
    #[error("life variance must be within [0, 1], got {0}")]
    InvalidLifeVariance(f32),
}

impl ParticleConfig {
    /// Check the conventions the pool relies on.
    ///
    /// The pool itself trusts its inputs; call this where the values come
    /// from the outside world.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if !self.birth_rate.is_finite() || self.birth_rate < 0.0 {
            return Err(ConfigError::InvalidBirthRate(self.birth_rate));
        }
        if !(self.life_expectancy > 0.0) {
            return Err(ConfigError::InvalidLifeExpectancy(self.life_expectancy));
        }
        if !(0.0..=1.0).contains(&self.life_variance) {
            return Err(ConfigError::InvalidLifeVariance(self.life_variance));
        }
        Ok(())
    }
}

/// Attributes a policy produces for one slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleState {
    pub position: Vec3,
    pub scale: f32,
    /// Ignored unless the pool tracks colour
    pub color: Option<Vec3>,
}

/// Current values of a live slot, handed to [`ParticlePolicy::advance`]
#[derive(Debug, Clone, Copy)]
pub struct ParticleUpdate {
    /// Age after this step's elapsed time has been added
    pub age: f32,
    pub lifespan: f32,
    pub position: Vec3,
    pub scale: f32,
    pub color: Option<Vec3>,
    pub delta_seconds: f32,
}

/// Spawn/advance behaviour plugged into a [`ParticlePool`]
pub trait ParticlePolicy {
    /// Initialise a slot that has just come alive
    fn spawn(&mut self, slot: usize, use_color: bool, rng: &mut dyn RngCore) -> ParticleState;

    /// Advance a live slot by one step
    fn advance(&mut self, slot: usize, update: &ParticleUpdate, use_color: bool) -> ParticleState;
}
