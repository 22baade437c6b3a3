use crate::particles::{GridConfig, GridPolicy, ParticleConfig, ParticlePool};
use crate::points::{OrbitCamera, PointCloud};
use crate::render::{PointRenderer, SoftwareRenderer, Splat};
use anyhow::{Context, Result};
use glam::Vec3;
use image::{RgbImage, RgbaImage};
use std::time::Instant;

/// Everything needed to build a [`Session`]
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Working frame resolution
    pub width: u32,
    pub height: u32,
    /// World-space size of a pixel point
    pub point_size: f32,
    /// Grid particle overlay, if enabled
    pub particles: Option<ParticleLayer>,
}

#[derive(Debug, Clone)]
pub struct ParticleLayer {
    pub pool: ParticleConfig,
    pub grid: GridConfig,
    /// World-space size of a particle at full scale
    pub size: f32,
}

impl Default for ParticleLayer {
    fn default() -> Self {
        Self {
            pool: ParticleConfig::default(),
            grid: GridConfig::default(),
            size: 4.0,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            point_size: 1.0,
            particles: None,
        }
    }
}

/// 3D view state for one capture run: point cloud, camera, renderer,
/// optional particles and the frame clock.
///
/// Created when capture starts; dropping it (or calling [`Session::reset`])
/// tears everything down.
pub struct Session<R = SoftwareRenderer> {
    cloud: PointCloud,
    camera: OrbitCamera,
    renderer: R,
    particles: Option<(ParticlePool<GridPolicy>, f32)>,
    point_size: f32,
    last_tick: Instant,
    frames: u64,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let renderer = SoftwareRenderer::new(config.width, config.height);
        Self::with_renderer(config, renderer)
    }
}

impl<R: PointRenderer> Session<R> {
    pub fn with_renderer(config: SessionConfig, renderer: R) -> Self {
        tracing::info!(
            "Starting 3D session at {}x{}, particles={}",
            config.width,
            config.height,
            config.particles.is_some()
        );

        let particles = config.particles.map(|layer| {
            let policy = GridPolicy::new(layer.grid, layer.pool.capacity);
            (ParticlePool::new(layer.pool, policy), layer.size)
        });

        Self {
            cloud: PointCloud::new(config.width, config.height),
            camera: OrbitCamera::new(config.width, config.height),
            renderer,
            particles,
            point_size: config.point_size,
            last_tick: Instant::now(),
            frames: 0,
        }
    }

    /// Render the next 3D frame, timing particles by the wall clock
    pub fn render_frame(&mut self, frame: &RgbaImage) -> Result<RgbImage> {
        let now = Instant::now();
        let delta_seconds = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.render_with_delta(frame, delta_seconds)
    }

    /// Render the next 3D frame with an explicit particle time step
    pub fn render_with_delta(&mut self, frame: &RgbaImage, delta_seconds: f32) -> Result<RgbImage> {
        let _span = tracing::debug_span!("render_3d").entered();

        self.cloud
            .update_colors(frame)
            .context("Failed to update point colours")?;
        self.camera.advance();

        if let Some((pool, _)) = self.particles.as_mut() {
            if delta_seconds > 0.0 {
                pool.step(delta_seconds);
            }
        }

        let view_projection = self.camera.view_projection();
        self.renderer.clear();

        let point_size = self.point_size;
        self.renderer.draw_points(
            view_projection,
            self.cloud.iter().map(|(position, color)| Splat {
                position,
                size: point_size,
                color,
            }),
        );

        if let Some((pool, size)) = self.particles.as_ref() {
            let size = *size;
            self.renderer.draw_points(
                view_projection,
                pool.iter().map(|p| Splat {
                    position: p.position,
                    size: size * p.scale,
                    color: p.color.unwrap_or(Vec3::ONE),
                }),
            );
        }

        self.frames += 1;
        Ok(self.renderer.finish())
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn alive_particles(&self) -> usize {
        self.particles
            .as_ref()
            .map_or(0, |(pool, _)| pool.alive_count())
    }

    /// Tear the session down
    pub fn reset(self) {
        tracing::info!("Resetting 3D session after {} frames", self.frames);
    }
}
