//! Point rendering surface and the 2D pixel canvas.

mod software;
mod two_d;

pub use software::SoftwareRenderer;
pub use two_d::compose_2d;

use glam::{Mat4, Vec3};
use image::RgbImage;

/// A point to draw: world position, world-space size, linear RGB colour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splat {
    pub position: Vec3,
    pub size: f32,
    pub color: Vec3,
}

/// Something that can draw sets of points and hand back a finished frame
pub trait PointRenderer {
    /// Start a new frame
    fn clear(&mut self);

    /// Draw points as seen through `view_projection`
    fn draw_points<I>(&mut self, view_projection: Mat4, points: I)
    where
        I: IntoIterator<Item = Splat>;

    /// The frame drawn since the last `clear`
    fn finish(&self) -> RgbImage;

    fn resolution(&self) -> (u32, u32);
}
