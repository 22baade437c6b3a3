use super::{PointRenderer, Splat};
use glam::{Mat4, Vec3, Vec4Swizzles};
use image::{Rgb, RgbImage};

/// CPU point rasteriser.
///
/// Points are drawn as square splats with perspective size attenuation and
/// a depth test, on a black background.
pub struct SoftwareRenderer {
    frame: RgbImage,
    depth: Vec<f32>,
}

impl SoftwareRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            frame: RgbImage::new(width, height),
            depth: vec![f32::INFINITY; (width * height) as usize],
        }
    }

    fn splat(&mut self, center_x: f32, center_y: f32, pixels: f32, depth: f32, color: Rgb<u8>) {
        let (width, height) = self.frame.dimensions();
        let half = (pixels.max(1.0) / 2.0).max(0.5);

        let x0 = (center_x - half).floor().max(0.0) as u32;
        let y0 = (center_y - half).floor().max(0.0) as u32;
        let x1 = ((center_x + half).ceil() as u32).min(width);
        let y1 = ((center_y + half).ceil() as u32).min(height);

        for y in y0..y1 {
            for x in x0..x1 {
                let idx = (y * width + x) as usize;
                if depth < self.depth[idx] {
                    self.depth[idx] = depth;
                    self.frame.put_pixel(x, y, color);
                }
            }
        }
    }
}

fn to_rgb(color: Vec3) -> Rgb<u8> {
    let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    Rgb([c.x as u8, c.y as u8, c.z as u8])
}

impl PointRenderer for SoftwareRenderer {
    fn clear(&mut self) {
        for pixel in self.frame.pixels_mut() {
            *pixel = Rgb([0, 0, 0]);
        }
        self.depth.fill(f32::INFINITY);
    }

    fn draw_points<I>(&mut self, view_projection: Mat4, points: I)
    where
        I: IntoIterator<Item = Splat>,
    {
        let _span = tracing::debug_span!("draw_points").entered();

        let (width, height) = self.frame.dimensions();
        let (w, h) = (width as f32, height as f32);

        for point in points {
            let color = to_rgb(point.color);
            if color == Rgb([0, 0, 0]) || point.size <= 0.0 {
                continue;
            }

            let clip = view_projection * point.position.extend(1.0);
            if clip.w <= 0.0 {
                continue;
            }
            let ndc = clip.xyz() / clip.w;
            if ndc.x.abs() > 1.0 || ndc.y.abs() > 1.0 || ndc.z.abs() > 1.0 {
                continue;
            }

            let screen_x = (ndc.x + 1.0) * 0.5 * w;
            let screen_y = (1.0 - ndc.y) * 0.5 * h;
            // clip.w is the view-space distance for a perspective projection
            let pixels = point.size * (h * 0.5) / clip.w;

            self.splat(screen_x, screen_y, pixels, ndc.z, color);
        }
    }

    fn finish(&self) -> RgbImage {
        self.frame.clone()
    }

    fn resolution(&self) -> (u32, u32) {
        self.frame.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::OrbitCamera;

    fn looking_down_z() -> Mat4 {
        let projection = Mat4::perspective_rh_gl(45f32.to_radians(), 1.0, 0.1, 1000.0);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 100.0), Vec3::ZERO, Vec3::Y);
        projection * view
    }

    fn splat(position: Vec3, color: Vec3) -> Splat {
        Splat {
            position,
            size: 1.0,
            color,
        }
    }

    #[test]
    fn test_point_at_origin_lands_in_center() {
        let mut renderer = SoftwareRenderer::new(64, 64);
        renderer.clear();
        renderer.draw_points(looking_down_z(), [splat(Vec3::ZERO, Vec3::X)]);

        let frame = renderer.finish();
        assert_eq!(frame.get_pixel(32, 32), &Rgb([255, 0, 0]));
        assert_eq!(frame.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_nearer_point_wins() {
        let mut renderer = SoftwareRenderer::new(64, 64);
        renderer.clear();
        renderer.draw_points(
            looking_down_z(),
            [
                splat(Vec3::new(0.0, 0.0, 10.0), Vec3::Y),
                splat(Vec3::ZERO, Vec3::X),
            ],
        );
        assert_eq!(renderer.finish().get_pixel(32, 32), &Rgb([0, 255, 0]));
    }

    #[test]
    fn test_points_behind_camera_and_black_points_are_skipped() {
        let mut renderer = SoftwareRenderer::new(32, 32);
        renderer.clear();
        renderer.draw_points(
            looking_down_z(),
            [
                splat(Vec3::new(0.0, 0.0, 200.0), Vec3::ONE),
                splat(Vec3::ZERO, Vec3::ZERO),
            ],
        );
        assert!(renderer.finish().pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_size_attenuates_with_distance() {
        let mut renderer = SoftwareRenderer::new(64, 64);
        renderer.clear();
        let big = Splat {
            position: Vec3::ZERO,
            size: 50.0,
            color: Vec3::ONE,
        };
        renderer.draw_points(looking_down_z(), [big]);

        // 50 * 32 / 100 = 16 pixels across
        let lit = renderer.finish().pixels().filter(|p| p[0] == 255).count();
        assert!((256..=324).contains(&lit), "lit {lit}");
    }

    #[test]
    fn test_clear_resets_frame() {
        let mut renderer = SoftwareRenderer::new(16, 16);
        renderer.draw_points(looking_down_z(), [splat(Vec3::ZERO, Vec3::ONE)]);
        renderer.clear();
        assert!(renderer.finish().pixels().all(|p| *p == Rgb([0, 0, 0])));
        assert_eq!(renderer.resolution(), (16, 16));
    }

    #[test]
    fn test_orbit_camera_sees_cloud() {
        let mut camera = OrbitCamera::new(64, 48);
        camera.advance();
        let mut renderer = SoftwareRenderer::new(64, 48);
        renderer.clear();
        renderer.draw_points(camera.view_projection(), [splat(Vec3::ZERO, Vec3::ONE)]);
        assert!(renderer.finish().pixels().any(|p| *p == Rgb([255, 255, 255])));
    }
}
