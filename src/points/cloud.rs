use super::PointsError;
use glam::Vec3;
use image::RgbaImage;
use rand::Rng;

/// Width in pixels of the left/right band hidden to mask blur artefacts
const SIDE_MARGIN: usize = 10;
/// Height in rows of the top/bottom band hidden to mask blur artefacts
const EDGE_ROWS: usize = 4;

/// One point per pixel of the working frame, laid out on the z = 0 plane
/// with the image centre at the origin and y pointing up.
pub struct PointCloud {
    width: u32,
    height: u32,
    positions: Vec<Vec3>,
    colors: Vec<Vec3>,
}

impl PointCloud {
    pub fn new(width: u32, height: u32) -> Self {
        let mut rng = rand::rng();
        Self::with_colors(width, height, |_| {
            Vec3::new(rng.random(), rng.random(), rng.random())
        })
    }

    fn with_colors(width: u32, height: u32, mut color: impl FnMut(usize) -> Vec3) -> Self {
        let (w, h) = (width as usize, height as usize);
        let half_w = width as f32 / 2.0;
        let half_h = height as f32 / 2.0;

        let positions = (0..w * h)
            .map(|i| {
                let x = (i % w) as f32 - half_w;
                let y = -((i / w) as f32) + half_h;
                Vec3::new(x, y, 0.0)
            })
            .collect();
        let colors = (0..w * h).map(&mut color).collect();

        Self {
            width,
            height,
            positions,
            colors,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    /// Recolour every point from a filtered frame.
    ///
    /// Points in the border band are forced to black; the mask blur smears
    /// the frame edges there.
    pub fn update_colors(&mut self, frame: &RgbaImage) -> Result<(), PointsError> {
        let (actual_width, actual_height) = frame.dimensions();
        if (actual_width, actual_height) != (self.width, self.height) {
            return Err(PointsError::DimensionMismatch {
                width: self.width,
                height: self.height,
                actual_width,
                actual_height,
            });
        }

        let w = self.width as usize;
        let len = self.len();
        for (i, (color, pixel)) in self.colors.iter_mut().zip(frame.pixels()).enumerate() {
            let column = i % w;
            let border = i < w * EDGE_ROWS
                || column < SIDE_MARGIN
                || column + SIDE_MARGIN > w
                || i + w * EDGE_ROWS > len;
            *color = if border {
                Vec3::ZERO
            } else {
                Vec3::new(pixel[0] as f32, pixel[1] as f32, pixel[2] as f32) / 255.0
            };
        }
        Ok(())
    }

    /// Points paired with their colours
    pub fn iter(&self) -> impl Iterator<Item = (Vec3, Vec3)> + '_ {
        self.positions.iter().copied().zip(self.colors.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_layout_is_centered_with_y_up() {
        let cloud = PointCloud::with_colors(4, 2, |_| Vec3::ZERO);
        assert_eq!(cloud.len(), 8);
        assert_eq!(cloud.positions()[0], Vec3::new(-2.0, 1.0, 0.0));
        assert_eq!(cloud.positions()[3], Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(cloud.positions()[4], Vec3::new(-2.0, 0.0, 0.0));
    }

    #[test]
    fn test_initial_colors_are_unit_range() {
        let cloud = PointCloud::new(16, 16);
        assert!(cloud
            .colors()
            .iter()
            .all(|c| c.min_element() >= 0.0 && c.max_element() < 1.0));
    }

    #[test]
    fn test_update_colors_masks_border() {
        let (w, h) = (40u32, 20u32);
        let mut cloud = PointCloud::new(w, h);
        let frame = RgbaImage::from_pixel(w, h, Rgba([255, 51, 0, 255]));
        cloud.update_colors(&frame).unwrap();

        let color_at = |x: usize, y: usize| cloud.colors()[y * w as usize + x];
        let inside = Vec3::new(1.0, 0.2, 0.0);

        assert_eq!(color_at(20, 10), inside);
        assert_eq!(color_at(10, 4), inside);
        assert_eq!(color_at(30, 15), inside);

        // top rows, left/right margins, bottom rows
        assert_eq!(color_at(20, 3), Vec3::ZERO);
        assert_eq!(color_at(9, 10), Vec3::ZERO);
        assert_eq!(color_at(31, 10), Vec3::ZERO);
        assert_eq!(color_at(20, 16), Vec3::ZERO);
    }

    #[test]
    fn test_update_colors_rejects_wrong_size() {
        let mut cloud = PointCloud::new(8, 8);
        let err = cloud.update_colors(&RgbaImage::new(4, 4)).unwrap_err();
        assert_eq!(
            err,
            PointsError::DimensionMismatch {
                width: 8,
                height: 8,
                actual_width: 4,
                actual_height: 4
            }
        );
    }
}
