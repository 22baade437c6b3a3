use anyhow::{ensure, Result};
use image::{imageops, GrayImage, Luma, Rgba, RgbImage, RgbaImage};

/// Darkens everything but the person in a frame.
///
/// The matte is thresholded into a binary background mask, softened by a
/// blur, and used to fade background pixels to black.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskCompositor {
    /// Matte values at or above this are foreground
    pub threshold: f32,
    /// Blur applied to the mask edge, in pixels
    pub blur_radius: u32,
    /// Strength of the darkening, 1.0 = background fully black
    pub opacity: f32,
}

impl Default for MaskCompositor {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            blur_radius: 2,
            opacity: 1.0,
        }
    }
}

impl MaskCompositor {
    /// Background coverage per pixel: 255 = background, 0 = person
    pub fn background_mask(&self, matte: &[f32], width: u32, height: u32) -> Result<GrayImage> {
        ensure!(
            matte.len() == (width * height) as usize,
            "Matte has {} values, frame is {}x{}",
            matte.len(),
            width,
            height
        );

        let mask = GrayImage::from_fn(width, height, |x, y| {
            let alpha = matte[(y * width + x) as usize];
            Luma([if alpha >= self.threshold { 0 } else { 255 }])
        });

        if self.blur_radius == 0 {
            return Ok(mask);
        }
        Ok(imageops::blur(&mask, self.blur_radius as f32))
    }

    /// Composite the darkening mask over the frame
    pub fn composite(&self, frame: &RgbImage, matte: &[f32]) -> Result<RgbaImage> {
        let _span = tracing::debug_span!("composite_mask").entered();

        let (width, height) = frame.dimensions();
        let mask = self.background_mask(matte, width, height)?;

        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let coverage = mask.get_pixel(x, y)[0] as f32 / 255.0;
            let keep = 1.0 - coverage * self.opacity.clamp(0.0, 1.0);
            let pixel = frame.get_pixel(x, y);
            let channel = |c: u8| (c as f32 * keep).round() as u8;
            Rgba([channel(pixel[0]), channel(pixel[1]), channel(pixel[2]), 255])
        }))
    }
}

/// Make every pure-black pixel fully transparent
pub fn filter_black(image: &RgbaImage) -> RgbaImage {
    let mut filtered = image.clone();
    for pixel in filtered.pixels_mut() {
        if pixel[0] == 0 && pixel[1] == 0 && pixel[2] == 0 {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }
    filtered
}
