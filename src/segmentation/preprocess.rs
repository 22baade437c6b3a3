use anyhow::{ensure, Result};
use image::{imageops, GrayImage, Luma, RgbImage};
use ndarray::Array4;

/// Converts frames to model input and model output back to frame-sized mattes
pub struct Preprocessor {
    target_width: u32,
    target_height: u32,
}

impl Preprocessor {
    pub fn new(target_width: u32, target_height: u32) -> Self {
        Self {
            target_width,
            target_height,
        }
    }

    pub fn target_size(&self) -> (u32, u32) {
        (self.target_width, self.target_height)
    }

    /// Resize to the model resolution and lay out as a normalised NHWC tensor.
    ///
    /// Returns: Array4<f32> with shape [1, height, width, 3], values in [0, 1]
    pub fn preprocess(&self, image: &RgbImage) -> Array4<f32> {
        let _span = tracing::debug_span!("preprocess").entered();

        let resized = if image.dimensions() != (self.target_width, self.target_height) {
            imageops::resize(
                image,
                self.target_width,
                self.target_height,
                imageops::FilterType::Triangle,
            )
        } else {
            image.clone()
        };

        let (width, height) = resized.dimensions();
        Array4::from_shape_fn((1, height as usize, width as usize, 3), |(_, y, x, c)| {
            resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
        })
    }

    /// Resize a model-resolution matte to the frame size
    pub fn postprocess_matte(
        matte: &[f32],
        matte_width: u32,
        matte_height: u32,
        target_width: u32,
        target_height: u32,
    ) -> Result<Vec<f32>> {
        let _span = tracing::debug_span!("postprocess").entered();

        ensure!(
            matte.len() == (matte_width * matte_height) as usize,
            "Matte has {} values, expected {}x{}",
            matte.len(),
            matte_width,
            matte_height
        );

        if matte_width == target_width && matte_height == target_height {
            return Ok(matte.to_vec());
        }

        let gray = matte_to_gray(matte, matte_width, matte_height);
        let resized = imageops::resize(
            &gray,
            target_width,
            target_height,
            imageops::FilterType::Triangle,
        );

        Ok(resized.pixels().map(|p| p[0] as f32 / 255.0).collect())
    }

    /// Grayscale rendering of a matte, for `--show-matte`
    pub fn matte_to_rgb(matte: &[f32], width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let value = to_byte(matte[(y * width + x) as usize]);
            image::Rgb([value, value, value])
        })
    }
}

fn matte_to_gray(matte: &[f32], width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| Luma([to_byte(matte[(y * width + x) as usize])]))
}

fn to_byte(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}
