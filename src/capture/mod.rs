mod image_sequence;
mod webcam;

pub use image_sequence::ImageSequenceCapture;
pub use webcam::WebcamCapture;

use anyhow::Result;
use image::{imageops, RgbImage};

/// Trait for frame sources
pub trait CaptureSource {
    /// Capture a single frame
    fn capture_frame(&mut self) -> Result<RgbImage>;

    /// Get the resolution of captured frames
    fn resolution(&self) -> (u32, u32);
}

/// Bring a captured frame to the working resolution
pub fn downscale(frame: RgbImage, width: u32, height: u32) -> RgbImage {
    if frame.dimensions() == (width, height) {
        return frame;
    }
    imageops::resize(&frame, width, height, imageops::FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downscale_resizes() {
        let frame = RgbImage::from_pixel(640, 480, image::Rgb([10, 20, 30]));
        let small = downscale(frame, 320, 240);
        assert_eq!(small.dimensions(), (320, 240));
        assert_eq!(small.get_pixel(100, 100), &image::Rgb([10, 20, 30]));
    }

    #[test]
    fn test_downscale_keeps_matching_frame() {
        let frame = RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]));
        assert_eq!(downscale(frame.clone(), 4, 4), frame);
    }
}
