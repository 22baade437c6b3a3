mod image_files;
mod loopback;

pub use image_files::ImageFileOutput;
pub use loopback::V4L2Output;

use anyhow::Result;
use image::RgbImage;

/// Trait for output destinations
pub trait OutputSink {
    /// Write a frame to the output
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Get the expected output resolution
    fn resolution(&self) -> (u32, u32);
}

/// Open a loopback device or a frame directory, whichever is configured
pub fn open_sink(
    device: Option<&str>,
    dir: Option<&str>,
    width: u32,
    height: u32,
) -> Result<Option<Box<dyn OutputSink>>> {
    if let Some(dir) = dir {
        return Ok(Some(Box::new(ImageFileOutput::new(dir, width, height)?)));
    }
    if let Some(device) = device {
        return Ok(Some(Box::new(V4L2Output::new(device, width, height)?)));
    }
    Ok(None)
}

/// Resize to the sink resolution if needed
fn fit(frame: &RgbImage, width: u32, height: u32) -> std::borrow::Cow<'_, RgbImage> {
    if frame.dimensions() == (width, height) {
        std::borrow::Cow::Borrowed(frame)
    } else {
        std::borrow::Cow::Owned(image::imageops::resize(
            frame,
            width,
            height,
            image::imageops::FilterType::Triangle,
        ))
    }
}
