use super::CaptureSource;
use anyhow::{Context, Result};
use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

/// Live camera input
pub struct WebcamCapture {
    camera: Camera,
    width: u32,
    height: u32,
}

impl WebcamCapture {
    /// Open a camera, asking for the format closest to the working resolution
    pub fn new(device_index: u32, width: u32, height: u32, fps: u32) -> Result<Self> {
        tracing::info!(
            "Initializing webcam {} near {}x{}@{}",
            device_index,
            width,
            height,
            fps
        );

        let index = CameraIndex::Index(device_index);
        let wanted = CameraFormat::new_from(width, height, FrameFormat::MJPEG, fps);
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(wanted));

        let mut camera = Camera::new(index, requested).context("Failed to open camera")?;

        camera
            .open_stream()
            .context("Failed to open camera stream")?;

        let resolution = camera.resolution();
        tracing::info!(
            "Webcam streaming at {}x{}",
            resolution.width(),
            resolution.height()
        );

        Ok(Self {
            width: resolution.width(),
            height: resolution.height(),
            camera,
        })
    }
}

impl CaptureSource for WebcamCapture {
    fn capture_frame(&mut self) -> Result<RgbImage> {
        let frame = self.camera.frame().context("Failed to capture frame")?;

        let decoded = frame
            .decode_image::<RgbFormat>()
            .context("Failed to decode frame")?;

        Ok(decoded)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for WebcamCapture {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!("Failed to stop camera stream: {}", e);
        }
    }
}
