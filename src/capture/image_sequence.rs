use super::CaptureSource;
use anyhow::{bail, Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Plays a directory of still frames in file-name order, looping forever
pub struct ImageSequenceCapture {
    frames: Vec<PathBuf>,
    next: usize,
    width: u32,
    height: u32,
}

impl ImageSequenceCapture {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        tracing::info!("Reading frames from {}", dir.display());

        let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read frame directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && image::ImageFormat::from_path(path).is_ok())
            .collect();
        frames.sort();

        let Some(first) = frames.first() else {
            bail!("No image frames found in {}", dir.display());
        };

        let (width, height) = image::image_dimensions(first)
            .with_context(|| format!("Failed to read {}", first.display()))?;

        tracing::info!("Found {} frames at {}x{}", frames.len(), width, height);

        Ok(Self {
            frames,
            next: 0,
            width,
            height,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl CaptureSource for ImageSequenceCapture {
    fn capture_frame(&mut self) -> Result<RgbImage> {
        let path = &self.frames[self.next];
        self.next = (self.next + 1) % self.frames.len();

        let frame = image::open(path)
            .with_context(|| format!("Failed to decode {}", path.display()))?
            .to_rgb8();

        Ok(frame)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
