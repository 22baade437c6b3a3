use super::{fit, OutputSink};
use anyhow::{Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Writes each frame as a numbered PNG into a directory
pub struct ImageFileOutput {
    dir: PathBuf,
    width: u32,
    height: u32,
    written: u64,
}

impl ImageFileOutput {
    pub fn new<P: AsRef<Path>>(dir: P, width: u32, height: u32) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        tracing::info!("Writing {}x{} frames to {}", width, height, dir.display());

        Ok(Self {
            dir,
            width,
            height,
            written: 0,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.written
    }
}

impl OutputSink for ImageFileOutput {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        let path = self.dir.join(format!("frame_{:06}.png", self.written));
        fit(frame, self.width, self.height)
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        self.written += 1;
        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
