use anyhow::Result;
use image::RgbImage;

/// Alpha matte: 0.0 = background, 1.0 = person.
/// Row-major, same dimensions as the frame it was computed from.
pub type Matte = Vec<f32>;

/// Person segmentation backend.
///
/// Treated as a black box by the rest of the pipeline: a frame goes in, a
/// matte of the same size comes out.
pub trait SegmentationModel {
    /// Compute the person matte for a frame
    fn segment(&mut self, frame: &RgbImage) -> Result<Matte>;

    /// Resolution the model runs at, as (width, height)
    fn input_size(&self) -> Option<(u32, u32)>;
}

/// Marks every pixel as foreground
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughModel;

impl SegmentationModel for PassthroughModel {
    fn segment(&mut self, frame: &RgbImage) -> Result<Matte> {
        let (width, height) = frame.dimensions();
        Ok(vec![1.0; (width * height) as usize])
    }

    fn input_size(&self) -> Option<(u32, u32)> {
        None
    }
}
