use super::preprocess::Preprocessor;
use super::types::{Matte, SegmentationModel};
use anyhow::{ensure, Context, Result};
use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

/// Model input resolution of the general selfie segmentation model
const INPUT_SIZE: u32 = 256;

/// Selfie segmentation model (MediaPipe "general" variant exported to ONNX).
///
/// Stateless: each frame is segmented independently. Input is a
/// [1, 256, 256, 3] float tensor, output a [1, 256, 256, 1] confidence map.
pub struct SelfieSegmenter {
    session: Session,
    preprocessor: Preprocessor,
}

impl SelfieSegmenter {
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading selfie segmentation model from {}", path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?;

        tracing::info!("Selfie segmentation model loaded successfully");

        Ok(Self {
            session,
            preprocessor: Preprocessor::new(INPUT_SIZE, INPUT_SIZE),
        })
    }
}

impl SegmentationModel for SelfieSegmenter {
    fn segment(&mut self, frame: &RgbImage) -> Result<Matte> {
        let _span = tracing::debug_span!("selfie_segment").entered();

        let input = self.preprocessor.preprocess(frame);
        let (n, h, w, c) = input.dim();
        let tensor = Tensor::from_array(([n, h, w, c], input.into_raw_vec()))
            .context("Failed to build input tensor")?;

        let _infer_span = tracing::debug_span!("inference").entered();
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("Failed to run inference")?;
        drop(_infer_span);

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("Failed to read segmentation output")?;

        // [1, H, W, 1]
        ensure!(shape.len() == 4, "Unexpected output rank {}", shape.len());
        let matte_height = shape[1] as u32;
        let matte_width = shape[2] as u32;

        let (frame_width, frame_height) = frame.dimensions();
        Preprocessor::postprocess_matte(data, matte_width, matte_height, frame_width, frame_height)
    }

    fn input_size(&self) -> Option<(u32, u32)> {
        Some(self.preprocessor.target_size())
    }
}
