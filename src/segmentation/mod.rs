mod mask;
mod preprocess;
mod selfie;
pub mod types;

pub use mask::{filter_black, MaskCompositor};
pub use preprocess::Preprocessor;
pub use selfie::SelfieSegmenter;
pub use types::{Matte, PassthroughModel, SegmentationModel};

use anyhow::Result;

/// Load the ONNX selfie segmenter, or fall back to passthrough when no model is given
pub fn create_model(model_path: Option<&str>) -> Result<Box<dyn SegmentationModel>> {
    match model_path {
        Some(path) => Ok(Box::new(SelfieSegmenter::new(path)?)),
        None => {
            tracing::info!("No segmentation model given, every pixel is foreground");
            Ok(Box::new(PassthroughModel))
        }
    }
}
