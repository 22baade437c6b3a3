//! Per-pixel point cloud and the camera that orbits it.

mod camera;
mod cloud;

pub use camera::OrbitCamera;
pub use cloud::PointCloud;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PointsError {
    #[error("frame is {actual_width}x{actual_height}, point cloud expects {width}x{height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}
