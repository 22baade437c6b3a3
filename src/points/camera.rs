use glam::{Mat4, Vec3};

const FOV_Y_DEGREES: f32 = 45.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 1000.0;

/// Perspective camera that swings around the origin, one degree per frame.
///
/// The orbit radius breathes with the angle, so the cloud drifts towards and
/// away from the viewer as it turns.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    aspect: f32,
    rotation: u32,
    position: Vec3,
}

impl OrbitCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            rotation: 0,
            position: Vec3::new(0.0, 0.0, 1000.0),
        }
    }

    /// Move to the next orbit position
    pub fn advance(&mut self) {
        self.rotation = (self.rotation + 1) % 360;
        let angle = (self.rotation as f32).to_radians();
        let radius = 5000.0 * (angle.sin() / 10.0) + 1000.0;
        self.position = Vec3::new(
            radius * (angle.sin() / 5.0),
            0.0,
            radius * (angle.cos() / 5.0),
        );
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation_degrees(&self) -> u32 {
        self.rotation
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, Vec3::ZERO, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(FOV_Y_DEGREES.to_radians(), self.aspect, NEAR, FAR)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}
