use glam::Vec3;
use rand::Rng;
use std::f32::consts::PI;

/// Uniformly distributed point inside the unit sphere.
///
/// Direction comes from a uniform cos(theta) and phi; the cube-root radius
/// keeps the density uniform over the volume.
pub fn random_in_sphere<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let cos_theta = 1.0 - 2.0 * rng.random::<f32>();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * PI * rng.random::<f32>();
    let radius = rng.random::<f32>().cbrt();

    Vec3::new(
        radius * sin_theta * phi.cos(),
        radius * sin_theta * phi.sin(),
        radius * cos_theta,
    )
}
