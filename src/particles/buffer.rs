use glam::Vec3;

/// Attributes of one live particle as seen by the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPoint {
    pub position: Vec3,
    pub scale: f32,
    pub color: Option<Vec3>,
}

/// Flat attribute arrays sized for the full pool capacity.
///
/// Only the first `len` entries are meaningful; they hold the live
/// particles of the latest step in slot order.
#[derive(Debug, Clone)]
pub struct RenderBuffer {
    positions: Vec<f32>,
    scales: Vec<f32>,
    colors: Option<Vec<f32>>,
    len: usize,
}

impl RenderBuffer {
    pub(crate) fn new(capacity: usize, use_color: bool) -> Self {
        Self {
            positions: vec![0.0; 3 * capacity],
            scales: vec![0.0; capacity],
            colors: use_color.then(|| vec![0.0; 3 * capacity]),
            len: 0,
        }
    }

    pub(crate) fn write(&mut self, index: usize, position: Vec3, scale: f32, color: Option<Vec3>) {
        self.positions[index * 3..index * 3 + 3].copy_from_slice(&position.to_array());
        self.scales[index] = scale;
        if let Some(colors) = self.colors.as_mut() {
            let color = color.unwrap_or(Vec3::ZERO);
            colors[index * 3..index * 3 + 3].copy_from_slice(&color.to_array());
        }
    }

    pub(crate) fn set_len(&mut self, len: usize) {
        self.len = len;
    }

    /// Number of live particles
    pub fn len(&self) -> usize {
        self.len
    }

    /// xyz triples of the live particles
    pub fn positions(&self) -> &[f32] {
        &self.positions[..self.len * 3]
    }

    pub fn scales(&self) -> &[f32] {
        &self.scales[..self.len]
    }

    /// rgb triples of the live particles, if colour is tracked
    pub fn colors(&self) -> Option<&[f32]> {
        self.colors.as_deref().map(|c| &c[..self.len * 3])
    }

    pub fn get(&self, index: usize) -> Option<RenderPoint> {
        if index >= self.len {
            return None;
        }
        let p = &self.positions[index * 3..index * 3 + 3];
        let color = self
            .colors
            .as_ref()
            .map(|c| Vec3::from_slice(&c[index * 3..index * 3 + 3]));
        Some(RenderPoint {
            position: Vec3::from_slice(p),
            scale: self.scales[index],
            color,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = RenderPoint> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }
}
