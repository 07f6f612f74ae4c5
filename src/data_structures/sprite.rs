//! Label billboards placed next to the boards of the asset.

/// A camera-facing quad showing one label canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    /// Index of the label it shows; also the index of its GPU texture.
    pub label: usize,
    pub position: cgmath::Vector3<f32>,
    pub scale: f32,
    pub visible: bool,
}

impl Sprite {
    pub fn new(label: usize, position: cgmath::Vector3<f32>, scale: f32) -> Self {
        Self {
            label,
            position,
            scale,
            visible: true,
        }
    }
}
