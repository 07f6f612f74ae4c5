//! Punctual lights attached to scene nodes.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
    Spot,
}

/// A light as imported from the asset, adjusted by the theme at runtime.
#[derive(Clone, Debug, PartialEq)]
pub struct Light {
    pub name: String,
    pub kind: LightKind,
    pub colour: [f32; 3],
    pub intensity: f32,
    /// Cut-off distance; `0.0` means unbounded.
    pub distance: f32,
    pub decay: f32,
    pub cast_shadow: bool,
    pub shadow_bias: f32,
}

impl Light {
    pub fn new(name: &str, kind: LightKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            colour: [1.0, 1.0, 1.0],
            intensity: 1.0,
            distance: 0.0,
            decay: 2.0,
            cast_shadow: false,
            shadow_bias: 0.0,
        }
    }
}

/// A light resolved to world space for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldLight {
    pub light: Light,
    pub position: cgmath::Vector3<f32>,
    /// Direction the light travels, normalised.
    pub direction: cgmath::Vector3<f32>,
}
