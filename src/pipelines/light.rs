//! Per-frame lighting uniform shared by the mesh and sprite shaders.

use cgmath::SquareMatrix;

use crate::{
    config::FogConfig,
    data_structures::light::{LightKind, WorldLight},
};

pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
pub const MAX_POINT_LIGHTS: usize = 8;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightRaw {
    /// Direction towards the light; `w` is 1 for the shadow caster.
    pub direction: [f32; 4],
    /// Colour premultiplied by intensity.
    pub colour: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightRaw {
    /// World position; `w` is the cut-off distance, 0 for none.
    pub position: [f32; 4],
    /// Colour premultiplied by intensity; `w` is the decay exponent.
    pub colour: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    pub ambient: [f32; 4],
    pub fog_colour: [f32; 4],
    /// `(fog near, fog far, shadow bias, shadow enabled)`
    pub fog_shadow: [f32; 4],
    /// `(directional count, point count, 0, 0)`
    pub counts: [u32; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub directional: [DirectionalLightRaw; MAX_DIRECTIONAL_LIGHTS],
    pub point: [PointLightRaw; MAX_POINT_LIGHTS],
}

fn scaled(colour: [f32; 3], intensity: f32, w: f32) -> [f32; 4] {
    [
        colour[0] * intensity,
        colour[1] * intensity,
        colour[2] * intensity,
        w,
    ]
}

impl LightsUniform {
    /// Packs the visible lights. Spot lights are treated as point lights;
    /// lights beyond the per-kind limits are dropped.
    pub fn new(
        ambient: [f32; 4],
        ambient_intensity: f32,
        fog_colour: [f32; 4],
        fog: &FogConfig,
        lights: &[WorldLight],
    ) -> Self {
        let mut uniform: Self = bytemuck::Zeroable::zeroed();
        uniform.ambient = scaled([ambient[0], ambient[1], ambient[2]], ambient_intensity, 1.0);
        uniform.fog_colour = fog_colour;
        uniform.fog_shadow = [fog.near, fog.far, 0.0, 0.0];
        uniform.light_view_proj = cgmath::Matrix4::identity().into();

        let (mut directional, mut point) = (0usize, 0usize);
        for world in lights {
            let light = &world.light;
            match light.kind {
                LightKind::Directional => {
                    if directional == MAX_DIRECTIONAL_LIGHTS {
                        log::debug!("Directional light {} exceeds the limit", light.name);
                        continue;
                    }
                    let towards = -world.direction;
                    uniform.directional[directional] = DirectionalLightRaw {
                        direction: [towards.x, towards.y, towards.z, 0.0],
                        colour: scaled(light.colour, light.intensity, 0.0),
                    };
                    directional += 1;
                }
                LightKind::Point | LightKind::Spot => {
                    if point == MAX_POINT_LIGHTS {
                        log::debug!("Point light {} exceeds the limit", light.name);
                        continue;
                    }
                    let p = world.position;
                    uniform.point[point] = PointLightRaw {
                        position: [p.x, p.y, p.z, light.distance],
                        colour: scaled(light.colour, light.intensity, light.decay),
                    };
                    point += 1;
                }
            }
        }
        uniform.counts = [directional as u32, point as u32, 0, 0];
        uniform
    }

    /// Enables the shadow lookup for the directional light at `index`.
    pub fn set_shadow(&mut self, index: usize, light_view_proj: cgmath::Matrix4<f32>, bias: f32) {
        if let Some(light) = self.directional.get_mut(index) {
            light.direction[3] = 1.0;
        }
        self.light_view_proj = light_view_proj.into();
        self.fog_shadow[2] = bias;
        self.fog_shadow[3] = 1.0;
    }
}
